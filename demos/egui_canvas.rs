//! Edit a block pipeline interactively using egui (requires `--features egui`).
//!
//! Usage:
//!   cargo run --features egui --example egui_canvas -- [--catalog blocks.json] [--config editor.json]

#[cfg(feature = "egui")]
use anyhow::Result;
#[cfg(feature = "egui")]
use camino::Utf8PathBuf;
#[cfg(feature = "egui")]
use clap::Parser;
#[cfg(feature = "egui")]
use eframe::egui;
#[cfg(feature = "egui")]
use blockwire::{Editor, catalog::Catalog, config::EditorConfig, egui_app::CanvasApp};

#[cfg(feature = "egui")]
#[derive(Parser, Debug)]
#[command(author, version, about = "Edit a block pipeline using egui", long_about = None)]
struct Args {
    /// Catalog JSON file replacing the builtin block types
    #[arg(long)]
    catalog: Option<String>,

    /// Editor configuration JSON
    #[arg(long)]
    config: Option<String>,
}

#[cfg(feature = "egui")]
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let catalog = match &args.catalog {
        Some(p) => Catalog::from_json_file(&Utf8PathBuf::from(p))?,
        None => Catalog::builtin(),
    };
    let config = match &args.config {
        Some(p) => EditorConfig::from_json_file(&Utf8PathBuf::from(p))?,
        None => EditorConfig::default(),
    };

    println!("Drag a block out of the drawer, then drag from an output port to an input port.");

    let app = CanvasApp::new(Editor::new(config, catalog));
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "blockwire canvas",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::light());
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(())
}

#[cfg(not(feature = "egui"))]
fn main() {
    eprintln!("This example requires the 'egui' feature. Try: cargo run --features egui --example egui_canvas");
}
