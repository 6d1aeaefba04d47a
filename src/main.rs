use anyhow::{Context, Result};
use blockwire::catalog::Catalog;
use blockwire::config::EditorConfig;
use blockwire::editor::Editor;
use blockwire::ids::{IdSource, SequentialIds, UuidIds};
use blockwire::script::{self, Script};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless driver for the blockwire graph editor", long_about = None)]
struct Cli {
    /// Log editor activity at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the block catalog as JSON
    Catalog {
        /// Catalog JSON file replacing the builtin block types
        #[arg(long, value_name = "CATALOG_JSON")]
        catalog: Option<String>,
    },
    /// Replay a session script and print the resulting graph as JSON
    Replay {
        /// JSON array of session steps
        #[arg(value_name = "SCRIPT")]
        script: String,

        /// Editor configuration JSON
        #[arg(long, value_name = "CONFIG_JSON")]
        config: Option<String>,

        /// Catalog JSON file replacing the builtin block types
        #[arg(long, value_name = "CATALOG_JSON")]
        catalog: Option<String>,

        /// Use random UUID block ids instead of b1, b2, ...
        #[arg(long)]
        uuid_ids: bool,
    },
}

fn load_catalog(path: Option<&str>) -> Result<Catalog> {
    match path {
        Some(p) => Catalog::from_json_file(&Utf8PathBuf::from(p)),
        None => Ok(Catalog::builtin()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let json = match cli.command {
        Command::Catalog { catalog } => {
            let catalog = load_catalog(catalog.as_deref())?;
            serde_json::to_string_pretty(&catalog)?
        }
        Command::Replay {
            script,
            config,
            catalog,
            uuid_ids,
        } => {
            let config = match config {
                Some(p) => EditorConfig::from_json_file(&Utf8PathBuf::from(p))?,
                None => EditorConfig::default(),
            };
            let catalog = load_catalog(catalog.as_deref())?;
            let script_path = Utf8PathBuf::from(&script);
            let steps = Script::from_json_file(&script_path)?;
            let ids: Box<dyn IdSource> = if uuid_ids {
                Box::new(UuidIds)
            } else {
                Box::new(SequentialIds::default())
            };
            let mut editor = Editor::with_ids(config, catalog, ids);
            let report = script::replay(&mut editor, &steps);
            serde_json::to_string_pretty(&report)
                .with_context(|| format!("Failed to serialize report for {}", script_path))?
        }
    };
    println!("{}", json);
    Ok(())
}
