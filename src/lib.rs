//! Interactive pipeline graph editor engine.
//!
//! Blocks are instantiated from an inexhaustible drawer of templates, wired
//! output-to-input by dragging from ports, moved and deleted. Block positions
//! are animated, so the [`reconcile`] loop keeps link geometry glued to ports
//! that move without any change to the graph itself.
//!
//! The binary `blockwire` replays JSON session scripts headlessly and prints
//! the resulting graph. An interactive canvas lives behind the `egui` feature.

pub mod animation;
pub mod catalog;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod graph;
pub mod ids;
pub mod layout;
pub mod link_drag;
pub mod model;
pub mod promotion;
pub mod reconcile;
pub mod script;

// Optional GUI/egui functionality lives behind the `egui` feature flag.
// Used by the demo in demos/egui_canvas.rs.
#[cfg(feature = "egui")]
pub mod egui_app;

pub use editor::Editor;
pub use error::{EditorError, EditorResult};
