//! Error taxonomy of the editing engine.
//!
//! Only [`EditorError::UnknownType`], [`EditorError::UnknownBlock`] and
//! [`EditorError::UnknownPort`] reject an operation. Dangling references and
//! unresolved geometry are tolerated: reconciliation reports them and carries
//! on.

use thiserror::Error;

use crate::model::{BlockId, PortId};

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    /// No template exists for the requested block type.
    #[error("unknown block type: {type_name}")]
    UnknownType { type_name: String },

    /// The block is not (or no longer) part of the graph.
    #[error("unknown block: {block}")]
    UnknownBlock { block: BlockId },

    /// The port is not owned by any placed block.
    #[error("unknown port: {port}")]
    UnknownPort { port: PortId },

    /// A link endpoint refers to a port whose block was deleted.
    #[error("link endpoint {port} refers to a deleted block")]
    DanglingReference { port: PortId },

    /// The port's rendered position could not be queried this pass.
    #[error("no rendered geometry for port {port}")]
    UnresolvedGeometry { port: PortId },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}
