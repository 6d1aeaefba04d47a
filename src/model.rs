use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::Point;

// ────────────────────────────────────────────────────────────────────────────
// Identifiers
// ────────────────────────────────────────────────────────────────────────────

/// Identifier of a placed block instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a port, unique across the whole graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(String);

impl PortId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of an instance port: the owning block id namespaces the template key,
    /// so two instances of the same type never share a port id.
    pub fn instance(block: &BlockId, key: &str) -> Self {
        Self(format!("{}:{}", block, key))
    }

    /// Id of a drawer template port.
    pub fn template(type_name: &str, key: &str) -> Self {
        Self(format!("template:{}#{}", type_name, key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Port
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortRole {
    Input,
    Output,
}

/// A connection point on a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: PortId,
    pub role: PortRole,
    pub label: String,
    /// Back-reference to the owning block; `None` on drawer templates.
    pub owner: Option<BlockId>,
}

// ────────────────────────────────────────────────────────────────────────────
// Block
// ────────────────────────────────────────────────────────────────────────────

/// A drawer template or a placed block instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Absent while the block is a drawer template.
    pub id: Option<BlockId>,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Absent means "not placed yet, use the rendered position".
    pub position: Option<Point>,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
    pub is_template: bool,
}

impl Block {
    /// All ports in display order: inputs first, then outputs.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    pub fn port(&self, id: &PortId) -> Option<&Port> {
        self.ports().find(|p| &p.id == id)
    }

    pub fn has_port(&self, id: &PortId) -> bool {
        self.port(id).is_some()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Link
// ────────────────────────────────────────────────────────────────────────────

/// Where a link ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "port", rename_all = "lowercase")]
pub enum LinkTarget {
    /// The drag that created the link has not been released on an input port.
    Pending,
    Port(PortId),
}

impl LinkTarget {
    pub fn is_pending(&self) -> bool {
        matches!(self, LinkTarget::Pending)
    }

    pub fn port(&self) -> Option<&PortId> {
        match self {
            LinkTarget::Pending => None,
            LinkTarget::Port(p) => Some(p),
        }
    }
}

/// Resolved screen-space endpoints of a link. Derived state, recomputed by
/// every reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkGeometry {
    pub start: Point,
    pub end: Point,
}

impl LinkGeometry {
    pub fn at(p: Point) -> Self {
        Self { start: p, end: p }
    }

    pub fn approx_eq(&self, other: &LinkGeometry, eps: f32) -> bool {
        self.start.approx_eq(other.start, eps) && self.end.approx_eq(other.end, eps)
    }
}

/// A directed connection from an output port, keyed by its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: PortId,
    pub target: LinkTarget,
    pub geometry: LinkGeometry,
}

impl Link {
    pub fn pending(source: PortId, at: Point) -> Self {
        Self {
            source,
            target: LinkTarget::Pending,
            geometry: LinkGeometry::at(at),
        }
    }

    pub fn is_completed(&self) -> bool {
        !self.target.is_pending()
    }

    /// True when either endpoint is one of `ports`.
    pub fn touches<'a>(&self, mut ports: impl Iterator<Item = &'a PortId>) -> bool {
        ports.any(|p| &self.source == p || self.target.port() == Some(p))
    }
}
