//! Pointer-drag events as delivered by the presentation layer.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::model::{BlockId, PortId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GesturePhase {
    Start,
    Move,
    End,
}

/// The UI element found under a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum HitTarget {
    Port(PortId),
    Block(BlockId),
    /// A drawer template, by type name.
    Template(String),
}

/// The element a gesture was started on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum GestureScope {
    Template(String),
    Block(BlockId),
    Port(PortId),
}

/// One drag event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gesture {
    pub phase: GesturePhase,
    pub pointer: Point,
    /// Element under the pointer at release. Only meaningful for
    /// [`GesturePhase::End`]; when absent the editor hit-tests `pointer`.
    #[serde(default)]
    pub element: Option<HitTarget>,
}

impl Gesture {
    pub fn start(pointer: Point) -> Self {
        Self {
            phase: GesturePhase::Start,
            pointer,
            element: None,
        }
    }

    pub fn moved(pointer: Point) -> Self {
        Self {
            phase: GesturePhase::Move,
            pointer,
            element: None,
        }
    }

    pub fn end(pointer: Point, element: Option<HitTarget>) -> Self {
        Self {
            phase: GesturePhase::End,
            pointer,
            element,
        }
    }
}
