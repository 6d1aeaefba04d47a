//! Headless editing sessions.
//!
//! A [`Script`] is a JSON array of steps, each tagged by `op`:
//!
//! ```json
//! [
//!   {"op": "place", "type": "Camera Input", "at": {"x": 100, "y": 100}},
//!   {"op": "gesture", "scope": {"kind": "port", "id": "b1:out0"},
//!    "phase": "start", "pointer": {"x": 260, "y": 139}},
//!   {"op": "settle"}
//! ]
//! ```
//!
//! [`replay`] feeds the steps to an [`Editor`] and captures the result as a
//! [`SessionReport`]. The report is a presentation dump; it cannot be loaded
//! back.

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::animation::PositionAnimator;
use crate::editor::{Editor, RenderedLink};
use crate::geometry::Point;
use crate::gesture::{Gesture, GesturePhase, GestureScope, HitTarget};
use crate::model::{Block, BlockId, PortId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    /// A raw gesture event on a template, block or port.
    Gesture {
        scope: GestureScope,
        phase: GesturePhase,
        pointer: Point,
        #[serde(default)]
        element: Option<HitTarget>,
    },
    /// Drag a template out of the drawer and drop it at `at`.
    Place {
        #[serde(rename = "type")]
        type_name: String,
        at: Point,
    },
    /// Set a placed block's target position.
    Move { block: BlockId, to: Point },
    Delete { block: BlockId },
    /// Advance animation by one frame of `seconds`.
    Tick { seconds: f32 },
    /// Run frames until every block is at rest.
    Settle,
    Reconcile,
    /// Remove dangling links.
    Prune,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    pub steps: Vec<ScriptStep>,
}

impl Script {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let script: Script = serde_json::from_str(json).context("Failed to parse session script")?;
        for (step, op) in script.steps.iter().enumerate() {
            if let ScriptStep::Tick { seconds } = op {
                if !seconds.is_finite() || *seconds < 0.0 {
                    bail!("step {}: tick duration {} is not a finite, non-negative number", step, seconds);
                }
            }
        }
        Ok(script)
    }

    pub fn from_json_file(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Open {}", path))?;
        Self::from_json_str(&text).with_context(|| format!("Failed to load {}", path))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Report
// ────────────────────────────────────────────────────────────────────────────

/// A placed block together with where it is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedBlock {
    #[serde(flatten)]
    pub block: Block,
    pub rendered: Option<Point>,
}

/// A step that was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepError {
    /// Zero-based index into the script.
    pub step: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub drawer: Vec<Block>,
    pub blocks: Vec<PlacedBlock>,
    pub links: Vec<RenderedLink>,
    /// Source ports of links that reference a deleted block.
    pub dangling: Vec<PortId>,
    pub errors: Vec<StepError>,
}

impl SessionReport {
    /// Snapshot what `editor` would currently draw.
    pub fn capture<A: PositionAnimator>(editor: &Editor<A>) -> Self {
        let blocks = editor
            .placed()
            .map(|b| PlacedBlock {
                rendered: b.id.as_ref().and_then(|id| editor.rendered_position(id)),
                block: b.clone(),
            })
            .collect();
        Self {
            drawer: editor.drawer().to_vec(),
            blocks,
            links: editor.link_geometry(),
            dangling: editor.dangling_links().map(|l| l.source.clone()).collect(),
            errors: Vec::new(),
        }
    }
}

/// Apply every step of `script` to `editor`. Rejected steps are recorded and
/// the replay continues.
pub fn replay<A: PositionAnimator>(editor: &mut Editor<A>, script: &Script) -> SessionReport {
    let mut errors = Vec::new();
    for (step, op) in script.steps.iter().enumerate() {
        log::debug!("step {}: {:?}", step, op);
        let result = match op {
            ScriptStep::Gesture {
                scope,
                phase,
                pointer,
                element,
            } => editor.dispatch(
                scope.clone(),
                Gesture {
                    phase: *phase,
                    pointer: *pointer,
                    element: element.clone(),
                },
            ),
            ScriptStep::Place { type_name, at } => editor.on_move_start(type_name, *at).map(|_| {
                editor.on_move_end();
            }),
            ScriptStep::Move { block, to } => {
                editor.on_block_move(block, *to);
                Ok(())
            }
            ScriptStep::Delete { block } => {
                editor.on_delete(block);
                Ok(())
            }
            ScriptStep::Tick { seconds } => {
                editor.tick(*seconds);
                Ok(())
            }
            ScriptStep::Settle => {
                editor.settle();
                Ok(())
            }
            ScriptStep::Reconcile => {
                editor.reconcile();
                Ok(())
            }
            ScriptStep::Prune => {
                editor.prune_dangling_links();
                Ok(())
            }
        };
        if let Err(e) = result {
            log::warn!("step {} rejected: {}", step, e);
            errors.push(StepError {
                step,
                message: e.to_string(),
            });
        }
    }
    let mut report = SessionReport::capture(editor);
    report.errors = errors;
    report
}
