//! Rendered geometry lookup.
//!
//! Where a port is on screen depends on the *rendered* (animated) position
//! of its block and on the block's box layout, neither of which the graph
//! stores. [`LayoutQuery`] is the capability the engine uses to ask for it.
//! [`LayoutSnapshot`] is a per-frame cache of measured rectangles and
//! [`BoxLayout`] measures blocks headlessly from animator output.

use indexmap::IndexMap;
use serde::Serialize;

use crate::animation::PositionAnimator;
use crate::config::LayoutMetrics;
use crate::geometry::{Point, Rect};
use crate::gesture::HitTarget;
use crate::graph::GraphStore;
use crate::model::{Block, BlockId, PortId, PortRole};

/// Measured box of one port row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortBox {
    pub rect: Rect,
    pub role: PortRole,
}

impl PortBox {
    /// Link attachment point: right edge for outputs, left edge for inputs,
    /// vertically centered.
    pub fn anchor(&self) -> Point {
        self.rect.side_anchor(self.role == PortRole::Output)
    }
}

/// Live layout lookup. Returns `None` for anything that is not mounted.
pub trait LayoutQuery {
    fn block_rect(&self, block: &BlockId) -> Option<Rect>;

    fn port_box(&self, port: &PortId) -> Option<PortBox>;

    /// Topmost element under `point`: ports before blocks, blocks before
    /// drawer templates.
    fn hit_test(&self, point: Point) -> Option<HitTarget>;

    fn port_anchor(&self, port: &PortId) -> Option<Point> {
        self.port_box(port).map(|b| b.anchor())
    }
}

/// Rectangles measured for one frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayoutSnapshot {
    blocks: IndexMap<BlockId, Rect>,
    ports: IndexMap<PortId, PortBox>,
    drawer: Vec<(String, Rect)>,
    /// Boxes of drawer template ports, for display only.
    drawer_ports: IndexMap<PortId, PortBox>,
}

impl LayoutSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_block(&mut self, block: BlockId, rect: Rect) {
        self.blocks.insert(block, rect);
    }

    pub fn insert_port(&mut self, port: PortId, port_box: PortBox) {
        self.ports.insert(port, port_box);
    }

    pub fn insert_template(&mut self, type_name: String, rect: Rect) {
        self.drawer.push((type_name, rect));
    }

    pub fn drawer(&self) -> &[(String, Rect)] {
        &self.drawer
    }

    pub fn template_port_box(&self, port: &PortId) -> Option<PortBox> {
        self.drawer_ports.get(port).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.ports.is_empty() && self.drawer.is_empty()
    }
}

impl LayoutQuery for LayoutSnapshot {
    fn block_rect(&self, block: &BlockId) -> Option<Rect> {
        self.blocks.get(block).copied()
    }

    fn port_box(&self, port: &PortId) -> Option<PortBox> {
        self.ports.get(port).copied()
    }

    fn hit_test(&self, point: Point) -> Option<HitTarget> {
        // Later entries are drawn on top.
        if let Some((id, _)) = self.ports.iter().rev().find(|(_, b)| b.rect.contains(point)) {
            return Some(HitTarget::Port(id.clone()));
        }
        if let Some((id, _)) = self.blocks.iter().rev().find(|(_, r)| r.contains(point)) {
            return Some(HitTarget::Block(id.clone()));
        }
        self.drawer
            .iter()
            .find(|(_, r)| r.contains(point))
            .map(|(t, _)| HitTarget::Template(t.clone()))
    }
}

/// Headless block measurement: a title bar followed by one row per input,
/// then one row per output, all `block_width` wide.
#[derive(Debug, Clone, Default)]
pub struct BoxLayout {
    metrics: LayoutMetrics,
}

impl BoxLayout {
    pub fn new(metrics: LayoutMetrics) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    pub fn block_size(&self, block: &Block) -> (f32, f32) {
        let rows = block.inputs.len() + block.outputs.len();
        (
            self.metrics.block_width,
            self.metrics.title_height + rows as f32 * self.metrics.row_height,
        )
    }

    /// Box of `block` with its top-left corner at `origin`, plus its port rows.
    pub fn measure(&self, block: &Block, origin: Point) -> (Rect, Vec<(PortId, PortBox)>) {
        let (w, h) = self.block_size(block);
        let m = &self.metrics;
        let ports = block
            .ports()
            .enumerate()
            .map(|(row, port)| {
                let rect = Rect::new(
                    origin.x,
                    origin.y + m.title_height + row as f32 * m.row_height,
                    w,
                    m.row_height,
                );
                (
                    port.id.clone(),
                    PortBox {
                        rect,
                        role: port.role,
                    },
                )
            })
            .collect();
        (Rect::new(origin.x, origin.y, w, h), ports)
    }

    /// Home rectangles of the drawer templates, stacked vertically.
    pub fn drawer_slots(&self, drawer: &[Block]) -> Vec<Rect> {
        let m = &self.metrics;
        let mut y = m.drawer_origin.y;
        drawer
            .iter()
            .map(|b| {
                let (w, h) = self.block_size(b);
                let r = Rect::new(m.drawer_origin.x, y, w, h);
                y += h + m.drawer_spacing;
                r
            })
            .collect()
    }

    /// Measure the drawer and every mounted instance. Instances are placed at
    /// their rendered position; a block the animator does not know is left
    /// out, so lookups for it report "not found".
    pub fn snapshot(&self, graph: &GraphStore, animator: &dyn PositionAnimator) -> LayoutSnapshot {
        let mut snap = LayoutSnapshot::new();
        for (block, slot) in graph.drawer().iter().zip(self.drawer_slots(graph.drawer())) {
            let (_, ports) = self.measure(block, slot.min());
            snap.drawer_ports.extend(ports);
            snap.insert_template(block.type_name.clone(), slot);
        }
        for block in graph.blocks() {
            let Some(id) = &block.id else { continue };
            let Some(origin) = animator.rendered(id) else {
                continue;
            };
            let (rect, ports) = self.measure(block, origin);
            snap.insert_block(id.clone(), rect);
            snap.ports.extend(ports);
        }
        snap
    }
}
