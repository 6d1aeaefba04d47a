//! The editing engine as seen by a presentation layer.
//!
//! [`Editor`] owns the graph and every piece of interaction state. A frontend
//! forwards pointer gestures through the `on_*` callbacks (or [`Editor::dispatch`]),
//! calls [`Editor::tick`] once per frame and draws [`Editor::drawer`],
//! [`Editor::placed`] and [`Editor::link_geometry`].

use serde::Serialize;

use crate::animation::{PositionAnimator, SpringAnimator};
use crate::catalog::Catalog;
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::geometry::Point;
use crate::gesture::{Gesture, GesturePhase, GestureScope, HitTarget};
use crate::graph::GraphStore;
use crate::ids::{IdSource, UuidIds};
use crate::layout::{BoxLayout, LayoutQuery, LayoutSnapshot};
use crate::link_drag::{DragOutcome, LinkDrag};
use crate::model::{Block, BlockId, Link, LinkGeometry, LinkTarget, PortId};
use crate::promotion::TemplatePromotion;
use crate::reconcile::{ReconcileReport, Reconciler};

/// Frame length used by [`Editor::settle`].
const SETTLE_FRAME: f32 = 1.0 / 60.0;
/// Upper bound on frames simulated by [`Editor::settle`].
const SETTLE_MAX_FRAMES: usize = 600;

/// One link as it should be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedLink {
    pub source: PortId,
    pub target: LinkTarget,
    pub geometry: LinkGeometry,
}

// ────────────────────────────────────────────────────────────────────────────
// Editor
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Editor<A: PositionAnimator = SpringAnimator> {
    config: EditorConfig,
    graph: GraphStore,
    animator: A,
    layout: BoxLayout,
    link_drag: LinkDrag,
    promotion: TemplatePromotion,
    reconciler: Reconciler,
    /// Placed block being dragged and the last pointer position seen for it.
    block_drag: Option<(BlockId, Point)>,
}

impl Editor<SpringAnimator> {
    /// Editor with random block ids and the spring animator.
    pub fn new(config: EditorConfig, catalog: Catalog) -> Self {
        Self::with_ids(config, catalog, Box::new(UuidIds))
    }

    pub fn with_ids(config: EditorConfig, catalog: Catalog, ids: Box<dyn IdSource>) -> Self {
        let animator = SpringAnimator::new(config.spring.clone());
        Self::with_animator(config, catalog, ids, animator)
    }
}

impl<A: PositionAnimator> Editor<A> {
    pub fn with_animator(
        config: EditorConfig,
        catalog: Catalog,
        ids: Box<dyn IdSource>,
        animator: A,
    ) -> Self {
        let graph = GraphStore::new(catalog, ids).with_dangling_policy(config.dangling_links);
        Self {
            layout: BoxLayout::new(config.layout.clone()),
            link_drag: LinkDrag::new(config.abandoned_drag),
            promotion: TemplatePromotion::new(),
            reconciler: Reconciler::new(config.geometry_epsilon),
            block_drag: None,
            graph,
            animator,
            config,
        }
    }

    // ── views ──────────────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn animator(&self) -> &A {
        &self.animator
    }

    pub fn link_drag(&self) -> &LinkDrag {
        &self.link_drag
    }

    pub fn promotion(&self) -> &TemplatePromotion {
        &self.promotion
    }

    /// Template blocks, one per catalog type.
    pub fn drawer(&self) -> &[Block] {
        self.graph.drawer()
    }

    /// Placed instances, in placement order.
    pub fn placed(&self) -> impl Iterator<Item = &Block> {
        self.graph.blocks()
    }

    /// Where `block` is on screen right now.
    pub fn rendered_position(&self, block: &BlockId) -> Option<Point> {
        self.animator.rendered(block)
    }

    /// Measure the drawer and every mounted block at its rendered position.
    pub fn layout_snapshot(&self) -> LayoutSnapshot {
        self.layout.snapshot(&self.graph, &self.animator)
    }

    pub fn box_layout(&self) -> &BoxLayout {
        &self.layout
    }

    /// Link geometry from the last reconciliation pass. Links without
    /// resolvable geometry are left out.
    pub fn link_geometry(&self) -> Vec<RenderedLink> {
        self.reconciler
            .rendered()
            .filter_map(|(source, geometry)| {
                let link = self.graph.link(source)?;
                Some(RenderedLink {
                    source: source.clone(),
                    target: link.target.clone(),
                    geometry: *geometry,
                })
            })
            .collect()
    }

    pub fn dangling_links(&self) -> impl Iterator<Item = &Link> {
        self.graph.dangling_links()
    }

    // ── template promotion ─────────────────────────────────────────────────

    /// A drag started on the drawer template of `type_name`.
    pub fn on_move_start(&mut self, type_name: &str, pointer: Point) -> EditorResult<BlockId> {
        let id = self.promotion.begin(&mut self.graph, type_name, pointer)?;
        self.animator.animate(&id, pointer);
        self.reconcile();
        Ok(id)
    }

    /// The template drag moved. Returns the instance that was moved.
    pub fn on_move(&mut self, pointer: Point) -> Option<BlockId> {
        let id = self.promotion.drag(&mut self.graph, pointer)?;
        self.animator.animate(&id, pointer);
        self.reconcile();
        Some(id)
    }

    pub fn on_move_end(&mut self) -> Option<BlockId> {
        self.promotion.end()
    }

    // ── placed blocks ──────────────────────────────────────────────────────

    /// Shift a placed block by a pointer delta. A block without a stored
    /// position starts from where it is rendered.
    pub fn on_block_drag(&mut self, block: &BlockId, dx: f32, dy: f32) -> bool {
        let Some(current) = self.graph.block(block) else {
            log::trace!("ignoring drag of missing block {}", block);
            return false;
        };
        let origin = current
            .position
            .or_else(|| self.animator.rendered(block))
            .unwrap_or_default();
        self.on_block_move(block, origin.offset(dx, dy))
    }

    /// Set a placed block's target position. Moves of missing blocks are
    /// ignored.
    pub fn on_block_move(&mut self, block: &BlockId, position: Point) -> bool {
        if !self.graph.move_block(block, position) {
            return false;
        }
        self.animator.animate(block, position);
        self.reconcile();
        true
    }

    /// Delete a placed block. Any drag involving it is dropped.
    pub fn on_delete(&mut self, block: &BlockId) -> bool {
        let Some(removed) = self.graph.delete_block(block) else {
            log::debug!("delete of missing block {} ignored", block);
            return false;
        };
        self.animator.remove(block);
        self.promotion.forget(block);
        if self.link_drag.source().is_some_and(|p| removed.has_port(p)) {
            self.link_drag.abort();
        }
        if self.block_drag.as_ref().is_some_and(|(id, _)| id == block) {
            self.block_drag = None;
        }
        self.reconcile();
        true
    }

    // ── link drag ──────────────────────────────────────────────────────────

    /// A drag started on `port`. Returns `Ok(false)` when the port does not
    /// start links (inputs).
    pub fn on_drag_io_start(&mut self, port: &PortId) -> EditorResult<bool> {
        let layout = self.layout_snapshot();
        self.on_drag_io_start_with(port, &layout)
    }

    /// Like [`Editor::on_drag_io_start`] with geometry measured by the frontend.
    pub fn on_drag_io_start_with(
        &mut self,
        port: &PortId,
        layout: &dyn LayoutQuery,
    ) -> EditorResult<bool> {
        let started = self.link_drag.start(&mut self.graph, port, layout)?;
        if started {
            self.reconcile_with(layout);
        }
        Ok(started)
    }

    pub fn on_drag_io_move(&mut self, port: &PortId, pointer: Point) -> bool {
        if !self.link_drag.drag(&mut self.graph, port, pointer) {
            return false;
        }
        self.reconcile();
        true
    }

    /// The link drag from `port` was released at `pointer`. `element` is what
    /// the frontend found under the pointer; when `None` the editor hit-tests
    /// its own layout.
    pub fn on_drag_io_end(
        &mut self,
        port: &PortId,
        pointer: Point,
        element: Option<HitTarget>,
    ) -> DragOutcome {
        // The free end rests where the pointer was released.
        self.link_drag.drag(&mut self.graph, port, pointer);
        let layout = self.layout_snapshot();
        let element = element.or_else(|| layout.hit_test(pointer));
        let outcome = self.link_drag.end(&mut self.graph, port, element.as_ref());
        if outcome != DragOutcome::Ignored {
            self.reconcile_with(&layout);
        }
        outcome
    }

    // ── gesture routing ────────────────────────────────────────────────────

    /// Route one gesture event to the callback for the element it started on.
    pub fn dispatch(&mut self, scope: GestureScope, gesture: Gesture) -> EditorResult<()> {
        let Gesture {
            phase,
            pointer,
            element,
        } = gesture;
        match (scope, phase) {
            (GestureScope::Template(type_name), GesturePhase::Start) => {
                self.on_move_start(&type_name, pointer)?;
            }
            (GestureScope::Template(_), GesturePhase::Move) => {
                self.on_move(pointer);
            }
            (GestureScope::Template(_), GesturePhase::End) => {
                self.on_move_end();
            }
            (GestureScope::Block(block), GesturePhase::Start) => {
                if self.graph.block(&block).is_none() {
                    log::warn!("gesture started on unknown block {}", block);
                    return Err(EditorError::UnknownBlock { block });
                }
                self.block_drag = Some((block, pointer));
            }
            (GestureScope::Block(block), phase) => {
                let last = match &self.block_drag {
                    Some((id, last)) if *id == block => *last,
                    _ => return Ok(()),
                };
                self.on_block_drag(&block, pointer.x - last.x, pointer.y - last.y);
                self.block_drag = match phase {
                    GesturePhase::End => None,
                    _ => Some((block, pointer)),
                };
            }
            (GestureScope::Port(port), GesturePhase::Start) => {
                self.on_drag_io_start(&port)?;
            }
            (GestureScope::Port(port), GesturePhase::Move) => {
                self.on_drag_io_move(&port, pointer);
            }
            (GestureScope::Port(port), GesturePhase::End) => {
                self.on_drag_io_end(&port, pointer, element);
            }
        }
        Ok(())
    }

    // ── frames ─────────────────────────────────────────────────────────────

    /// Advance animation by `dt` seconds and reconcile link geometry if any
    /// block moved or came to rest.
    pub fn tick(&mut self, dt: f32) -> ReconcileReport {
        let was_animating = self.animator.is_animating();
        let settled = self.animator.step(dt);
        for block in &settled {
            log::trace!("block {} settled", block);
        }
        if was_animating || !settled.is_empty() {
            self.reconcile()
        } else {
            ReconcileReport::default()
        }
    }

    /// Run frames until every block is at rest. Returns the combined report of
    /// all passes; `skipped` holds the problems of the final pass.
    pub fn settle(&mut self) -> ReconcileReport {
        let mut total = ReconcileReport::default();
        for _ in 0..SETTLE_MAX_FRAMES {
            if !self.animator.is_animating() {
                break;
            }
            let report = self.tick(SETTLE_FRAME);
            total.changed |= report.changed;
            total.updated += report.updated;
            total.skipped = report.skipped;
        }
        if self.animator.is_animating() {
            log::warn!(
                "animation still running after {} frames",
                SETTLE_MAX_FRAMES
            );
        }
        total
    }

    /// Recompute link geometry from the editor's own layout.
    pub fn reconcile(&mut self) -> ReconcileReport {
        let layout = self.layout_snapshot();
        self.reconciler.run(&mut self.graph, &layout)
    }

    /// Recompute link geometry from geometry measured by the frontend.
    pub fn reconcile_with(&mut self, layout: &dyn LayoutQuery) -> ReconcileReport {
        self.reconciler.run(&mut self.graph, layout)
    }

    /// Remove dangling links now, whatever the configured policy.
    pub fn prune_dangling_links(&mut self) -> usize {
        let removed = self.graph.prune_dangling_links();
        if removed > 0 {
            self.reconcile();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;

    fn editor() -> Editor {
        Editor::with_ids(
            EditorConfig::default(),
            Catalog::builtin(),
            Box::new(SequentialIds::default()),
        )
    }

    #[test]
    fn test_template_gesture_places_one_instance() {
        let mut ed = editor();
        let scope = GestureScope::Template("Draw Line".into());
        ed.dispatch(scope.clone(), Gesture::start(Point::new(200.0, 200.0)))
            .unwrap();
        ed.dispatch(scope.clone(), Gesture::moved(Point::new(220.0, 240.0)))
            .unwrap();
        ed.dispatch(scope, Gesture::end(Point::new(220.0, 240.0), None))
            .unwrap();

        let placed: Vec<_> = ed.placed().collect();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].position, Some(Point::new(220.0, 240.0)));
        assert!(ed.promotion().active().is_none());
        assert_eq!(ed.drawer().len(), Catalog::builtin().len());
    }

    #[test]
    fn test_new_instance_is_mounted_without_animation() {
        let mut ed = editor();
        let id = ed.on_move_start("RANSAC", Point::new(50.0, 60.0)).unwrap();
        assert_eq!(ed.rendered_position(&id), Some(Point::new(50.0, 60.0)));
        assert!(!ed.animator().is_animating());
    }

    #[test]
    fn test_block_gesture_applies_deltas() {
        let mut ed = editor();
        let id = ed.on_move_start("RANSAC", Point::new(50.0, 60.0)).unwrap();
        ed.on_move_end();
        let scope = GestureScope::Block(id.clone());
        ed.dispatch(scope.clone(), Gesture::start(Point::new(55.0, 65.0)))
            .unwrap();
        ed.dispatch(scope.clone(), Gesture::moved(Point::new(65.0, 65.0)))
            .unwrap();
        ed.dispatch(scope, Gesture::end(Point::new(75.0, 85.0), None))
            .unwrap();
        let block = ed.graph().block(&id).unwrap();
        assert_eq!(block.position, Some(Point::new(70.0, 80.0)));
    }

    #[test]
    fn test_gesture_on_unknown_block_is_rejected() {
        let mut ed = editor();
        let err = ed
            .dispatch(
                GestureScope::Block(BlockId::new("nope")),
                Gesture::start(Point::default()),
            )
            .unwrap_err();
        assert_eq!(err, EditorError::UnknownBlock { block: BlockId::new("nope") });
    }

    #[test]
    fn test_delete_aborts_link_drag_from_block() {
        let mut ed = editor();
        let cam = ed.on_move_start("Camera Input", Point::new(0.0, 0.0)).unwrap();
        ed.on_move_end();
        let out = PortId::instance(&cam, "out0");
        assert!(ed.on_drag_io_start(&out).unwrap());
        assert!(ed.link_drag().is_dragging());

        assert!(ed.on_delete(&cam));
        assert!(!ed.link_drag().is_dragging());
        assert!(!ed.on_drag_io_move(&out, Point::new(10.0, 10.0)));
        assert!(ed.rendered_position(&cam).is_none());
        assert!(ed.link_geometry().is_empty());
        assert_eq!(ed.dangling_links().count(), 1);
        assert_eq!(ed.prune_dangling_links(), 1);
    }

    #[test]
    fn test_moves_after_delete_are_ignored() {
        let mut ed = editor();
        let id = ed.on_move_start("Camera Input", Point::new(0.0, 0.0)).unwrap();
        ed.on_move_end();
        ed.on_delete(&id);
        assert!(!ed.on_block_move(&id, Point::new(10.0, 0.0)));
        assert!(!ed.on_block_drag(&id, 10.0, 0.0));
        assert!(ed.graph().block(&id).is_none());
        assert!(!ed.on_delete(&id));
    }

    #[test]
    fn test_tick_is_quiet_when_nothing_moves() {
        let mut ed = editor();
        ed.on_move_start("Camera Input", Point::new(0.0, 0.0)).unwrap();
        assert_eq!(ed.tick(SETTLE_FRAME), ReconcileReport::default());
    }

    #[test]
    fn test_huge_tick_settles_and_stays_idempotent() {
        let mut ed = editor();
        let cam = ed.on_move_start("Camera Input", Point::new(0.0, 0.0)).unwrap();
        ed.on_move_end();
        let disp = ed.on_move_start("Display Frame", Point::new(400.0, 0.0)).unwrap();
        ed.on_move_end();
        let out = PortId::instance(&cam, "out0");
        ed.on_drag_io_start(&out).unwrap();
        let inp = PortId::instance(&disp, "in0");
        ed.on_drag_io_end(&out, Point::new(400.0, 39.0), Some(HitTarget::Port(inp)));

        ed.on_block_move(&cam, Point::new(120.0, 0.0));
        ed.tick(1.0e9);
        assert!(!ed.animator().is_animating());
        assert_eq!(ed.rendered_position(&cam), Some(Point::new(120.0, 0.0)));
        let report = ed.reconcile();
        assert!(!report.changed);
        assert_eq!(ed.link_geometry()[0].geometry.start, Point::new(280.0, 39.0));
    }

    #[test]
    fn test_settle_brings_block_to_target() {
        let mut ed = editor();
        let id = ed.on_move_start("Camera Input", Point::new(0.0, 0.0)).unwrap();
        ed.on_move_end();
        ed.on_block_move(&id, Point::new(100.0, 40.0));
        assert!(ed.animator().is_animating());
        ed.settle();
        assert!(!ed.animator().is_animating());
        assert_eq!(ed.rendered_position(&id), Some(Point::new(100.0, 40.0)));
    }
}
