//! Drag-to-connect state machine.
//!
//! A drag that starts on an output port creates a pending link keyed by that
//! port. Moves drag the link's free end; releasing over an input port
//! completes the link, releasing anywhere else abandons it according to the
//! configured [`AbandonedDragPolicy`].
//!
//! No compatibility checks are made: any output may be linked to any input.

use crate::config::AbandonedDragPolicy;
use crate::error::{EditorError, EditorResult};
use crate::geometry::Point;
use crate::gesture::HitTarget;
use crate::graph::GraphStore;
use crate::layout::LayoutQuery;
use crate::model::{Link, PortId, PortRole};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LinkDragState {
    #[default]
    Idle,
    Dragging {
        source: PortId,
        current: Point,
    },
}

/// How a link drag ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// The link now ends at this input port.
    Completed(PortId),
    /// Released elsewhere; the link stays pending with frozen endpoints.
    KeptPending,
    /// Released elsewhere; the link was removed.
    Discarded,
    /// The event did not belong to the active drag.
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct LinkDrag {
    state: LinkDragState,
    policy: AbandonedDragPolicy,
}

impl LinkDrag {
    pub fn new(policy: AbandonedDragPolicy) -> Self {
        Self {
            state: LinkDragState::Idle,
            policy,
        }
    }

    pub fn state(&self) -> &LinkDragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, LinkDragState::Dragging { .. })
    }

    /// Port the active drag started from.
    pub fn source(&self) -> Option<&PortId> {
        match &self.state {
            LinkDragState::Dragging { source, .. } => Some(source),
            LinkDragState::Idle => None,
        }
    }

    /// Begin a drag on `source`.
    ///
    /// Any existing link from `source`, pending or completed, is replaced.
    /// A drag still active on another port is abandoned first. Both endpoints
    /// start at the port's rendered anchor. Returns `Ok(false)` for input
    /// ports, which do not start links.
    pub fn start(
        &mut self,
        graph: &mut GraphStore,
        source: &PortId,
        layout: &dyn LayoutQuery,
    ) -> EditorResult<bool> {
        let Some((block, port)) = graph.find_port(source) else {
            log::warn!("link drag started on unknown port {}", source);
            return Err(EditorError::UnknownPort {
                port: source.clone(),
            });
        };
        if port.role != PortRole::Output {
            log::debug!("ignoring link drag from input port {}", source);
            return Ok(false);
        }
        let at = match layout.port_anchor(source) {
            Some(p) => p,
            None => {
                log::debug!("{}", EditorError::UnresolvedGeometry { port: source.clone() });
                block.position.unwrap_or_default()
            }
        };
        if let Some(previous) = self.source().filter(|p| *p != source).cloned() {
            self.abandon(graph, &previous);
        }
        graph.upsert_link(Link::pending(source.clone(), at));
        self.state = LinkDragState::Dragging {
            source: source.clone(),
            current: at,
        };
        Ok(true)
    }

    /// Move the free end of the active link to `pointer`.
    ///
    /// The start point is left to the reconciliation pass so it stays on the
    /// port while the source block animates.
    pub fn drag(&mut self, graph: &mut GraphStore, source: &PortId, pointer: Point) -> bool {
        match &mut self.state {
            LinkDragState::Dragging {
                source: active,
                current,
            } if active == source => {
                *current = pointer;
                graph.set_link_end(source, pointer);
                true
            }
            _ => false,
        }
    }

    /// Finish the active drag; `element` is what lies under the release point.
    pub fn end(
        &mut self,
        graph: &mut GraphStore,
        source: &PortId,
        element: Option<&HitTarget>,
    ) -> DragOutcome {
        if self.source() != Some(source) {
            return DragOutcome::Ignored;
        }
        self.state = LinkDragState::Idle;

        let target = match element {
            Some(HitTarget::Port(p)) => graph
                .find_port(p)
                .filter(|(_, port)| port.role == PortRole::Input)
                .map(|(_, port)| port.id.clone()),
            _ => None,
        };
        if let Some(target) = target {
            graph.complete_link(source, target.clone());
            return DragOutcome::Completed(target);
        }

        self.abandon(graph, source)
    }

    fn abandon(&self, graph: &mut GraphStore, source: &PortId) -> DragOutcome {
        match self.policy {
            AbandonedDragPolicy::KeepPending => {
                log::debug!("link drag from {} abandoned, kept pending", source);
                DragOutcome::KeptPending
            }
            AbandonedDragPolicy::Discard => {
                graph.remove_link(source);
                log::debug!("link drag from {} abandoned, discarded", source);
                DragOutcome::Discarded
            }
        }
    }

    /// Drop the active drag without touching the graph.
    pub fn abort(&mut self) {
        self.state = LinkDragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::geometry::Rect;
    use crate::ids::SequentialIds;
    use crate::layout::{LayoutSnapshot, PortBox};
    use crate::model::{BlockId, LinkTarget};

    struct Fixture {
        graph: GraphStore,
        layout: LayoutSnapshot,
        out: PortId,
        inp: PortId,
    }

    fn fixture() -> Fixture {
        let mut graph = GraphStore::new(Catalog::builtin(), Box::new(SequentialIds::default()));
        graph.place_instance("Camera Input", Point::new(0.0, 0.0)).unwrap();
        graph.place_instance("Display Frame", Point::new(300.0, 0.0)).unwrap();
        let out = PortId::new("b1:out0");
        let inp = PortId::new("b2:in0");
        let mut layout = LayoutSnapshot::new();
        layout.insert_port(
            out.clone(),
            PortBox {
                rect: Rect::new(0.0, 28.0, 160.0, 22.0),
                role: PortRole::Output,
            },
        );
        layout.insert_port(
            inp.clone(),
            PortBox {
                rect: Rect::new(300.0, 28.0, 160.0, 22.0),
                role: PortRole::Input,
            },
        );
        Fixture {
            graph,
            layout,
            out,
            inp,
        }
    }

    #[test]
    fn test_start_creates_pending_link_at_anchor() {
        let mut f = fixture();
        let mut drag = LinkDrag::default();
        assert!(drag.start(&mut f.graph, &f.out, &f.layout).unwrap());
        let link = f.graph.link(&f.out).unwrap();
        assert_eq!(link.target, LinkTarget::Pending);
        assert_eq!(link.geometry.start, Point::new(160.0, 39.0));
        assert_eq!(link.geometry.end, Point::new(160.0, 39.0));
        assert!(drag.is_dragging());
    }

    #[test]
    fn test_input_port_does_not_start() {
        let mut f = fixture();
        let mut drag = LinkDrag::default();
        assert!(!drag.start(&mut f.graph, &f.inp, &f.layout).unwrap());
        assert_eq!(f.graph.link_count(), 0);
        assert_eq!(drag.state(), &LinkDragState::Idle);
    }

    #[test]
    fn test_unknown_port_is_rejected() {
        let mut f = fixture();
        let mut drag = LinkDrag::default();
        let err = drag
            .start(&mut f.graph, &PortId::new("zz:out0"), &f.layout)
            .unwrap_err();
        assert!(matches!(err, EditorError::UnknownPort { .. }));
    }

    #[test]
    fn test_drag_and_complete() {
        let mut f = fixture();
        let mut drag = LinkDrag::default();
        drag.start(&mut f.graph, &f.out, &f.layout).unwrap();
        assert!(drag.drag(&mut f.graph, &f.out, Point::new(250.0, 40.0)));
        assert_eq!(f.graph.link(&f.out).unwrap().geometry.end, Point::new(250.0, 40.0));

        let outcome = drag.end(&mut f.graph, &f.out, Some(&HitTarget::Port(f.inp.clone())));
        assert_eq!(outcome, DragOutcome::Completed(f.inp.clone()));
        assert_eq!(f.graph.link(&f.out).unwrap().target, LinkTarget::Port(f.inp.clone()));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_events_for_other_ports_are_ignored() {
        let mut f = fixture();
        let mut drag = LinkDrag::default();
        let other = PortId::new("b9:out0");
        assert!(!drag.drag(&mut f.graph, &other, Point::default()));
        assert_eq!(drag.end(&mut f.graph, &other, None), DragOutcome::Ignored);
    }

    #[test]
    fn test_abandon_keeps_pending_by_default() {
        let mut f = fixture();
        let mut drag = LinkDrag::default();
        drag.start(&mut f.graph, &f.out, &f.layout).unwrap();
        drag.drag(&mut f.graph, &f.out, Point::new(500.0, 500.0));
        let outcome = drag.end(&mut f.graph, &f.out, Some(&HitTarget::Block(BlockId::new("b2"))));
        assert_eq!(outcome, DragOutcome::KeptPending);
        let link = f.graph.link(&f.out).unwrap();
        assert!(link.target.is_pending());
        assert_eq!(link.geometry.end, Point::new(500.0, 500.0));
    }

    #[test]
    fn test_abandon_discard_policy() {
        let mut f = fixture();
        let mut drag = LinkDrag::new(AbandonedDragPolicy::Discard);
        drag.start(&mut f.graph, &f.out, &f.layout).unwrap();
        assert_eq!(drag.end(&mut f.graph, &f.out, None), DragOutcome::Discarded);
        assert_eq!(f.graph.link_count(), 0);
    }

    #[test]
    fn test_release_on_output_port_is_abandoned() {
        let mut f = fixture();
        let mut drag = LinkDrag::default();
        drag.start(&mut f.graph, &f.out, &f.layout).unwrap();
        let outcome = drag.end(&mut f.graph, &f.out, Some(&HitTarget::Port(f.out.clone())));
        assert_eq!(outcome, DragOutcome::KeptPending);
    }

    #[test]
    fn test_restart_replaces_completed_link() {
        let mut f = fixture();
        let mut drag = LinkDrag::default();
        drag.start(&mut f.graph, &f.out, &f.layout).unwrap();
        drag.end(&mut f.graph, &f.out, Some(&HitTarget::Port(f.inp.clone())));
        drag.start(&mut f.graph, &f.out, &f.layout).unwrap();
        assert_eq!(f.graph.link_count(), 1);
        assert!(f.graph.link(&f.out).unwrap().target.is_pending());
    }

    #[test]
    fn test_new_drag_abandons_unfinished_one() {
        let mut f = fixture();
        f.graph.place_instance("Camera Input", Point::new(0.0, 200.0)).unwrap();
        let other = PortId::new("b3:out0");

        let mut discard = LinkDrag::new(AbandonedDragPolicy::Discard);
        discard.start(&mut f.graph, &f.out, &f.layout).unwrap();
        assert!(discard.start(&mut f.graph, &other, &f.layout).unwrap());
        assert!(f.graph.link(&f.out).is_none());
        assert_eq!(discard.source(), Some(&other));
        assert_eq!(discard.end(&mut f.graph, &other, None), DragOutcome::Discarded);
        assert_eq!(f.graph.link_count(), 0);

        let mut keep = LinkDrag::default();
        keep.start(&mut f.graph, &f.out, &f.layout).unwrap();
        keep.start(&mut f.graph, &other, &f.layout).unwrap();
        assert!(f.graph.link(&f.out).unwrap().target.is_pending());
        assert_eq!(f.graph.link_count(), 2);
    }
}
