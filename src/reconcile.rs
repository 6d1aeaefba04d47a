//! Link geometry reconciliation.
//!
//! Block animation moves ports on screen without touching the graph, so no
//! graph change notification fires while a block glides to its target. The
//! [`Reconciler`] closes that gap: each pass re-resolves every link endpoint
//! from the live layout and diffs the result against the geometry handed to
//! the presentation last time. A pass is idempotent and cheap enough to run
//! on every animation frame, every settle notification and after every graph
//! mutation.

use indexmap::IndexMap;

use crate::error::EditorError;
use crate::graph::GraphStore;
use crate::layout::LayoutQuery;
use crate::model::{LinkGeometry, LinkTarget, PortId};

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// The rendered link set differs from the previous pass.
    pub changed: bool,
    /// Links whose stored geometry was updated.
    pub updated: usize,
    /// Tolerated problems, one per unresolved endpoint.
    pub skipped: Vec<EditorError>,
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    epsilon: f32,
    /// Geometry handed to the presentation by the last pass, keyed by source.
    rendered: IndexMap<PortId, LinkGeometry>,
}

impl Reconciler {
    pub fn new(epsilon: f32) -> Self {
        Self {
            epsilon,
            rendered: IndexMap::new(),
        }
    }

    /// Link geometry to draw, in link order. Links whose source block is gone
    /// are absent.
    pub fn rendered(&self) -> impl Iterator<Item = (&PortId, &LinkGeometry)> {
        self.rendered.iter()
    }

    pub fn geometry(&self, source: &PortId) -> Option<&LinkGeometry> {
        self.rendered.get(source)
    }

    /// Run one pass against `layout`, writing resolved endpoints back into
    /// `graph`. Never fails; unresolvable endpoints keep their last geometry.
    pub fn run(&mut self, graph: &mut GraphStore, layout: &dyn LayoutQuery) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut next: IndexMap<PortId, LinkGeometry> = IndexMap::with_capacity(graph.link_count());
        let mut updates = Vec::new();

        for link in graph.links() {
            if graph.port_owner(&link.source).is_none() {
                // Source block deleted: no geometry until the link is removed.
                report.skipped.push(EditorError::DanglingReference {
                    port: link.source.clone(),
                });
                continue;
            }
            let mut geometry = link.geometry;
            let start = layout.port_anchor(&link.source);
            match &link.target {
                LinkTarget::Port(target) => {
                    let end = if graph.port_owner(target).is_none() {
                        report.skipped.push(EditorError::DanglingReference {
                            port: target.clone(),
                        });
                        None
                    } else {
                        layout.port_anchor(target)
                    };
                    match (start, end) {
                        (Some(start), Some(end)) => geometry = LinkGeometry { start, end },
                        (s, e) => {
                            if s.is_none() {
                                report.skipped.push(EditorError::UnresolvedGeometry {
                                    port: link.source.clone(),
                                });
                            }
                            if e.is_none() && graph.port_owner(target).is_some() {
                                report.skipped.push(EditorError::UnresolvedGeometry {
                                    port: target.clone(),
                                });
                            }
                        }
                    }
                }
                LinkTarget::Pending => {
                    // The end follows the pointer and is set by the drag.
                    match start {
                        Some(start) => geometry.start = start,
                        None => report.skipped.push(EditorError::UnresolvedGeometry {
                            port: link.source.clone(),
                        }),
                    }
                }
            }
            if geometry != link.geometry {
                updates.push((link.source.clone(), geometry));
            }
            next.insert(link.source.clone(), geometry);
        }

        report.updated = updates.len();
        for (source, geometry) in updates {
            graph.set_link_geometry(&source, geometry);
        }

        report.changed = self.differs(&next);
        self.rendered = next;

        for problem in &report.skipped {
            log::debug!("reconcile: {}", problem);
        }
        log::trace!(
            "reconcile pass: {} link(s), {} updated, changed={}",
            self.rendered.len(),
            report.updated,
            report.changed
        );
        report
    }

    fn differs(&self, next: &IndexMap<PortId, LinkGeometry>) -> bool {
        next.len() != self.rendered.len()
            || next
                .iter()
                .zip(self.rendered.iter())
                .any(|((ka, a), (kb, b))| ka != kb || !a.approx_eq(b, self.epsilon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::geometry::{Point, Rect};
    use crate::ids::SequentialIds;
    use crate::layout::{LayoutSnapshot, PortBox};
    use crate::model::{BlockId, Link, PortRole};

    fn port_box(x: f32, y: f32, role: PortRole) -> PortBox {
        PortBox {
            rect: Rect::new(x, y, 100.0, 20.0),
            role,
        }
    }

    /// Camera (b1) linked to Display (b2), with a layout placing both.
    fn linked() -> (GraphStore, LayoutSnapshot, PortId, PortId) {
        let mut g = GraphStore::new(Catalog::builtin(), Box::new(SequentialIds::default()));
        let cam = g.place_instance("Camera Input", Point::default()).unwrap();
        let disp = g.place_instance("Display Frame", Point::default()).unwrap();
        let src = g.block(&cam).unwrap().outputs[0].id.clone();
        let dst = g.block(&disp).unwrap().inputs[0].id.clone();
        g.upsert_link(Link::pending(src.clone(), Point::default()));
        g.complete_link(&src, dst.clone());
        let mut layout = LayoutSnapshot::new();
        layout.insert_port(src.clone(), port_box(0.0, 0.0, PortRole::Output));
        layout.insert_port(dst.clone(), port_box(300.0, 100.0, PortRole::Input));
        (g, layout, src, dst)
    }

    #[test]
    fn test_resolves_completed_link() {
        let (mut g, layout, src, _) = linked();
        let mut r = Reconciler::new(1e-3);
        let report = r.run(&mut g, &layout);
        assert!(report.changed);
        assert_eq!(report.updated, 1);
        let expected = LinkGeometry {
            start: Point::new(100.0, 10.0),
            end: Point::new(300.0, 110.0),
        };
        assert_eq!(g.link(&src).unwrap().geometry, expected);
        assert_eq!(r.geometry(&src), Some(&expected));
    }

    #[test]
    fn test_second_pass_is_idempotent() {
        let (mut g, layout, src, _) = linked();
        let mut r = Reconciler::new(1e-3);
        r.run(&mut g, &layout);
        let first = g.link(&src).unwrap().clone();
        let report = r.run(&mut g, &layout);
        assert!(!report.changed);
        assert_eq!(report.updated, 0);
        assert_eq!(g.link(&src).unwrap(), &first);
    }

    #[test]
    fn test_sub_epsilon_motion_is_not_a_change() {
        let (mut g, mut layout, src, _) = linked();
        let mut r = Reconciler::new(1e-2);
        r.run(&mut g, &layout);
        layout.insert_port(src.clone(), port_box(0.001, 0.0, PortRole::Output));
        assert!(!r.run(&mut g, &layout).changed);
        layout.insert_port(src.clone(), port_box(5.0, 0.0, PortRole::Output));
        assert!(r.run(&mut g, &layout).changed);
    }

    #[test]
    fn test_unresolved_endpoint_keeps_previous_geometry() {
        let (mut g, layout, src, dst) = linked();
        let mut r = Reconciler::new(1e-3);
        r.run(&mut g, &layout);
        let before = g.link(&src).unwrap().geometry;

        let mut partial = LayoutSnapshot::new();
        partial.insert_port(src.clone(), port_box(50.0, 50.0, PortRole::Output));
        let report = r.run(&mut g, &partial);
        assert_eq!(g.link(&src).unwrap().geometry, before);
        assert_eq!(
            report.skipped,
            vec![EditorError::UnresolvedGeometry { port: dst }]
        );
        assert!(!report.changed);
    }

    #[test]
    fn test_deleted_source_block_drops_geometry() {
        let (mut g, layout, src, _) = linked();
        let mut r = Reconciler::new(1e-3);
        r.run(&mut g, &layout);
        g.delete_block(&BlockId::new("b1"));
        let report = r.run(&mut g, &layout);
        assert!(report.changed);
        assert_eq!(
            report.skipped,
            vec![EditorError::DanglingReference { port: src.clone() }]
        );
        assert!(r.geometry(&src).is_none());
        assert!(!r.run(&mut g, &layout).changed);
    }

    #[test]
    fn test_deleted_target_block_freezes_geometry() {
        let (mut g, layout, src, dst) = linked();
        let mut r = Reconciler::new(1e-3);
        r.run(&mut g, &layout);
        let before = g.link(&src).unwrap().geometry;
        g.delete_block(&BlockId::new("b2"));
        let report = r.run(&mut g, &layout);
        assert_eq!(report.skipped, vec![EditorError::DanglingReference { port: dst }]);
        assert_eq!(r.geometry(&src), Some(&before));
    }

    #[test]
    fn test_pending_link_start_follows_port_end_stays() {
        let mut g = GraphStore::new(Catalog::builtin(), Box::new(SequentialIds::default()));
        let cam = g.place_instance("Camera Input", Point::default()).unwrap();
        let src = g.block(&cam).unwrap().outputs[0].id.clone();
        g.upsert_link(Link::pending(src.clone(), Point::new(100.0, 10.0)));
        g.set_link_end(&src, Point::new(400.0, 400.0));

        let mut layout = LayoutSnapshot::new();
        layout.insert_port(src.clone(), port_box(20.0, 0.0, PortRole::Output));
        let mut r = Reconciler::new(1e-3);
        r.run(&mut g, &layout);
        let geom = g.link(&src).unwrap().geometry;
        assert_eq!(geom.start, Point::new(120.0, 10.0));
        assert_eq!(geom.end, Point::new(400.0, 400.0));
    }
}
