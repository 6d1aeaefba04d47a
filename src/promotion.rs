//! Turning drawer templates into placed blocks.
//!
//! Dragging a drawer template never moves the template. The first event of
//! the gesture places a fresh instance under the pointer and every further
//! move of that gesture is redirected to the instance. The drawer therefore
//! always keeps exactly one template per type.

use crate::error::EditorResult;
use crate::geometry::Point;
use crate::graph::GraphStore;
use crate::model::BlockId;

#[derive(Debug, Clone, Default)]
pub struct TemplatePromotion {
    /// Instance receiving the moves of the current template drag.
    dragging: Option<(String, BlockId)>,
}

impl TemplatePromotion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Type and instance of the template drag in progress.
    pub fn active(&self) -> Option<(&str, &BlockId)> {
        self.dragging.as_ref().map(|(t, id)| (t.as_str(), id))
    }

    /// Place an instance of `type_name` at `pointer` and redirect the rest
    /// of the gesture to it.
    pub fn begin(
        &mut self,
        graph: &mut GraphStore,
        type_name: &str,
        pointer: Point,
    ) -> EditorResult<BlockId> {
        let id = graph.place_instance(type_name, pointer)?;
        if let Some((_, previous)) = self.dragging.replace((type_name.to_string(), id.clone())) {
            log::debug!("template drag for {} superseded without end event", previous);
        }
        Ok(id)
    }

    /// Redirect a move of the template gesture to the placed instance.
    /// Returns the moved block, `None` when no template drag is active or the
    /// instance has been deleted meanwhile.
    pub fn drag(&mut self, graph: &mut GraphStore, pointer: Point) -> Option<BlockId> {
        let (_, id) = self.dragging.as_ref()?;
        graph.move_block(id, pointer).then(|| id.clone())
    }

    /// End the template gesture, leaving the instance where it is.
    pub fn end(&mut self) -> Option<BlockId> {
        self.dragging.take().map(|(_, id)| id)
    }

    /// Stop redirecting if `block` is the instance being dragged.
    pub fn forget(&mut self, block: &BlockId) {
        if self.dragging.as_ref().is_some_and(|(_, id)| id == block) {
            self.dragging = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::error::EditorError;
    use crate::ids::SequentialIds;

    fn graph() -> GraphStore {
        GraphStore::new(Catalog::builtin(), Box::new(SequentialIds::default()))
    }

    #[test]
    fn test_template_drag_places_and_moves_instance() {
        let mut g = graph();
        let mut promo = TemplatePromotion::new();
        let id = promo.begin(&mut g, "RGB to YUV", Point::new(10.0, 10.0)).unwrap();
        assert_eq!(promo.active(), Some(("RGB to YUV", &id)));

        assert_eq!(promo.drag(&mut g, Point::new(40.0, 50.0)), Some(id.clone()));
        assert_eq!(g.block(&id).unwrap().position, Some(Point::new(40.0, 50.0)));

        assert_eq!(promo.end(), Some(id.clone()));
        assert_eq!(promo.drag(&mut g, Point::new(0.0, 0.0)), None);
        assert_eq!(g.block(&id).unwrap().position, Some(Point::new(40.0, 50.0)));
    }

    #[test]
    fn test_drawer_is_inexhaustible() {
        let mut g = graph();
        let mut promo = TemplatePromotion::new();
        for i in 0..3 {
            promo.begin(&mut g, "Camera Input", Point::new(i as f32, 0.0)).unwrap();
            promo.end();
        }
        assert_eq!(g.block_count(), 3);
        let templates = g
            .drawer()
            .iter()
            .filter(|b| b.is_template && b.type_name == "Camera Input")
            .count();
        assert_eq!(templates, 1);
        assert!(g.drawer().iter().all(|b| b.position.is_none()));
    }

    #[test]
    fn test_unknown_type_leaves_no_redirect() {
        let mut g = graph();
        let mut promo = TemplatePromotion::new();
        let err = promo.begin(&mut g, "Warp Drive", Point::default()).unwrap_err();
        assert!(matches!(err, EditorError::UnknownType { .. }));
        assert!(promo.active().is_none());
    }

    #[test]
    fn test_forget_deleted_instance() {
        let mut g = graph();
        let mut promo = TemplatePromotion::new();
        let id = promo.begin(&mut g, "RANSAC", Point::default()).unwrap();
        g.delete_block(&id);
        assert_eq!(promo.drag(&mut g, Point::new(5.0, 5.0)), None);
        promo.forget(&id);
        assert!(promo.active().is_none());
    }
}
