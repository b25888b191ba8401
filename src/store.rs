//! Ordered storage for live shapes plus selection, hover and the dirty flag.

use crate::anchor;
use crate::context::OverlayContext;
use crate::geometry::Point;
use crate::model::{Shape, ShapeId};

/// All live shapes of one overlay, in paint order (last is top-most).
#[derive(Debug, Clone)]
pub struct ShapeStore {
    shapes: Vec<Shape>,
    /// Counter for generating unique shape IDs.
    next_id: u64,
    selected: Option<ShapeId>,
    hovered: Option<ShapeId>,
    /// Set when shapes or selection change.
    /// Used to avoid rebuilding the scene every tick.
    dirty: bool,
}

impl Default for ShapeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeStore {
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            next_id: 1,
            selected: None,
            hovered: None,
            dirty: true, // Start dirty so the first scene is built
        }
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag. Call after building a scene.
    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Generate an id not used by any stored shape.
    pub fn next_id(&mut self) -> ShapeId {
        loop {
            let id = format!("shape-{}", self.next_id);
            self.next_id += 1;
            if !self.contains(&id) {
                return id;
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.shapes.iter().any(|s| s.id == id)
    }

    /// Append a shape on top. An existing shape with the same id is replaced in place.
    pub fn add(&mut self, shape: Shape) {
        if let Some(existing) = self.get_mut(&shape.id) {
            *existing = shape;
        } else {
            self.shapes.push(shape);
        }
        self.mark_dirty();
    }

    /// Put a shape back at a given paint position.
    pub fn insert(&mut self, index: usize, shape: Shape) {
        let index = index.min(self.shapes.len());
        self.shapes.insert(index, shape);
        self.mark_dirty();
    }

    /// Remove a shape by id, returning it and its paint position.
    pub fn remove(&mut self, id: &str) -> Option<(usize, Shape)> {
        let index = self.index_of(id)?;
        let shape = self.shapes.remove(index);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if self.hovered.as_deref() == Some(id) {
            self.hovered = None;
        }
        self.mark_dirty();
        Some((index, shape))
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.shapes.iter().position(|s| s.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Mutable access. Marks the store dirty.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Shape> {
        let shape = self.shapes.iter_mut().find(|s| s.id == id)?;
        self.dirty = true;
        Some(shape)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Shape> {
        self.dirty = true;
        self.shapes.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Replace every shape at once. Selection and hover are dropped.
    pub fn replace_all(&mut self, shapes: Vec<Shape>) -> Vec<Shape> {
        self.selected = None;
        self.hovered = None;
        self.mark_dirty();
        std::mem::replace(&mut self.shapes, shapes)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_shape(&self) -> Option<&Shape> {
        self.get(self.selected.as_deref()?)
    }

    /// Select a shape (or clear the selection with `None`).
    pub fn select(&mut self, id: Option<ShapeId>) {
        let id = id.filter(|id| self.contains(id));
        if self.selected != id {
            log::debug!("Selection changed: {:?} -> {:?}", self.selected, id);
            self.selected = id;
            self.mark_dirty();
        }
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn set_hovered(&mut self, id: Option<ShapeId>) {
        if self.hovered != id {
            self.hovered = id;
            self.mark_dirty();
        }
    }

    /// Top-most visible shape under the point.
    pub fn hit_test(&self, point: Point, ctx: &OverlayContext) -> Option<&Shape> {
        self.shapes
            .iter()
            .rev()
            .filter(|s| s.style.visible)
            .find(|s| anchor::hit_test_shape(s, point, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FlagGeometry, Geometry, Measurement, RectangleGeometry, Style};

    fn rect(id: &str, x: f64) -> Shape {
        Shape {
            id: id.into(),
            geometry: Geometry::Rectangle(RectangleGeometry {
                x,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            }),
            style: Style {
                stroke: "#fff".into(),
                stroke_width: 1.0,
                visible: true,
            },
            measurement: Measurement::default(),
        }
    }

    #[test]
    fn test_dirty_tracking() {
        let mut store = ShapeStore::new();
        assert!(store.is_dirty());
        store.clear_dirty();
        store.add(rect("a", 0.0));
        assert!(store.is_dirty());
        store.clear_dirty();
        store.select(Some("a".into()));
        assert!(store.is_dirty());
        store.clear_dirty();
        store.select(Some("a".into()));
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_next_id_skips_existing() {
        let mut store = ShapeStore::new();
        store.add(rect("shape-1", 0.0));
        assert_eq!(store.next_id(), "shape-2");
    }

    #[test]
    fn test_remove_clears_selection() {
        let mut store = ShapeStore::new();
        store.add(rect("a", 0.0));
        store.add(rect("b", 20.0));
        store.select(Some("a".into()));
        let (index, shape) = store.remove("a").unwrap();
        assert_eq!(index, 0);
        assert_eq!(shape.id, "a");
        assert!(store.selected().is_none());
        assert!(store.remove("missing").is_none());
    }

    #[test]
    fn test_select_unknown_id_clears() {
        let mut store = ShapeStore::new();
        store.add(rect("a", 0.0));
        store.select(Some("a".into()));
        store.select(Some("ghost".into()));
        assert!(store.selected().is_none());
    }

    #[test]
    fn test_hit_test_prefers_top_most() {
        let ctx = OverlayContext::default();
        let mut store = ShapeStore::new();
        store.add(rect("bottom", 0.0));
        store.add(rect("top", 5.0));
        assert_eq!(
            store.hit_test(Point::new(7.0, 5.0), &ctx).map(|s| s.id.as_str()),
            Some("top")
        );
        assert!(store.hit_test(Point::new(100.0, 100.0), &ctx).is_none());
    }

    #[test]
    fn test_hidden_shapes_are_not_hit() {
        let ctx = OverlayContext::default();
        let mut store = ShapeStore::new();
        let mut flag = rect("f", 0.0);
        flag.geometry = Geometry::Flag(FlagGeometry {
            position: Point::ZERO,
        });
        flag.style.visible = false;
        store.add(flag);
        assert!(store.hit_test(Point::ZERO, &ctx).is_none());
    }
}
