//! Render description produced once per repaint.
//!
//! This module turns live shapes into simple primitives that a host renderer
//! can draw under a single root transform. All coordinates are in world space
//! and all sizes are already compensated for the current zoom.

use crate::anchor::{self, Anchor};
use crate::context::OverlayContext;
use crate::factory::ShapeDraft;
use crate::geometry::Point;
use crate::label::{self, LabelView};
use crate::model::{Geometry, Shape, ShapeId};
use crate::store::ShapeStore;
use crate::viewport::ViewportFrame;

/// Transform applied to the overlay root so world space lines up with the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootTransform {
    /// Horizontal scale, negative when the viewport is flipped
    pub scale_x: f64,
    /// Vertical scale
    pub scale_y: f64,
    /// Rotation in degrees
    pub rotation: f64,
    /// Screen X of the world origin
    pub x: f64,
    /// Screen Y of the world origin
    pub y: f64,
}

impl From<&ViewportFrame> for RootTransform {
    fn from(frame: &ViewportFrame) -> Self {
        Self {
            scale_x: if frame.flip {
                -frame.scale.x
            } else {
                frame.scale.x
            },
            scale_y: frame.scale.y,
            rotation: frame.rotation,
            x: frame.position.x,
            y: frame.position.y,
        }
    }
}

/// A drawable primitive in world space.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// A stroked circle.
    Circle {
        /// Center in world space
        center: Point,
        /// Radius in world units
        radius: f64,
    },
    /// A stroked rectangle, always with non-negative extent.
    Rect {
        /// Left edge X in world space
        x: f64,
        /// Top edge Y in world space
        y: f64,
        /// Width in world units
        width: f64,
        /// Height in world units
        height: f64,
    },
    /// A stroked axis-aligned ellipse.
    Ellipse {
        center: Point,
        radius_x: f64,
        radius_y: f64,
    },
    /// A segment with an arrowhead at `tip`.
    Arrow {
        start: Point,
        end: Point,
        /// Visual tip, `end` pushed out by the marker offset
        tip: Point,
        /// Arrowhead length in world units
        head_length: f64,
    },
    /// An open or closed polyline.
    Polygon {
        /// Vertices in world space
        vertices: Vec<Point>,
        /// Whether the last vertex connects back to the first
        closed: bool,
    },
    /// A measuring segment with perpendicular end-caps.
    Ruler {
        start: Point,
        end: Point,
        /// End-cap segments, empty for a zero-length ruler
        caps: Vec<(Point, Point)>,
    },
    /// A pin marker.
    Flag {
        position: Point,
        /// Marker radius in world units
        radius: f64,
    },
}

impl Primitive {
    /// Build the primitive for a shape under the current frame.
    pub fn for_shape(shape: &Shape, ctx: &OverlayContext) -> Self {
        match &shape.geometry {
            Geometry::Circle(c) => Primitive::Circle {
                center: c.center,
                radius: c.radius,
            },
            Geometry::Rectangle(r) => {
                let n = r.normalized();
                Primitive::Rect {
                    x: n.x,
                    y: n.y,
                    width: n.width,
                    height: n.height,
                }
            }
            Geometry::Ellipse(e) => Primitive::Ellipse {
                center: e.center,
                radius_x: e.radius_x,
                radius_y: e.radius_y,
            },
            Geometry::Arrow(a) => Primitive::Arrow {
                start: a.start,
                end: a.end,
                tip: anchor::arrow_tip(a, ctx),
                head_length: ctx.marker_offset(a.marker_size),
            },
            Geometry::Polygon(p) => Primitive::Polygon {
                vertices: p.points.clone(),
                closed: p.closed,
            },
            Geometry::Ruler(r) => Primitive::Ruler {
                start: r.start,
                end: r.end,
                caps: anchor::ruler_caps(r.start, r.end, ctx.ruler_cap_length())
                    .map(Vec::from)
                    .unwrap_or_default(),
            },
            Geometry::Flag(f) => Primitive::Flag {
                position: f.position,
                radius: ctx.flag_radius(),
            },
        }
    }
}

/// One shape ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    pub id: ShapeId,
    pub primitive: Primitive,
    pub stroke: String,
    /// Stroke width in world units
    pub stroke_width: f64,
    pub selected: bool,
    /// Whether this is the in-progress draft
    pub draft: bool,
}

impl RenderItem {
    fn new(shape: &Shape, ctx: &OverlayContext) -> Self {
        Self {
            id: shape.id.clone(),
            primitive: Primitive::for_shape(shape, ctx),
            stroke: shape.style.stroke.clone(),
            stroke_width: shape.style.stroke_width,
            selected: false,
            draft: false,
        }
    }
}

/// Temporary polygon construction helpers.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftScaffold {
    /// Segment from the last committed vertex to the pointer
    pub rubber_band: Option<(Point, Point)>,
    /// Committed vertices
    pub vertex_markers: Vec<Point>,
    /// Marker radius in world units
    pub marker_radius: f64,
}

/// Everything the host needs to repaint the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub root: RootTransform,
    /// Shapes in paint order, draft last
    pub items: Vec<RenderItem>,
    /// Anchors of the selected shape
    pub anchors: Vec<Anchor>,
    pub labels: Vec<LabelView>,
    /// Present while a polygon is being drawn
    pub scaffold: Option<DraftScaffold>,
}

impl Scene {
    /// Build the scene for the current state.
    pub fn build(store: &ShapeStore, draft: Option<&ShapeDraft>, ctx: &OverlayContext) -> Self {
        let selected = store.selected();
        let hovered = store.hovered();

        let mut items = Vec::with_capacity(store.len() + 1);
        let mut labels = Vec::new();
        let mut anchors = Vec::new();

        for shape in store.iter().filter(|s| s.style.visible) {
            let is_selected = selected == Some(shape.id.as_str());
            let mut item = RenderItem::new(shape, ctx);
            item.selected = is_selected;
            items.push(item);

            if is_selected {
                anchors = anchor::anchors_for(shape, ctx);
            }
            let is_hovered = hovered == Some(shape.id.as_str());
            labels.extend(label::layout_label(shape, is_selected, is_hovered, ctx));
        }

        let mut scaffold = None;
        if let Some(draft) = draft {
            let mut item = RenderItem::new(draft.shape(), ctx);
            item.draft = true;
            items.push(item);
            labels.extend(label::layout_label(draft.shape(), true, false, ctx));

            if matches!(draft.shape().geometry, Geometry::Polygon(_)) {
                scaffold = Some(DraftScaffold {
                    rubber_band: draft.rubber_band(),
                    vertex_markers: draft.vertices().to_vec(),
                    marker_radius: ctx.anchor_radius(),
                });
            }
        }

        Self {
            root: RootTransform::from(&ctx.frame),
            items,
            anchors,
            labels,
            scaffold,
        }
    }

    pub fn item(&self, id: &str) -> Option<&RenderItem> {
        self.items.iter().find(|i| i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArrowGeometry, Measurement, RulerGeometry, ShapeKind, Style};
    use crate::viewport::Scale;

    fn shape(id: &str, geometry: Geometry) -> Shape {
        Shape {
            id: id.into(),
            geometry,
            style: Style {
                stroke: "#0f0".into(),
                stroke_width: 2.0,
                visible: true,
            },
            measurement: Measurement::default(),
        }
    }

    #[test]
    fn test_root_transform_mirrors_flip() {
        let frame = ViewportFrame {
            scale: Scale { x: 2.0, y: 2.0 },
            rotation: 90.0,
            position: Point::new(10.0, 20.0),
            flip: true,
            ..ViewportFrame::identity()
        };
        let root = RootTransform::from(&frame);
        assert_eq!(root.scale_x, -2.0);
        assert_eq!(root.scale_y, 2.0);
        assert_eq!((root.x, root.y, root.rotation), (10.0, 20.0, 90.0));
    }

    #[test]
    fn test_zero_length_ruler_has_no_caps() {
        let ctx = OverlayContext::default();
        let ruler = shape(
            "r",
            Geometry::Ruler(RulerGeometry {
                start: Point::new(4.0, 4.0),
                end: Point::new(4.0, 4.0),
            }),
        );
        let Primitive::Ruler { caps, .. } = Primitive::for_shape(&ruler, &ctx) else {
            panic!("Expected ruler");
        };
        assert!(caps.is_empty());
    }

    #[test]
    fn test_arrow_tip_beyond_end() {
        let ctx = OverlayContext::default();
        let arrow = shape(
            "a",
            Geometry::Arrow(ArrowGeometry {
                start: Point::ZERO,
                end: Point::new(0.0, 50.0),
                marker_size: 10.0,
            }),
        );
        let Primitive::Arrow { tip, .. } = Primitive::for_shape(&arrow, &ctx) else {
            panic!("Expected arrow");
        };
        assert_eq!(tip, Point::new(0.0, 60.0));
    }

    #[test]
    fn test_selected_shape_gets_anchors_and_label() {
        let ctx = OverlayContext::default();
        let mut store = ShapeStore::new();
        store.add(shape(
            "r",
            Geometry::Ruler(RulerGeometry {
                start: Point::ZERO,
                end: Point::new(30.0, 0.0),
            }),
        ));
        let mut ruler = store.get("r").cloned().unwrap();
        ruler.measurement.recompute(&ruler.geometry, 1.0);
        store.add(ruler);

        let scene = Scene::build(&store, None, &ctx);
        assert!(scene.anchors.is_empty());
        assert!(scene.labels.is_empty());

        store.select(Some("r".into()));
        let scene = Scene::build(&store, None, &ctx);
        assert_eq!(scene.anchors.len(), 2);
        assert_eq!(scene.labels.len(), 1);
        assert!(scene.item("r").unwrap().selected);
    }

    #[test]
    fn test_polygon_draft_scaffold() {
        let ctx = OverlayContext::default();
        let mut draft = ShapeDraft::create("p".into(), ShapeKind::Polygon, Point::ZERO, &ctx);
        draft.add_vertex(Point::new(10.0, 0.0), &ctx);
        draft.update_from_drag(Point::new(10.0, 10.0), &ctx);

        let scene = Scene::build(&ShapeStore::new(), Some(&draft), &ctx);
        let scaffold = scene.scaffold.unwrap();
        assert_eq!(scaffold.vertex_markers.len(), 2);
        assert_eq!(
            scaffold.rubber_band,
            Some((Point::new(10.0, 0.0), Point::new(10.0, 10.0)))
        );
        assert!(scene.items.last().unwrap().draft);
    }
}
