//! Anchors (control handles) and shape hit-testing.
//!
//! Anchors are never stored. They are derived from the owning shape's
//! geometry and the current frame whenever they are needed, so their world
//! radius is always `anchor_size / zoom` and they keep a constant on-screen
//! size.

use crate::context::OverlayContext;
use crate::geometry::{self, Bounds, Point};
use crate::model::{
    ArrowGeometry, CircleGeometry, EllipseGeometry, Geometry, RectangleGeometry, Shape, ShapeId,
};

/// Named handle positions on a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl BoxHandle {
    pub fn all() -> &'static [BoxHandle] {
        &[
            BoxHandle::TopLeft,
            BoxHandle::Top,
            BoxHandle::TopRight,
            BoxHandle::Right,
            BoxHandle::BottomRight,
            BoxHandle::Bottom,
            BoxHandle::BottomLeft,
            BoxHandle::Left,
        ]
    }

    /// Edge midpoints only.
    pub fn edges() -> &'static [BoxHandle] {
        &[
            BoxHandle::Top,
            BoxHandle::Right,
            BoxHandle::Bottom,
            BoxHandle::Left,
        ]
    }

    fn position(&self, b: &Bounds) -> Point {
        let c = b.center();
        match self {
            BoxHandle::TopLeft => b.min,
            BoxHandle::Top => Point::new(c.x, b.min.y),
            BoxHandle::TopRight => Point::new(b.max.x, b.min.y),
            BoxHandle::Right => Point::new(b.max.x, c.y),
            BoxHandle::BottomRight => b.max,
            BoxHandle::Bottom => Point::new(c.x, b.max.y),
            BoxHandle::BottomLeft => Point::new(b.min.x, b.max.y),
            BoxHandle::Left => Point::new(b.min.x, c.y),
        }
    }

    /// Move this handle of `b` to `p`. The result never has negative extent
    /// and never gets thinner than `min_extent` along a moved axis.
    fn resize(&self, b: &Bounds, p: Point, min_extent: f64) -> Bounds {
        let (mut left, mut top, mut right, mut bottom) = (b.min.x, b.min.y, b.max.x, b.max.y);
        let x = |fixed: f64, original: f64| keep_extent(p.x, fixed, original, min_extent);
        let y = |fixed: f64, original: f64| keep_extent(p.y, fixed, original, min_extent);
        match self {
            BoxHandle::TopLeft => (left, top) = (x(right, left), y(bottom, top)),
            BoxHandle::Top => top = y(bottom, top),
            BoxHandle::TopRight => (right, top) = (x(left, right), y(bottom, top)),
            BoxHandle::Right => right = x(left, right),
            BoxHandle::BottomRight => (right, bottom) = (x(left, right), y(top, bottom)),
            BoxHandle::Bottom => bottom = y(top, bottom),
            BoxHandle::BottomLeft => (left, bottom) = (x(right, left), y(top, bottom)),
            BoxHandle::Left => left = x(right, left),
        }
        Bounds::from_corners(Point::new(left, top), Point::new(right, bottom))
    }
}

/// Position for a dragged edge at least `min` away from the `fixed` one.
///
/// An edge landing exactly on `fixed` stays on its `original` side.
fn keep_extent(moved: f64, fixed: f64, original: f64, min: f64) -> f64 {
    let d = moved - fixed;
    if d.abs() >= min {
        return moved;
    }
    let side = if d.abs() > 0.0 {
        d.signum()
    } else {
        (original - fixed).signum()
    };
    fixed + side * min
}

/// End of a line-like shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Start,
    End,
}

/// What an anchor controls on its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorRole {
    Box(BoxHandle),
    Endpoint(Endpoint),
    /// Polygon vertex by index.
    Vertex(usize),
}

/// A handle derived for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub owner: ShapeId,
    pub role: AnchorRole,
    /// Center in world space.
    pub position: Point,
    /// Radius in world units.
    pub radius: f64,
    /// Outline width in world units.
    pub stroke_width: f64,
}

impl Anchor {
    /// Circle test in the anchor's own radius.
    pub fn hit(&self, p: Point) -> bool {
        self.position.distance_sq(&p) <= self.radius * self.radius
    }
}

/// Visual tip of an arrow: the segment end pushed out by the marker offset.
pub fn arrow_tip(arrow: &ArrowGeometry, ctx: &OverlayContext) -> Point {
    match (arrow.end - arrow.start).normalized() {
        Some(dir) => arrow.end + dir * ctx.marker_offset(arrow.marker_size),
        None => arrow.end,
    }
}

/// Perpendicular end-caps of a ruler, `None` for a zero-length ruler.
pub fn ruler_caps(start: Point, end: Point, cap_length: f64) -> Option<[(Point, Point); 2]> {
    let normal = (end - start).normalized()?.perpendicular() * (cap_length / 2.0);
    Some([
        (start - normal, start + normal),
        (end - normal, end + normal),
    ])
}

fn control_points(geometry: &Geometry, ctx: &OverlayContext) -> Vec<(AnchorRole, Point)> {
    match geometry {
        Geometry::Circle(c) => {
            let bounds = Bounds::from_corners(
                c.center.offset(-c.radius, -c.radius),
                c.center.offset(c.radius, c.radius),
            );
            BoxHandle::edges()
                .iter()
                .map(|h| (AnchorRole::Box(*h), h.position(&bounds)))
                .collect()
        }
        Geometry::Rectangle(r) => {
            let bounds = r.bounds();
            BoxHandle::all()
                .iter()
                .map(|h| (AnchorRole::Box(*h), h.position(&bounds)))
                .collect()
        }
        Geometry::Ellipse(e) => {
            let bounds = e.bounds();
            BoxHandle::all()
                .iter()
                .map(|h| (AnchorRole::Box(*h), h.position(&bounds)))
                .collect()
        }
        Geometry::Arrow(a) => vec![
            (AnchorRole::Endpoint(Endpoint::Start), a.start),
            (AnchorRole::Endpoint(Endpoint::End), arrow_tip(a, ctx)),
        ],
        Geometry::Ruler(r) => vec![
            (AnchorRole::Endpoint(Endpoint::Start), r.start),
            (AnchorRole::Endpoint(Endpoint::End), r.end),
        ],
        Geometry::Polygon(p) => p
            .points
            .iter()
            .enumerate()
            .map(|(i, v)| (AnchorRole::Vertex(i), *v))
            .collect(),
        Geometry::Flag(_) => Vec::new(),
    }
}

/// Build the anchors of a shape for the current frame.
pub fn anchors_for(shape: &Shape, ctx: &OverlayContext) -> Vec<Anchor> {
    let radius = ctx.anchor_radius();
    let stroke_width = ctx.anchor_stroke_width();
    control_points(&shape.geometry, ctx)
        .into_iter()
        .map(|(role, position)| Anchor {
            owner: shape.id.clone(),
            role,
            position,
            radius,
            stroke_width,
        })
        .collect()
}

/// Find the anchor under `p`. Later anchors win, matching draw order.
pub fn hit_test_anchor(anchors: &[Anchor], p: Point) -> Option<AnchorRole> {
    anchors.iter().rev().find(|a| a.hit(p)).map(|a| a.role)
}

/// Whether `p` lands on the shape body.
///
/// Arrows test against their raw segment; the arrowhead extension only
/// affects where the end anchor sits.
pub fn hit_test_shape(shape: &Shape, p: Point, ctx: &OverlayContext) -> bool {
    if !shape.style.visible {
        return false;
    }
    let tol = ctx.hit_tolerance();
    match &shape.geometry {
        Geometry::Circle(c) => c.center.distance_to(&p) <= c.radius + tol,
        Geometry::Rectangle(r) => {
            let b = r.bounds();
            Bounds::from_corners(b.min.offset(-tol, -tol), b.max.offset(tol, tol)).contains(&p)
        }
        Geometry::Ellipse(e) => {
            let (rx, ry) = (e.radius_x + tol, e.radius_y + tol);
            let dx = (p.x - e.center.x) / rx;
            let dy = (p.y - e.center.y) / ry;
            dx * dx + dy * dy <= 1.0
        }
        Geometry::Arrow(a) => geometry::distance_to_segment(p, a.start, a.end) <= tol,
        Geometry::Ruler(r) => geometry::distance_to_segment(p, r.start, r.end) <= tol,
        Geometry::Polygon(poly) => {
            let n = poly.points.len();
            let edges = if poly.closed { n } else { n.saturating_sub(1) };
            (poly.closed && geometry::polygon_contains(&poly.points, &p))
                || (0..edges).any(|i| {
                    let a = poly.points[i];
                    let b = poly.points[(i + 1) % n];
                    geometry::distance_to_segment(p, a, b) <= tol
                })
                || (n == 1 && poly.points[0].distance_to(&p) <= tol)
        }
        Geometry::Flag(f) => f.position.distance_to(&p) <= ctx.flag_radius() + tol,
    }
}

/// Re-derive geometry from dragging `role` to `p`, starting from `original`.
///
/// Returns `None` when the role does not belong to this kind of shape.
pub fn apply_anchor_drag(
    original: &Geometry,
    role: AnchorRole,
    p: Point,
    ctx: &OverlayContext,
) -> Option<Geometry> {
    match (original, role) {
        (Geometry::Circle(c), AnchorRole::Box(_)) => Some(Geometry::Circle(CircleGeometry {
            center: c.center,
            radius: c.center.distance_to(&p).max(ctx.min_shape_extent() / 2.0),
        })),
        (Geometry::Rectangle(r), AnchorRole::Box(handle)) => Some(Geometry::Rectangle(
            RectangleGeometry::from_bounds(handle.resize(&r.bounds(), p, ctx.min_shape_extent())),
        )),
        (Geometry::Ellipse(e), AnchorRole::Box(handle)) => {
            let b = handle.resize(&e.bounds(), p, ctx.min_shape_extent());
            Some(Geometry::Ellipse(EllipseGeometry {
                center: b.center(),
                radius_x: b.width() / 2.0,
                radius_y: b.height() / 2.0,
            }))
        }
        (Geometry::Arrow(a), AnchorRole::Endpoint(Endpoint::Start)) => {
            Some(Geometry::Arrow(ArrowGeometry { start: p, ..*a }))
        }
        (Geometry::Arrow(a), AnchorRole::Endpoint(Endpoint::End)) => {
            // The handle sits on the tip, so pull the segment end back by the marker offset.
            let offset = ctx.marker_offset(a.marker_size);
            let end = match (p - a.start).normalized() {
                Some(dir) if a.start.distance_to(&p) > offset => p - dir * offset,
                _ => p,
            };
            Some(Geometry::Arrow(ArrowGeometry { end, ..*a }))
        }
        (Geometry::Ruler(r), AnchorRole::Endpoint(endpoint)) => {
            let mut ruler = *r;
            match endpoint {
                Endpoint::Start => ruler.start = p,
                Endpoint::End => ruler.end = p,
            }
            Some(Geometry::Ruler(ruler))
        }
        (Geometry::Polygon(poly), AnchorRole::Vertex(i)) if i < poly.points.len() => {
            let mut poly = poly.clone();
            poly.points[i] = p;
            Some(Geometry::Polygon(poly))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::approx_eq;
    use crate::model::{Measurement, PolygonGeometry, RulerGeometry, Style};
    use crate::viewport::{Scale, ViewportFrame};

    fn ctx_at(zoom: f64) -> OverlayContext {
        let mut ctx = OverlayContext::default();
        ctx.frame = ViewportFrame {
            scale: Scale { x: zoom, y: zoom },
            ..ViewportFrame::identity()
        };
        ctx
    }

    fn shape(geometry: Geometry) -> Shape {
        Shape {
            id: "s".into(),
            geometry,
            style: Style {
                stroke: "#fff".into(),
                stroke_width: 1.0,
                visible: true,
            },
            measurement: Measurement::default(),
        }
    }

    fn rect() -> Geometry {
        Geometry::Rectangle(RectangleGeometry {
            x: 10.0,
            y: 10.0,
            width: 40.0,
            height: 20.0,
        })
    }

    #[test]
    fn test_anchor_counts_per_kind() {
        let ctx = ctx_at(1.0);
        assert_eq!(anchors_for(&shape(rect()), &ctx).len(), 8);
        let circle = Geometry::Circle(CircleGeometry {
            center: Point::ZERO,
            radius: 5.0,
        });
        assert_eq!(anchors_for(&shape(circle), &ctx).len(), 4);
        let poly = Geometry::Polygon(PolygonGeometry {
            points: vec![Point::ZERO, Point::new(5.0, 0.0), Point::new(0.0, 5.0)],
            closed: true,
        });
        assert_eq!(anchors_for(&shape(poly), &ctx).len(), 3);
    }

    #[test]
    fn test_anchor_radius_is_screen_invariant() {
        for zoom in [0.1, 1.0, 10.0, 100.0] {
            let ctx = ctx_at(zoom);
            let anchors = anchors_for(&shape(rect()), &ctx);
            assert!(approx_eq(
                anchors[0].radius * zoom,
                ctx.config.interaction.anchor_size
            ));
        }
    }

    #[test]
    fn test_anchor_hit_uses_world_radius() {
        let ctx = ctx_at(10.0);
        let anchors = anchors_for(&shape(rect()), &ctx);
        // Anchor radius is 6px = 0.6 world units at 10x
        assert_eq!(
            hit_test_anchor(&anchors, Point::new(10.5, 10.0)),
            Some(AnchorRole::Box(BoxHandle::TopLeft))
        );
        assert_eq!(hit_test_anchor(&anchors, Point::new(11.0, 10.0)), None);
    }

    #[test]
    fn test_rectangle_corner_resize_never_negative() {
        let ctx = ctx_at(1.0);
        for handle in BoxHandle::all() {
            for p in [
                Point::new(-100.0, -100.0),
                Point::new(200.0, 200.0),
                Point::new(-100.0, 200.0),
                Point::new(200.0, -100.0),
            ] {
                let Some(Geometry::Rectangle(r)) =
                    apply_anchor_drag(&rect(), AnchorRole::Box(*handle), p, &ctx)
                else {
                    panic!("Expected rectangle");
                };
                assert!(r.width >= 0.0 && r.height >= 0.0, "{handle:?} {p:?} -> {r:?}");
            }
        }
    }

    #[test]
    fn test_rectangle_drag_past_opposite_corner() {
        let ctx = ctx_at(1.0);
        let role = AnchorRole::Box(BoxHandle::TopLeft);
        let Some(Geometry::Rectangle(r)) =
            apply_anchor_drag(&rect(), role, Point::new(70.0, 40.0), &ctx)
        else {
            panic!("Expected rectangle");
        };
        // Opposite corner (50, 30) stays fixed
        assert_eq!((r.x, r.y, r.width, r.height), (50.0, 30.0, 20.0, 10.0));
    }

    #[test]
    fn test_box_resize_never_collapses() {
        let ctx = ctx_at(4.0);
        // 1px minimum = 0.25 world units at 4x
        let role = AnchorRole::Box(BoxHandle::Right);
        let Some(Geometry::Rectangle(r)) =
            apply_anchor_drag(&rect(), role, Point::new(10.0, 20.0), &ctx)
        else {
            panic!("Expected rectangle");
        };
        assert_eq!((r.x, r.width), (10.0, 0.25));

        let role = AnchorRole::Box(BoxHandle::BottomLeft);
        let Some(Geometry::Rectangle(r)) =
            apply_anchor_drag(&rect(), role, Point::new(49.9, 10.1), &ctx)
        else {
            panic!("Expected rectangle");
        };
        // Inside the minimum on both axes, still on the original sides
        assert!(approx_eq(r.x, 49.75) && approx_eq(r.width, 0.25));
        assert!(approx_eq(r.y, 10.0) && approx_eq(r.height, 0.25));

        let circle = Geometry::Circle(CircleGeometry {
            center: Point::new(5.0, 5.0),
            radius: 2.0,
        });
        let Some(Geometry::Circle(c)) =
            apply_anchor_drag(&circle, AnchorRole::Box(BoxHandle::Top), Point::new(5.0, 5.0), &ctx)
        else {
            panic!("Expected circle");
        };
        assert!(approx_eq(c.radius, 0.125));
    }

    #[test]
    fn test_circle_resize_keeps_center() {
        let ctx = ctx_at(1.0);
        let circle = Geometry::Circle(CircleGeometry {
            center: Point::new(5.0, 5.0),
            radius: 2.0,
        });
        let role = AnchorRole::Box(BoxHandle::Right);
        let Some(Geometry::Circle(c)) = apply_anchor_drag(&circle, role, Point::new(5.0, 12.0), &ctx)
        else {
            panic!("Expected circle");
        };
        assert_eq!(c.center, Point::new(5.0, 5.0));
        assert!(approx_eq(c.radius, 7.0));
    }

    #[test]
    fn test_arrow_end_anchor_sits_on_tip() {
        let ctx = ctx_at(2.0);
        let arrow = ArrowGeometry {
            start: Point::ZERO,
            end: Point::new(100.0, 0.0),
            marker_size: 10.0,
        };
        // 10px marker at 2x zoom = 5 world units
        let tip = arrow_tip(&arrow, &ctx);
        assert!(approx_eq(tip.x, 105.0));

        let anchors = anchors_for(&shape(Geometry::Arrow(arrow)), &ctx);
        assert_eq!(anchors[1].position, tip);

        // Dragging the tip handle to x=205 puts the segment end at 200
        let Some(Geometry::Arrow(moved)) = apply_anchor_drag(
            &Geometry::Arrow(arrow),
            AnchorRole::Endpoint(Endpoint::End),
            Point::new(205.0, 0.0),
            &ctx,
        ) else {
            panic!("Expected arrow");
        };
        assert!(approx_eq(moved.end.x, 200.0));
    }

    #[test]
    fn test_arrow_hit_ignores_arrowhead() {
        let ctx = ctx_at(1.0);
        let arrow = shape(Geometry::Arrow(ArrowGeometry {
            start: Point::ZERO,
            end: Point::new(100.0, 0.0),
            marker_size: 50.0,
        }));
        assert!(hit_test_shape(&arrow, Point::new(100.0, 0.0), &ctx));
        // Within the 50px arrowhead, outside the 6px tolerance
        assert!(!hit_test_shape(&arrow, Point::new(140.0, 0.0), &ctx));
    }

    #[test]
    fn test_polygon_vertex_drag_touches_one_point() {
        let ctx = ctx_at(1.0);
        let poly = Geometry::Polygon(PolygonGeometry {
            points: vec![Point::ZERO, Point::new(10.0, 0.0), Point::new(0.0, 10.0)],
            closed: true,
        });
        let Some(Geometry::Polygon(moved)) =
            apply_anchor_drag(&poly, AnchorRole::Vertex(1), Point::new(20.0, 0.0), &ctx)
        else {
            panic!("Expected polygon");
        };
        assert_eq!(moved.points[0], Point::ZERO);
        assert_eq!(moved.points[1], Point::new(20.0, 0.0));
        assert_eq!(moved.points[2], Point::new(0.0, 10.0));

        assert!(apply_anchor_drag(&poly, AnchorRole::Vertex(7), Point::ZERO, &ctx).is_none());
    }

    #[test]
    fn test_ruler_caps() {
        let caps = ruler_caps(Point::ZERO, Point::new(10.0, 0.0), 4.0).unwrap();
        assert_eq!(caps[0], (Point::new(0.0, -2.0), Point::new(0.0, 2.0)));
        assert_eq!(caps[1], (Point::new(10.0, -2.0), Point::new(10.0, 2.0)));
        assert!(ruler_caps(Point::ZERO, Point::ZERO, 4.0).is_none());
    }

    #[test]
    fn test_mismatched_role_is_no_match() {
        let ctx = ctx_at(1.0);
        let ruler = Geometry::Ruler(RulerGeometry {
            start: Point::ZERO,
            end: Point::new(1.0, 1.0),
        });
        assert!(apply_anchor_drag(&ruler, AnchorRole::Box(BoxHandle::Top), Point::ZERO, &ctx).is_none());
    }
}
