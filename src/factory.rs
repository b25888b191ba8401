//! Shape construction.
//!
//! A [`ShapeDraft`] is a shape in its Creating state. Every kind goes through
//! the same calls (`create`, `update_from_drag`, `complete`); polygons also
//! accumulate clicked vertices through `add_vertex`. A draft that cannot form
//! a valid shape completes to `None` and leaves nothing behind.

use crate::constants::MIN_POLYGON_VERTICES;
use crate::context::OverlayContext;
use crate::error::AttrError;
use crate::geometry::Point;
use crate::label;
use crate::model::{
    ArrowGeometry, CircleGeometry, EllipseGeometry, FlagGeometry, Geometry, Measurement,
    PolygonGeometry, RectangleGeometry, RulerGeometry, Shape, ShapeAttr, ShapeId, ShapeKind,
    Style,
};

/// Result of a polygon click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexOutcome {
    /// A vertex was appended.
    Added,
    /// The click repeated the last vertex and was dropped.
    Ignored,
    /// The click snapped to the first vertex and closed the polygon.
    Closed,
}

/// A shape under construction.
#[derive(Debug, Clone)]
pub struct ShapeDraft {
    shape: Shape,
    first: Point,
    /// Live pointer position for the polygon rubber-band segment.
    rubber_band: Option<Point>,
}

impl ShapeDraft {
    /// Start a new zero-size shape at the first pointer-down.
    pub fn create(id: ShapeId, kind: ShapeKind, first: Point, ctx: &OverlayContext) -> Self {
        let geometry = match kind {
            ShapeKind::Circle => Geometry::Circle(CircleGeometry {
                center: first,
                radius: 0.0,
            }),
            ShapeKind::Rectangle => Geometry::Rectangle(RectangleGeometry {
                x: first.x,
                y: first.y,
                width: 0.0,
                height: 0.0,
            }),
            ShapeKind::Ellipse => Geometry::Ellipse(EllipseGeometry {
                center: first,
                radius_x: 0.0,
                radius_y: 0.0,
            }),
            ShapeKind::Arrow => Geometry::Arrow(ArrowGeometry {
                start: first,
                end: first,
                marker_size: ctx.config.interaction.arrow_marker_size,
            }),
            ShapeKind::Polygon => Geometry::Polygon(PolygonGeometry {
                points: vec![first],
                closed: false,
            }),
            ShapeKind::Ruler => Geometry::Ruler(RulerGeometry {
                start: first,
                end: first,
            }),
            ShapeKind::Flag => Geometry::Flag(FlagGeometry { position: first }),
        };

        let defaults = &ctx.config.style;
        let mut measurement = Measurement {
            label_tag: ctx.config.label.tag_text.clone(),
            ..Measurement::default()
        };
        measurement.recompute(&geometry, ctx.pixel_size());

        log::debug!("Creating {} {} at ({:.1}, {:.1})", kind.name(), id, first.x, first.y);
        Self {
            shape: Shape {
                id,
                geometry,
                style: Style {
                    stroke: defaults.stroke_color.clone(),
                    stroke_width: ctx.stroke_width(),
                    visible: defaults.visible,
                },
                measurement,
            },
            first,
            rubber_band: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.shape.id
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// The shape as it currently looks.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Re-derive the frame-dependent stroke width and the measurement.
    pub fn refresh(&mut self, ctx: &OverlayContext) {
        self.shape.style.stroke_width = ctx.stroke_width();
        self.shape
            .measurement
            .recompute(&self.shape.geometry, ctx.pixel_size());
    }

    /// Rubber-band segment from the last committed vertex to the pointer.
    pub fn rubber_band(&self) -> Option<(Point, Point)> {
        let Geometry::Polygon(poly) = &self.shape.geometry else {
            return None;
        };
        Some((*poly.points.last()?, self.rubber_band?))
    }

    /// Committed polygon vertices, empty for other kinds.
    pub fn vertices(&self) -> &[Point] {
        match &self.shape.geometry {
            Geometry::Polygon(poly) => &poly.points,
            _ => &[],
        }
    }

    /// Recompute geometry from the first point and the current pointer.
    pub fn update_from_drag(&mut self, point: Point, ctx: &OverlayContext) {
        let first = self.first;
        let geometry = match &self.shape.geometry {
            Geometry::Circle(_) => Geometry::Circle(CircleGeometry {
                center: first.midpoint(&point),
                radius: first.distance_to(&point) / 2.0,
            }),
            // Signed while drawing; normalized on completion.
            Geometry::Rectangle(_) => Geometry::Rectangle(RectangleGeometry {
                x: first.x,
                y: first.y,
                width: point.x - first.x,
                height: point.y - first.y,
            }),
            Geometry::Ellipse(_) => {
                let (dx, dy) = (point.x - first.x, point.y - first.y);
                let (radius_x, radius_y) = (dx.abs() / 2.0, dy.abs() / 2.0);
                Geometry::Ellipse(EllipseGeometry {
                    center: first.offset(dx.signum() * radius_x, dy.signum() * radius_y),
                    radius_x,
                    radius_y,
                })
            }
            Geometry::Arrow(a) => Geometry::Arrow(ArrowGeometry { end: point, ..*a }),
            Geometry::Ruler(r) => Geometry::Ruler(RulerGeometry { end: point, ..*r }),
            Geometry::Polygon(_) => {
                self.rubber_band = Some(point);
                return;
            }
            Geometry::Flag(_) => return,
        };
        self.shape.set_geometry(geometry, ctx.pixel_size());
    }

    /// Whether a click at `point` would close the polygon.
    pub fn can_close(&self, point: Point, ctx: &OverlayContext) -> bool {
        let vertices = self.vertices();
        vertices.len() >= MIN_POLYGON_VERTICES
            && vertices[0].distance_to(&point) <= ctx.snap_distance()
    }

    /// Handle a polygon click: snap-close or append a vertex.
    pub fn add_vertex(&mut self, point: Point, ctx: &OverlayContext) -> VertexOutcome {
        if self.can_close(point, ctx) {
            self.close_polygon(ctx);
            return VertexOutcome::Closed;
        }
        let min_gap = ctx.min_draw_distance();
        let pixel_size = ctx.pixel_size();
        let Geometry::Polygon(poly) = &mut self.shape.geometry else {
            return VertexOutcome::Ignored;
        };
        if poly
            .points
            .last()
            .is_some_and(|last| last.distance_to(&point) < min_gap)
        {
            return VertexOutcome::Ignored;
        }
        poly.points.push(point);
        self.shape.measurement.recompute(&self.shape.geometry, pixel_size);
        log::trace!("Polygon {} vertex {} added", self.shape.id, self.vertices().len());
        VertexOutcome::Added
    }

    fn close_polygon(&mut self, ctx: &OverlayContext) {
        if let Geometry::Polygon(poly) = &mut self.shape.geometry {
            poly.closed = true;
        }
        self.rubber_band = None;
        self.shape
            .measurement
            .recompute(&self.shape.geometry, ctx.pixel_size());
    }

    /// Close the polygon without a snap click (double-click or Enter).
    ///
    /// A trailing vertex sitting on the first one is dropped first.
    pub fn finish_polygon(mut self, ctx: &OverlayContext) -> Option<Shape> {
        let snap = ctx.snap_distance();
        let Geometry::Polygon(poly) = &mut self.shape.geometry else {
            return None;
        };
        if !poly.closed {
            let n = poly.points.len();
            if n > MIN_POLYGON_VERTICES && poly.points[0].distance_to(&poly.points[n - 1]) <= snap {
                poly.points.pop();
            }
            if poly.points.len() < MIN_POLYGON_VERTICES {
                log::debug!("Polygon {} has too few vertices to close", self.shape.id);
                return None;
            }
            self.close_polygon(ctx);
        }
        Some(self.shape)
    }

    /// Finalize the shape at the release point.
    ///
    /// Returns `None` for gestures too small to form a shape.
    pub fn complete(mut self, point: Point, ctx: &OverlayContext) -> Option<Shape> {
        match self.kind() {
            ShapeKind::Polygon => return self.finish_polygon(ctx),
            ShapeKind::Flag => {}
            kind => {
                self.update_from_drag(point, ctx);
                if self.first.distance_to(&point) < ctx.min_draw_distance() {
                    log::debug!("Discarding {} {}: gesture too small", kind.name(), self.shape.id);
                    return None;
                }
                let degenerate = match &self.shape.geometry {
                    Geometry::Rectangle(r) => r.width == 0.0 || r.height == 0.0,
                    Geometry::Ellipse(e) => e.radius_x == 0.0 || e.radius_y == 0.0,
                    _ => false,
                };
                if degenerate {
                    log::debug!("Discarding {} {}: zero extent", kind.name(), self.shape.id);
                    return None;
                }
            }
        }

        if let Geometry::Rectangle(r) = &self.shape.geometry {
            let normalized = Geometry::Rectangle(r.normalized());
            self.shape.set_geometry(normalized, ctx.pixel_size());
        }
        Some(self.shape)
    }

    /// Measurement text of the shape as currently drawn.
    pub fn measurement_text(&self, ctx: &OverlayContext) -> Vec<String> {
        measurement_text(&self.shape, ctx)
    }
}

/// Label lines for a shape: tag, measurements, description.
pub fn measurement_text(shape: &Shape, ctx: &OverlayContext) -> Vec<String> {
    label::label_lines(&shape.measurement, &ctx.config.label)
}

/// Rebuild a live shape from persisted attrs, skipping the draw gesture.
///
/// Tag and description are taken from the attrs; numeric measurements are
/// recomputed from geometry at the current pixel size.
pub fn reconstruct(attr: ShapeAttr, ctx: &OverlayContext) -> Result<Shape, AttrError> {
    attr.validate(0)?;
    let mut shape = Shape::from(attr);
    shape
        .measurement
        .recompute(&shape.geometry, ctx.pixel_size());
    Ok(shape)
}
