//! Shape kinds, geometry and the live shape model.

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Point};
use crate::measure;

/// Opaque, stable identifier of a shape.
pub type ShapeId = String;

/// The seven drawable shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    Circle,
    Rectangle,
    Ellipse,
    Arrow,
    Polygon,
    Ruler,
    Flag,
}

impl ShapeKind {
    /// Get the display name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Circle => "Circle",
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Ellipse => "Ellipse",
            ShapeKind::Arrow => "Arrow",
            ShapeKind::Polygon => "Polygon",
            ShapeKind::Ruler => "Ruler",
            ShapeKind::Flag => "Flag",
        }
    }

    pub fn all() -> &'static [ShapeKind] {
        &[
            ShapeKind::Circle,
            ShapeKind::Rectangle,
            ShapeKind::Ellipse,
            ShapeKind::Arrow,
            ShapeKind::Polygon,
            ShapeKind::Ruler,
            ShapeKind::Flag,
        ]
    }

    /// Kinds resized through fixed named handles.
    pub fn is_box_like(&self) -> bool {
        matches!(
            self,
            ShapeKind::Circle | ShapeKind::Rectangle | ShapeKind::Ellipse
        )
    }

    /// Kinds drawn as a single segment.
    pub fn is_line_like(&self) -> bool {
        matches!(self, ShapeKind::Arrow | ShapeKind::Ruler)
    }
}

/// What the next pointer-down on empty space does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawMode {
    /// Select and move existing shapes; empty space navigates the viewport.
    #[default]
    Move,
    /// Draw a new shape of this kind.
    Draw(ShapeKind),
}

impl DrawMode {
    /// The armed draw kind, if any.
    pub fn armed_kind(&self) -> Option<ShapeKind> {
        match self {
            DrawMode::Move => None,
            DrawMode::Draw(kind) => Some(*kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CircleGeometry {
    pub center: Point,
    pub radius: f64,
}

/// Rectangle from its origin corner. Width and height are only signed while
/// the initial draw gesture is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RectangleGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectangleGeometry {
    pub fn bounds(&self) -> Bounds {
        Bounds::from_corners(
            Point::new(self.x, self.y),
            Point::new(self.x + self.width, self.y + self.height),
        )
    }

    /// Same rectangle with non-negative width and height.
    pub fn normalized(&self) -> Self {
        Self::from_bounds(self.bounds())
    }

    pub fn from_bounds(bounds: Bounds) -> Self {
        Self {
            x: bounds.min.x,
            y: bounds.min.y,
            width: bounds.width(),
            height: bounds.height(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EllipseGeometry {
    pub center: Point,
    pub radius_x: f64,
    pub radius_y: f64,
}

impl EllipseGeometry {
    pub fn bounds(&self) -> Bounds {
        Bounds::from_corners(
            self.center.offset(-self.radius_x, -self.radius_y),
            self.center.offset(self.radius_x, self.radius_y),
        )
    }
}

/// Arrow segment. `marker_size` is the on-screen arrowhead length in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ArrowGeometry {
    pub start: Point,
    pub end: Point,
    pub marker_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PolygonGeometry {
    pub points: Vec<Point>,
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RulerGeometry {
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FlagGeometry {
    pub position: Point,
}

/// Kind-specific geometry, always in world space.
///
/// Serialized adjacently tagged so the persisted form reads
/// `"kind": "...", "geometry": {...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "geometry", rename_all = "camelCase")]
pub enum Geometry {
    Circle(CircleGeometry),
    Rectangle(RectangleGeometry),
    Ellipse(EllipseGeometry),
    Arrow(ArrowGeometry),
    Polygon(PolygonGeometry),
    Ruler(RulerGeometry),
    Flag(FlagGeometry),
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Circle(_) => ShapeKind::Circle,
            Geometry::Rectangle(_) => ShapeKind::Rectangle,
            Geometry::Ellipse(_) => ShapeKind::Ellipse,
            Geometry::Arrow(_) => ShapeKind::Arrow,
            Geometry::Polygon(_) => ShapeKind::Polygon,
            Geometry::Ruler(_) => ShapeKind::Ruler,
            Geometry::Flag(_) => ShapeKind::Flag,
        }
    }

    /// Axis-aligned bounds, `None` for an empty polygon.
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Geometry::Circle(c) => Some(Bounds::from_corners(
                c.center.offset(-c.radius, -c.radius),
                c.center.offset(c.radius, c.radius),
            )),
            Geometry::Rectangle(r) => Some(r.bounds()),
            Geometry::Ellipse(e) => Some(e.bounds()),
            Geometry::Arrow(a) => Some(Bounds::from_corners(a.start, a.end)),
            Geometry::Polygon(p) => Bounds::from_points(&p.points),
            Geometry::Ruler(r) => Some(Bounds::from_corners(r.start, r.end)),
            Geometry::Flag(f) => Some(Bounds::from_corners(f.position, f.position)),
        }
    }

    /// Copy shifted by `delta`.
    pub fn translated(&self, delta: Point) -> Geometry {
        let mut moved = self.clone();
        match &mut moved {
            Geometry::Circle(c) => c.center = c.center + delta,
            Geometry::Rectangle(r) => {
                r.x += delta.x;
                r.y += delta.y;
            }
            Geometry::Ellipse(e) => e.center = e.center + delta,
            Geometry::Arrow(a) => {
                a.start = a.start + delta;
                a.end = a.end + delta;
            }
            Geometry::Polygon(p) => {
                for point in &mut p.points {
                    *point = *point + delta;
                }
            }
            Geometry::Ruler(r) => {
                r.start = r.start + delta;
                r.end = r.end + delta;
            }
            Geometry::Flag(f) => f.position = f.position + delta,
        }
        moved
    }

    /// Every scalar in the geometry, labelled, for finiteness checks.
    pub(crate) fn scalars(&self) -> Vec<(&'static str, f64)> {
        fn point(name: &'static str, p: &Point, out: &mut Vec<(&'static str, f64)>) {
            out.push((name, p.x));
            out.push((name, p.y));
        }
        let mut out = Vec::new();
        match self {
            Geometry::Circle(c) => {
                point("center", &c.center, &mut out);
                out.push(("radius", c.radius));
            }
            Geometry::Rectangle(r) => {
                out.extend([
                    ("x", r.x),
                    ("y", r.y),
                    ("width", r.width),
                    ("height", r.height),
                ]);
            }
            Geometry::Ellipse(e) => {
                point("center", &e.center, &mut out);
                out.push(("radiusX", e.radius_x));
                out.push(("radiusY", e.radius_y));
            }
            Geometry::Arrow(a) => {
                point("start", &a.start, &mut out);
                point("end", &a.end, &mut out);
                out.push(("markerSize", a.marker_size));
            }
            Geometry::Polygon(p) => {
                for v in &p.points {
                    point("points", v, &mut out);
                }
            }
            Geometry::Ruler(r) => {
                point("start", &r.start, &mut out);
                point("end", &r.end, &mut out);
            }
            Geometry::Flag(f) => point("position", &f.position, &mut out),
        }
        out
    }
}

fn default_visible() -> bool {
    true
}

/// Stroke appearance. `stroke_width` is in world units and is re-derived
/// from the configured screen width on every frame change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Style {
    pub stroke: String,
    pub stroke_width: f64,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

/// Real-world measurement cache plus the user-facing label fields.
///
/// Numeric fields are in micrometres (areas in μm²) and only the fields
/// relevant to the shape kind are set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Measurement {
    #[serde(default)]
    pub label_tag: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_radius_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_radius_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_circumference: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_perimeter: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_area: Option<f64>,
}

impl Measurement {
    /// Recompute the numeric fields from geometry, keeping tag and description.
    pub fn recompute(&mut self, geometry: &Geometry, pixel_size: f64) {
        let len = |v: f64| Some(measure::to_physical_length(v, pixel_size));
        let area = |v: f64| Some(measure::to_physical_area(v, pixel_size));

        let (label_tag, description) = (
            std::mem::take(&mut self.label_tag),
            std::mem::take(&mut self.description),
        );
        *self = Measurement {
            label_tag,
            description,
            ..Measurement::default()
        };

        match geometry {
            Geometry::Circle(c) => {
                self.real_radius = len(c.radius);
                self.real_circumference = len(measure::circle_circumference(c.radius));
                self.real_area = area(measure::circle_area(c.radius));
            }
            Geometry::Rectangle(r) => {
                self.real_width = len(r.width.abs());
                self.real_height = len(r.height.abs());
                self.real_perimeter = len(measure::rectangle_perimeter(r.width, r.height));
                self.real_area = area(measure::rectangle_area(r.width, r.height));
            }
            Geometry::Ellipse(e) => {
                self.real_radius_x = len(e.radius_x);
                self.real_radius_y = len(e.radius_y);
                self.real_perimeter = len(measure::ellipse_perimeter(e.radius_x, e.radius_y));
                self.real_area = area(measure::ellipse_area(e.radius_x, e.radius_y));
            }
            Geometry::Polygon(p) => {
                self.real_perimeter = len(measure::polygon_perimeter(&p.points));
                self.real_area = area(measure::polygon_area(&p.points));
            }
            Geometry::Arrow(a) => self.real_length = len(measure::segment_length(a.start, a.end)),
            Geometry::Ruler(r) => self.real_length = len(measure::segment_length(r.start, r.end)),
            Geometry::Flag(_) => {}
        }
    }

    /// The real-world fields under their persisted names.
    pub(crate) fn numeric_fields(&self) -> [(&'static str, Option<f64>); 9] {
        [
            ("realRadius", self.real_radius),
            ("realRadiusX", self.real_radius_x),
            ("realRadiusY", self.real_radius_y),
            ("realWidth", self.real_width),
            ("realHeight", self.real_height),
            ("realLength", self.real_length),
            ("realCircumference", self.real_circumference),
            ("realPerimeter", self.real_perimeter),
            ("realArea", self.real_area),
        ]
    }

    /// Formatted measurement lines in a fixed order. Unset fields are skipped.
    pub fn lines(&self) -> Vec<String> {
        let lengths = [
            ("Radius", self.real_radius),
            ("Radius X", self.real_radius_x),
            ("Radius Y", self.real_radius_y),
            ("Width", self.real_width),
            ("Height", self.real_height),
            ("Length", self.real_length),
            ("Circumference", self.real_circumference),
            ("Perimeter", self.real_perimeter),
        ];
        let mut lines: Vec<String> = lengths
            .iter()
            .filter_map(|(name, value)| value.map(|v| format!("{name}: {}", measure::format_length(v))))
            .collect();
        if let Some(area) = self.real_area {
            lines.push(format!("Area: {}", measure::format_area(area)));
        }
        lines
    }
}

/// A live shape owned by the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: ShapeId,
    pub geometry: Geometry,
    pub style: Style,
    pub measurement: Measurement,
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    /// Replace the geometry and refresh the measurement cache.
    pub fn set_geometry(&mut self, geometry: Geometry, pixel_size: f64) {
        self.geometry = geometry;
        self.measurement.recompute(&self.geometry, pixel_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::approx_eq;

    #[test]
    fn test_rectangle_normalizes_negative_extent() {
        let r = RectangleGeometry {
            x: 100.0,
            y: 50.0,
            width: -100.0,
            height: -50.0,
        };
        let n = r.normalized();
        assert_eq!((n.x, n.y, n.width, n.height), (0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn test_rectangle_measurement() {
        let geometry = Geometry::Rectangle(RectangleGeometry {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 50.0,
        });
        let mut m = Measurement::default();
        m.recompute(&geometry, 1.0);
        assert_eq!(m.real_width, Some(100.0));
        assert_eq!(m.real_height, Some(50.0));
        assert_eq!(m.real_area, Some(5000.0));
        assert_eq!(m.real_perimeter, Some(300.0));
        assert!(m.real_radius.is_none());
        assert_eq!(
            m.lines(),
            vec![
                "Width: 100.00 μm",
                "Height: 50.00 μm",
                "Perimeter: 300.00 μm",
                "Area: 5000.00 μm²",
            ]
        );
    }

    #[test]
    fn test_recompute_keeps_tag_and_description() {
        let mut m = Measurement {
            label_tag: "tumor".into(),
            description: "margin".into(),
            real_width: Some(1.0),
            ..Measurement::default()
        };
        let geometry = Geometry::Circle(CircleGeometry {
            center: Point::ZERO,
            radius: 2.0,
        });
        m.recompute(&geometry, 0.5);
        assert_eq!(m.label_tag, "tumor");
        assert_eq!(m.description, "margin");
        assert!(m.real_width.is_none());
        assert!(approx_eq(m.real_radius.unwrap(), 1.0));
        assert!(approx_eq(m.real_area.unwrap(), std::f64::consts::PI));
    }

    #[test]
    fn test_flag_has_no_measurement_lines() {
        let mut m = Measurement::default();
        m.recompute(
            &Geometry::Flag(FlagGeometry {
                position: Point::new(1.0, 2.0),
            }),
            1.0,
        );
        assert!(m.lines().is_empty());
    }

    #[test]
    fn test_translate_polygon() {
        let g = Geometry::Polygon(PolygonGeometry {
            points: vec![Point::ZERO, Point::new(1.0, 0.0), Point::new(1.0, 1.0)],
            closed: true,
        });
        let Geometry::Polygon(moved) = g.translated(Point::new(5.0, -5.0)) else {
            panic!("Expected polygon");
        };
        assert_eq!(moved.points[2], Point::new(6.0, -4.0));
        assert!(moved.closed);
    }

    #[test]
    fn test_geometry_serializes_adjacently_tagged() {
        let g = Geometry::Ruler(RulerGeometry {
            start: Point::ZERO,
            end: Point::new(3.0, 4.0),
        });
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["kind"], "ruler");
        assert_eq!(json["geometry"]["end"]["x"], 3.0);
    }
}
