//! Persisted shape attributes.
//!
//! This is the only durable format. Anchors and in-progress gestures are
//! never serialized. A persisted shape reads:
//!
//! ```json
//! { "id": "shape-1", "kind": "rectangle",
//!   "geometry": { "x": 0.0, "y": 0.0, "width": 100.0, "height": 50.0 },
//!   "style": { "stroke": "#00c853", "strokeWidth": 2.0, "visible": true },
//!   "measurement": { "labelTag": "", "description": "", "realWidth": 100.0 } }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::shape::{Geometry, Measurement, Shape, ShapeKind, Style};
use crate::constants::MIN_POLYGON_VERTICES;
use crate::error::AttrError;

/// One persisted shape.
///
/// Reading goes through a kind-typed wire form so unknown keys are rejected
/// at every level, including next to `kind` and `geometry`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawShapeAttr")]
pub struct ShapeAttr {
    pub id: String,
    #[serde(flatten)]
    pub geometry: Geometry,
    pub style: Style,
    #[serde(default)]
    pub measurement: Measurement,
}

/// Wire form of a [`ShapeAttr`] before the geometry is typed by its kind.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawShapeAttr {
    id: String,
    kind: ShapeKind,
    geometry: serde_json::Value,
    style: Style,
    #[serde(default)]
    measurement: Measurement,
}

impl TryFrom<RawShapeAttr> for ShapeAttr {
    type Error = serde_json::Error;

    fn try_from(raw: RawShapeAttr) -> Result<Self, Self::Error> {
        let g = raw.geometry;
        let geometry = match raw.kind {
            ShapeKind::Circle => Geometry::Circle(serde_json::from_value(g)?),
            ShapeKind::Rectangle => Geometry::Rectangle(serde_json::from_value(g)?),
            ShapeKind::Ellipse => Geometry::Ellipse(serde_json::from_value(g)?),
            ShapeKind::Arrow => Geometry::Arrow(serde_json::from_value(g)?),
            ShapeKind::Polygon => Geometry::Polygon(serde_json::from_value(g)?),
            ShapeKind::Ruler => Geometry::Ruler(serde_json::from_value(g)?),
            ShapeKind::Flag => Geometry::Flag(serde_json::from_value(g)?),
        };
        Ok(Self {
            id: raw.id,
            geometry,
            style: raw.style,
            measurement: raw.measurement,
        })
    }
}

impl From<&Shape> for ShapeAttr {
    fn from(shape: &Shape) -> Self {
        Self {
            id: shape.id.clone(),
            geometry: shape.geometry.clone(),
            style: shape.style.clone(),
            measurement: shape.measurement.clone(),
        }
    }
}

impl From<ShapeAttr> for Shape {
    fn from(attr: ShapeAttr) -> Self {
        Self {
            id: attr.id,
            geometry: attr.geometry,
            style: attr.style,
            measurement: attr.measurement,
        }
    }
}

impl ShapeAttr {
    /// Check that the attr describes a usable shape of its kind.
    pub fn validate(&self, index: usize) -> Result<(), AttrError> {
        if self.id.trim().is_empty() {
            return Err(AttrError::EmptyId { index });
        }

        let scalars = self
            .geometry
            .scalars()
            .into_iter()
            .chain([("strokeWidth", self.style.stroke_width)]);
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(AttrError::NonFinite {
                    id: self.id.clone(),
                    field: field.to_string(),
                });
            }
        }

        // Real-world fields must be ones this kind actually measures
        let mut expected = Measurement::default();
        expected.recompute(&self.geometry, 1.0);
        let foreign = self
            .measurement
            .numeric_fields()
            .into_iter()
            .zip(expected.numeric_fields())
            .find(|((_, value), (_, allowed))| value.is_some() && allowed.is_none());
        if let Some(((field, _), _)) = foreign {
            return Err(AttrError::UnexpectedField {
                id: self.id.clone(),
                field: field.to_string(),
            });
        }

        if self.style.stroke_width < 0.0 {
            return Err(AttrError::invalid_geometry(&self.id, "negative stroke width"));
        }

        match &self.geometry {
            Geometry::Circle(c) if c.radius <= 0.0 => {
                Err(AttrError::invalid_geometry(&self.id, "radius must be positive"))
            }
            Geometry::Rectangle(r) if r.width <= 0.0 || r.height <= 0.0 => Err(
                AttrError::invalid_geometry(&self.id, "width and height must be positive"),
            ),
            Geometry::Ellipse(e) if e.radius_x <= 0.0 || e.radius_y <= 0.0 => Err(
                AttrError::invalid_geometry(&self.id, "radii must be positive"),
            ),
            Geometry::Arrow(a) if a.marker_size < 0.0 => Err(AttrError::invalid_geometry(
                &self.id,
                "negative marker size",
            )),
            Geometry::Polygon(p) if p.points.len() < MIN_POLYGON_VERTICES => {
                Err(AttrError::invalid_geometry(
                    &self.id,
                    format!(
                        "polygon needs at least {MIN_POLYGON_VERTICES} points, got {}",
                        p.points.len()
                    ),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Validate a whole batch, including id uniqueness.
pub fn validate_attrs(attrs: &[ShapeAttr]) -> Result<(), AttrError> {
    let mut seen = HashSet::new();
    for (index, attr) in attrs.iter().enumerate() {
        attr.validate(index)?;
        if !seen.insert(attr.id.as_str()) {
            return Err(AttrError::DuplicateId {
                id: attr.id.clone(),
            });
        }
    }
    Ok(())
}

/// Parse a JSON array of attrs and validate it.
pub fn parse_attrs(json: &str) -> Result<Vec<ShapeAttr>, AttrError> {
    let attrs: Vec<ShapeAttr> = serde_json::from_str(json)?;
    validate_attrs(&attrs)?;
    Ok(attrs)
}
