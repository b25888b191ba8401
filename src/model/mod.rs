//! Data models for the overlay.

mod attr;
mod shape;

pub use attr::{ShapeAttr, parse_attrs, validate_attrs};
pub use shape::{
    ArrowGeometry, CircleGeometry, DrawMode, EllipseGeometry, FlagGeometry, Geometry,
    Measurement, PolygonGeometry, RectangleGeometry, RulerGeometry, Shape, ShapeId, ShapeKind,
    Style,
};
