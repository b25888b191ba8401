//! Measurement library: real-world sizes from world-space geometry.
//!
//! All physical values are expressed in micrometres (the base unit) until
//! they are formatted. Formatting picks the largest unit whose threshold the
//! value reaches:
//! - lengths: `< 1e3` μm, `>= 1e3` mm, `>= 1e4` cm
//! - areas:   `< 1e6` μm², `>= 1e6` mm², `>= 1e8` cm²
//!
//! Areas are never converted with the linear thresholds directly. The side
//! length (`sqrt(area)`) goes through the length ladder and the converted
//! side is squared again, which is what keeps the thresholds at 1e6 and 1e8.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{self, Point};

/// Length at which values are shown in millimetres.
pub const MILLIMETER_THRESHOLD: f64 = 1_000.0;

/// Length at which values are shown in centimetres.
pub const CENTIMETER_THRESHOLD: f64 = 10_000.0;

/// Display units, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Micrometer,
    Millimeter,
    Centimeter,
}

impl LengthUnit {
    /// How many base units (μm) one of this unit holds.
    fn divisor(&self) -> f64 {
        match self {
            LengthUnit::Micrometer => 1.0,
            LengthUnit::Millimeter => MILLIMETER_THRESHOLD,
            LengthUnit::Centimeter => CENTIMETER_THRESHOLD,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            LengthUnit::Micrometer => "μm",
            LengthUnit::Millimeter => "mm",
            LengthUnit::Centimeter => "cm",
        }
    }

    pub fn area_symbol(&self) -> &'static str {
        match self {
            LengthUnit::Micrometer => "μm²",
            LengthUnit::Millimeter => "mm²",
            LengthUnit::Centimeter => "cm²",
        }
    }
}

/// A value converted into a display unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: LengthUnit,
    /// Whether this is an area (unit squared).
    pub squared: bool,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = if self.squared {
            self.unit.area_symbol()
        } else {
            self.unit.symbol()
        };
        write!(f, "{:.2} {}", self.value, symbol)
    }
}

/// Pick the display unit for a length given in μm.
pub fn convert_to_appropriate_unit(length: f64) -> Quantity {
    let unit = if length.abs() >= CENTIMETER_THRESHOLD {
        LengthUnit::Centimeter
    } else if length.abs() >= MILLIMETER_THRESHOLD {
        LengthUnit::Millimeter
    } else {
        LengthUnit::Micrometer
    };
    Quantity {
        value: length / unit.divisor(),
        unit,
        squared: false,
    }
}

/// Pick the display unit for an area given in μm².
pub fn convert_area_to_appropriate_unit(area: f64) -> Quantity {
    let side = convert_to_appropriate_unit(area.abs().sqrt());
    Quantity {
        value: side.value * side.value,
        unit: side.unit,
        squared: true,
    }
}

/// World-space length to physical length.
pub fn to_physical_length(world_length: f64, pixel_size: f64) -> f64 {
    world_length * pixel_size
}

/// World-space area to physical area.
pub fn to_physical_area(world_area: f64, pixel_size: f64) -> f64 {
    world_area * pixel_size * pixel_size
}

pub fn circle_circumference(radius: f64) -> f64 {
    2.0 * PI * radius
}

pub fn circle_area(radius: f64) -> f64 {
    PI * radius * radius
}

pub fn rectangle_perimeter(width: f64, height: f64) -> f64 {
    2.0 * (width.abs() + height.abs())
}

pub fn rectangle_area(width: f64, height: f64) -> f64 {
    (width * height).abs()
}

/// Ellipse perimeter approximated as `2π·sqrt((rx² + ry²) / 2)`.
pub fn ellipse_perimeter(radius_x: f64, radius_y: f64) -> f64 {
    2.0 * PI * ((radius_x * radius_x + radius_y * radius_y) / 2.0).sqrt()
}

pub fn ellipse_area(radius_x: f64, radius_y: f64) -> f64 {
    PI * radius_x * radius_y
}

/// Closed-loop perimeter of a polygon.
pub fn polygon_perimeter(points: &[Point]) -> f64 {
    geometry::polyline_length(points, true)
}

/// Shoelace area of a polygon.
pub fn polygon_area(points: &[Point]) -> f64 {
    geometry::polygon_area(points)
}

pub fn segment_length(start: Point, end: Point) -> f64 {
    geometry::distance(start, end)
}

/// Format a physical length (μm) with its display unit.
pub fn format_length(length: f64) -> String {
    convert_to_appropriate_unit(length).to_string()
}

/// Format a physical area (μm²) with its display unit.
pub fn format_area(area: f64) -> String {
    convert_area_to_appropriate_unit(area).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::approx_eq;

    #[test]
    fn test_length_thresholds() {
        let q = convert_to_appropriate_unit(999.0);
        assert_eq!(q.unit, LengthUnit::Micrometer);
        assert!(approx_eq(q.value, 999.0));

        let q = convert_to_appropriate_unit(1000.0);
        assert_eq!(q.unit, LengthUnit::Millimeter);
        assert!(approx_eq(q.value, 1.0));

        let q = convert_to_appropriate_unit(9999.0);
        assert_eq!(q.unit, LengthUnit::Millimeter);

        let q = convert_to_appropriate_unit(10000.0);
        assert_eq!(q.unit, LengthUnit::Centimeter);
        assert!(approx_eq(q.value, 1.0));
    }

    #[test]
    fn test_area_thresholds() {
        let q = convert_area_to_appropriate_unit(999_999.0);
        assert_eq!(q.unit, LengthUnit::Micrometer);

        let q = convert_area_to_appropriate_unit(1e6);
        assert_eq!(q.unit, LengthUnit::Millimeter);
        assert!(approx_eq(q.value, 1.0));

        let q = convert_area_to_appropriate_unit(1e8);
        assert_eq!(q.unit, LengthUnit::Centimeter);
        assert!(approx_eq(q.value, 1.0));
    }

    #[test]
    fn test_area_converts_through_side_length() {
        // 4 mm² must not become 4000 via the linear 1e3 divisor
        let q = convert_area_to_appropriate_unit(4e6);
        assert_eq!(q.unit, LengthUnit::Millimeter);
        assert!(approx_eq(q.value, 4.0));
        assert_eq!(q.to_string(), "4.00 mm²");
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_length(100.0), "100.00 μm");
        assert_eq!(format_length(2500.0), "2.50 mm");
        assert_eq!(format_length(12345.0), "1.23 cm");
        assert_eq!(format_area(5000.0), "5000.00 μm²");
    }

    #[test]
    fn test_shape_formulas() {
        assert!(approx_eq(circle_circumference(1.0), 2.0 * PI));
        assert!(approx_eq(circle_area(2.0), 4.0 * PI));
        assert!(approx_eq(rectangle_perimeter(100.0, 50.0), 300.0));
        assert!(approx_eq(rectangle_area(100.0, 50.0), 5000.0));
        // A circle is the degenerate ellipse
        assert!(approx_eq(ellipse_perimeter(3.0, 3.0), circle_circumference(3.0)));
        assert!(approx_eq(ellipse_area(3.0, 2.0), 6.0 * PI));
    }

    #[test]
    fn test_physical_scaling() {
        assert!(approx_eq(to_physical_length(10.0, 0.25), 2.5));
        assert!(approx_eq(to_physical_area(100.0, 0.5), 25.0));
    }
}
