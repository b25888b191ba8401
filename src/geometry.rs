//! Core geometry types and pure helpers.
//!
//! Everything here works in world space (image pixel coordinates). Nothing
//! in this module knows about the viewport.

use serde::{Deserialize, Serialize};

/// A 2D point in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        distance(*self, *other)
    }

    /// Squared distance, for radius tests without a square root.
    pub fn distance_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction, or `None` for the zero vector.
    pub fn normalized(&self) -> Option<Point> {
        let len = self.length();
        if len > f64::EPSILON {
            Some(Point::new(self.x / len, self.y / len))
        } else {
            None
        }
    }

    /// Vector rotated by +90 degrees.
    pub fn perpendicular(&self) -> Point {
        Point::new(-self.y, self.x)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// A width/height pair, used for container sizes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned box with non-negative extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Create bounds from two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Smallest bounds containing every point, `None` if there are none.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = *points.first()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for p in &points[1..] {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        self.min.midpoint(&self.max)
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Arithmetic mean of the points, `None` for an empty slice.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let sum = points.iter().fold(Point::ZERO, |acc, p| acc + *p);
    Some(Point::new(sum.x / n, sum.y / n))
}

/// Polygon area via the shoelace formula. Always non-negative.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        twice_area += a.x * b.y - b.x * a.y;
    }
    (twice_area / 2.0).abs()
}

/// Sum of consecutive vertex distances, including the closing edge when `closed`.
pub fn polyline_length(points: &[Point], closed: bool) -> f64 {
    let open: f64 = points.windows(2).map(|w| distance(w[0], w[1])).sum();
    match (closed, points.first(), points.last()) {
        (true, Some(first), Some(last)) if points.len() > 2 => open + distance(*last, *first),
        _ => open,
    }
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq <= f64::EPSILON {
        return distance(p, a);
    }
    let ap = p - a;
    let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
    distance(p, a + ab * t)
}

/// Point-in-polygon test using ray casting.
pub fn polygon_contains(points: &[Point], p: &Point) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let vi = points[i];
        let vj = points[j];
        if ((vi.y > p.y) != (vj.y > p.y))
            && (p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]
    }

    #[test]
    fn test_point_distance() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert!(approx_eq(p1.distance_to(&p2), 5.0));
        assert!(approx_eq(p1.distance_sq(&p2), 25.0));
    }

    #[test]
    fn test_shoelace_is_orientation_independent() {
        let mut pts = square();
        assert!(approx_eq(polygon_area(&pts), 100.0));
        pts.reverse();
        assert!(approx_eq(polygon_area(&pts), 100.0));
    }

    #[test]
    fn test_degenerate_polygon_has_no_area() {
        assert_eq!(polygon_area(&[]), 0.0);
        assert_eq!(polygon_area(&[Point::ZERO, Point::new(1.0, 1.0)]), 0.0);
    }

    #[test]
    fn test_perimeter_closes_loop() {
        assert!(approx_eq(polyline_length(&square(), true), 40.0));
        assert!(approx_eq(polyline_length(&square(), false), 30.0));
    }

    #[test]
    fn test_centroid() {
        let c = centroid(&square()).unwrap();
        assert!(approx_eq(c.x, 5.0));
        assert!(approx_eq(c.y, 5.0));
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn test_segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!(approx_eq(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0));
        assert!(approx_eq(distance_to_segment(Point::new(-4.0, 3.0), a, b), 5.0));
        // Zero-length segment degrades to point distance
        assert!(approx_eq(distance_to_segment(Point::new(3.0, 4.0), a, a), 5.0));
    }

    #[test]
    fn test_polygon_contains() {
        let pts = square();
        assert!(polygon_contains(&pts, &Point::new(5.0, 5.0)));
        assert!(!polygon_contains(&pts, &Point::new(15.0, 5.0)));
    }

    #[test]
    fn test_bounds_from_reversed_corners() {
        let b = Bounds::from_corners(Point::new(50.0, 80.0), Point::new(10.0, 20.0));
        assert_eq!(b.min, Point::new(10.0, 20.0));
        assert!(approx_eq(b.width(), 40.0));
        assert!(approx_eq(b.height(), 60.0));
    }

    #[test]
    fn test_normalized_zero_vector() {
        assert!(Point::ZERO.normalized().is_none());
        let n = Point::new(3.0, 4.0).normalized().unwrap();
        assert!(approx_eq(n.length(), 1.0));
    }
}
