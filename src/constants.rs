//! Default values for the overlay.
//!
//! Sizes are in screen pixels unless stated otherwise. They are converted to
//! world units by dividing by the current zoom scale.

/// Default shape stroke width.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// Default shape stroke color.
pub const DEFAULT_STROKE_COLOR: &str = "#00c853";

/// Radius of an anchor handle.
pub const ANCHOR_SIZE: f64 = 6.0;

/// Stroke width of an anchor handle outline.
pub const ANCHOR_STROKE_WIDTH: f64 = 1.0;

/// Distance to the first polygon vertex within which a click closes the polygon.
pub const SNAP_DISTANCE: f64 = 10.0;

/// Extra reach around strokes when hit-testing shapes.
pub const HIT_TOLERANCE: f64 = 6.0;

/// Pointer travel below which a press counts as a click rather than a drag.
pub const MIN_DRAW_DISTANCE: f64 = 3.0;

/// Smallest extent a resize handle can shrink a box-like shape to.
pub const MIN_SHAPE_SIZE: f64 = 1.0;

/// Length of the arrowhead beyond the segment end.
pub const ARROW_MARKER_SIZE: f64 = 10.0;

/// Full length of each ruler end-cap.
pub const RULER_CAP_LENGTH: f64 = 12.0;

/// Radius of the flag marker.
pub const FLAG_RADIUS: f64 = 8.0;

/// Minimum number of vertices for a closed polygon.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Label font size.
pub const FONT_SIZE: f64 = 14.0;

/// Padding between label text and its background.
pub const LABEL_PADDING: f64 = 4.0;

/// Gap between a shape and its label.
pub const LABEL_OFFSET: f64 = 8.0;

/// Physical size of one world unit, in micrometres.
pub const DEFAULT_PIXEL_SIZE: f64 = 1.0;

/// Undo history length.
pub const MAX_UNDO_HISTORY: usize = 100;
