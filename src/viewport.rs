//! Viewport synchronization.
//!
//! The host owns the deep-zoom viewport. The overlay only reads it through
//! [`ViewportHost`] and condenses each read into a [`ViewportFrame`]. The only
//! mutation the overlay ever performs is toggling the host's own navigation
//! input while a shape gesture owns the pointer.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Size};

/// Smallest zoom scale used for inverse-scale compensation.
pub const MIN_ZOOM_SCALE: f64 = 1e-6;

/// Read-only view of the host viewport, plus the navigation toggle.
pub trait ViewportHost {
    /// Whether an image is loaded. Nothing else is queried when this is false.
    fn is_open(&self) -> bool;

    /// Zoom in the viewport's own (container-relative) units.
    fn zoom(&self) -> f64;

    /// Convert a viewport-relative zoom into image-pixel zoom (screen px per world px).
    fn viewport_to_image_zoom(&self, viewport_zoom: f64) -> f64;

    /// Rotation in degrees.
    fn rotation(&self) -> f64;

    /// Whether the viewport is mirrored horizontally.
    fn flip(&self) -> bool;

    fn pixel_from_world_point(&self, point: Point) -> Point;

    fn world_point_from_pixel(&self, pixel: Point) -> Point;

    fn container_size(&self) -> Size;

    /// Enable or disable the viewport's own pan/zoom input.
    fn set_navigation_enabled(&mut self, enabled: bool);
}

/// Horizontal and vertical scale of the overlay root.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

/// Snapshot of the viewport transform the overlay is locked to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportFrame {
    pub scale: Scale,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Screen position of the world origin.
    pub position: Point,
    pub flip: bool,
    pub container_size: Size,
}

impl ViewportFrame {
    /// The neutral frame used before any image is open.
    pub fn identity() -> Self {
        Self {
            scale: Scale { x: 1.0, y: 1.0 },
            rotation: 0.0,
            position: Point::ZERO,
            flip: false,
            container_size: Size::default(),
        }
    }

    /// Screen pixels per world unit.
    pub fn zoom_scale(&self) -> f64 {
        self.scale.x.abs().max(MIN_ZOOM_SCALE)
    }

    /// World-space length of something that must measure `screen_px` on screen.
    pub fn world_length(&self, screen_px: f64) -> f64 {
        screen_px / self.zoom_scale()
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        let mut v = Point::new(p.x * self.scale.x, p.y * self.scale.y);
        if self.flip {
            v.x = -v.x;
        }
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        Point::new(
            v.x * cos - v.y * sin + self.position.x,
            v.x * sin + v.y * cos + self.position.y,
        )
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        let d = p - self.position;
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let mut v = Point::new(d.x * cos + d.y * sin, -d.x * sin + d.y * cos);
        if self.flip {
            v.x = -v.x;
        }
        Point::new(v.x / self.scale.x, v.y / self.scale.y)
    }

    fn is_finite(&self) -> bool {
        self.scale.x.is_finite()
            && self.scale.y.is_finite()
            && self.scale.x != 0.0
            && self.rotation.is_finite()
            && self.position.is_finite()
    }
}

impl Default for ViewportFrame {
    fn default() -> Self {
        Self::identity()
    }
}

/// Result of a [`ViewportAdapter::sync_frame`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameSync {
    /// Value-equal to the previous frame; callers skip all recompute.
    Unchanged,
    /// The transform moved; callers re-layout.
    Changed(ViewportFrame),
    /// The host has no content; the previous layout is retained.
    NoContent,
}

/// Reads the host viewport and detects no-op changes.
#[derive(Debug, Clone, Default)]
pub struct ViewportAdapter {
    last: Option<ViewportFrame>,
}

impl ViewportAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from the host, `None` if it has nothing to show.
    pub fn read_frame<V: ViewportHost + ?Sized>(host: &V) -> Option<ViewportFrame> {
        if !host.is_open() {
            return None;
        }
        let zoom = host.viewport_to_image_zoom(host.zoom());
        let frame = ViewportFrame {
            scale: Scale { x: zoom, y: zoom },
            rotation: host.rotation(),
            position: host.pixel_from_world_point(Point::ZERO),
            flip: host.flip(),
            container_size: host.container_size(),
        };
        frame.is_finite().then_some(frame)
    }

    /// Read the host and compare against the previous frame.
    pub fn sync_frame<V: ViewportHost + ?Sized>(&mut self, host: &V) -> FrameSync {
        let Some(frame) = Self::read_frame(host) else {
            log::debug!("Viewport has no content, keeping previous frame");
            return FrameSync::NoContent;
        };
        if self.last.as_ref() == Some(&frame) {
            return FrameSync::Unchanged;
        }
        log::trace!(
            "Viewport frame changed: scale={:.4}, rotation={:.1}, flip={}",
            frame.scale.x,
            frame.rotation,
            frame.flip
        );
        self.last = Some(frame);
        FrameSync::Changed(frame)
    }

    /// The last accepted frame, or identity before the first one.
    pub fn current(&self) -> ViewportFrame {
        self.last.unwrap_or_default()
    }
}

/// A self-contained viewport for hosts without their own and for tests.
///
/// Zoom follows the deep-zoom convention where viewport zoom 1.0 fits the
/// image width to the container width.
#[derive(Debug, Clone)]
pub struct SimpleViewport {
    image_size: Size,
    container: Size,
    viewport_zoom: f64,
    rotation: f64,
    flip: bool,
    /// Screen position of the world origin.
    origin: Point,
    open: bool,
    navigation_enabled: bool,
}

impl SimpleViewport {
    /// Create an open viewport showing the image at zoom 1 with the origin at the container corner.
    pub fn new(image_size: Size, container: Size) -> Self {
        let mut viewport = Self {
            image_size,
            container,
            viewport_zoom: 1.0,
            rotation: 0.0,
            flip: false,
            origin: Point::ZERO,
            open: true,
            navigation_enabled: true,
        };
        viewport.set_image_zoom(1.0);
        viewport
    }

    /// A viewport with no image loaded.
    pub fn closed(container: Size) -> Self {
        let mut viewport = Self::new(Size::new(1.0, 1.0), container);
        viewport.open = false;
        viewport
    }

    fn zoom_factor(&self) -> f64 {
        if self.image_size.width > 0.0 {
            self.container.width / self.image_size.width
        } else {
            1.0
        }
    }

    fn frame(&self) -> ViewportFrame {
        let zoom = self.image_zoom();
        ViewportFrame {
            scale: Scale { x: zoom, y: zoom },
            rotation: self.rotation,
            position: self.origin,
            flip: self.flip,
            container_size: self.container,
        }
    }

    /// Screen pixels per image pixel.
    pub fn image_zoom(&self) -> f64 {
        self.viewport_zoom * self.zoom_factor()
    }

    pub fn set_image_zoom(&mut self, zoom: f64) {
        self.viewport_zoom = zoom / self.zoom_factor();
    }

    /// Zoom while keeping the world point under `cursor` fixed on screen.
    pub fn zoom_at(&mut self, image_zoom: f64, cursor: Point) {
        let anchor = self.frame().screen_to_world(cursor);
        self.set_image_zoom(image_zoom);
        let moved = self.frame().world_to_screen(anchor);
        self.origin = self.origin + (cursor - moved);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.origin = self.origin.offset(dx, dy);
    }

    pub fn set_rotation(&mut self, degrees: f64) {
        self.rotation = degrees;
    }

    pub fn set_flip(&mut self, flip: bool) {
        self.flip = flip;
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    pub fn resize(&mut self, container: Size) {
        self.container = container;
    }

    pub fn navigation_enabled(&self) -> bool {
        self.navigation_enabled
    }
}

impl ViewportHost for SimpleViewport {
    fn is_open(&self) -> bool {
        self.open
    }

    fn zoom(&self) -> f64 {
        self.viewport_zoom
    }

    fn viewport_to_image_zoom(&self, viewport_zoom: f64) -> f64 {
        viewport_zoom * self.zoom_factor()
    }

    fn rotation(&self) -> f64 {
        self.rotation
    }

    fn flip(&self) -> bool {
        self.flip
    }

    fn pixel_from_world_point(&self, point: Point) -> Point {
        self.frame().world_to_screen(point)
    }

    fn world_point_from_pixel(&self, pixel: Point) -> Point {
        self.frame().screen_to_world(pixel)
    }

    fn container_size(&self) -> Size {
        self.container
    }

    fn set_navigation_enabled(&mut self, enabled: bool) {
        self.navigation_enabled = enabled;
    }
}
