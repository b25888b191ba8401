//! Per-overlay context shared by every component.
//!
//! One context exists per overlay instance. Components receive it by
//! reference instead of reading module-level state, so two overlays on the
//! same page never observe each other's configuration or transform.

use crate::config::OverlayConfig;
use crate::constants::MIN_SHAPE_SIZE;
use crate::viewport::ViewportFrame;

#[derive(Debug, Clone, Default)]
pub struct OverlayContext {
    pub config: OverlayConfig,
    pub frame: ViewportFrame,
}

impl OverlayContext {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            frame: ViewportFrame::identity(),
        }
    }

    /// Screen pixels per world unit.
    pub fn zoom_scale(&self) -> f64 {
        self.frame.zoom_scale()
    }

    /// Physical size (μm) of one world unit.
    pub fn pixel_size(&self) -> f64 {
        self.config.label.pixel_size_per_world_unit
    }

    pub fn stroke_width(&self) -> f64 {
        self.frame.world_length(self.config.style.stroke_width)
    }

    pub fn anchor_radius(&self) -> f64 {
        self.frame.world_length(self.config.interaction.anchor_size)
    }

    pub fn anchor_stroke_width(&self) -> f64 {
        self.frame
            .world_length(self.config.interaction.anchor_stroke_width)
    }

    pub fn snap_distance(&self) -> f64 {
        self.frame.world_length(self.config.interaction.snap_distance)
    }

    pub fn hit_tolerance(&self) -> f64 {
        self.frame.world_length(self.config.interaction.hit_tolerance)
    }

    /// Smallest width or height a resize may leave a box-like shape with.
    pub fn min_shape_extent(&self) -> f64 {
        self.frame.world_length(MIN_SHAPE_SIZE)
    }

    pub fn min_draw_distance(&self) -> f64 {
        self.frame
            .world_length(self.config.interaction.min_draw_distance)
    }

    /// World distance between an arrow's segment end and its visual tip.
    pub fn marker_offset(&self, marker_size: f64) -> f64 {
        self.frame.world_length(marker_size)
    }

    pub fn ruler_cap_length(&self) -> f64 {
        self.frame.world_length(self.config.interaction.ruler_cap_length)
    }

    pub fn flag_radius(&self) -> f64 {
        self.frame.world_length(self.config.interaction.flag_radius)
    }

    pub fn font_size(&self) -> f64 {
        self.frame.world_length(self.config.label.font_size)
    }
}
