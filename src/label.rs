//! Screen-space-invariant labels attached to shapes.
//!
//! A label shows up to three categories of lines, always in this order:
//! tag, measurement, description. Each category can be hidden, and an empty
//! category contributes no line at all.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::context::OverlayContext;
use crate::geometry::Point;
use crate::model::{Measurement, Shape, ShapeId};

/// Label appearance and content switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelOptions {
    /// Font size in screen pixels
    pub font_size: f64,
    /// Physical size (μm) of one world unit
    pub pixel_size_per_world_unit: f64,
    /// Show labels for every shape, not only the selected/hovered one
    pub always_visible: bool,
    pub tag_visible: bool,
    pub measurement_visible: bool,
    pub description_visible: bool,
    /// Tag given to newly drawn shapes
    pub tag_text: String,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            font_size: constants::FONT_SIZE,
            pixel_size_per_world_unit: constants::DEFAULT_PIXEL_SIZE,
            always_visible: false,
            tag_visible: true,
            measurement_visible: true,
            description_visible: true,
            tag_text: String::new(),
        }
    }
}

/// Text lines for a shape's label.
pub fn label_lines(measurement: &Measurement, options: &LabelOptions) -> Vec<String> {
    let mut lines = Vec::new();
    if options.tag_visible && !measurement.label_tag.is_empty() {
        lines.push(measurement.label_tag.clone());
    }
    if options.measurement_visible {
        lines.extend(measurement.lines());
    }
    if options.description_visible && !measurement.description.is_empty() {
        lines.push(measurement.description.clone());
    }
    lines
}

/// A laid-out label, ready to draw under the overlay root transform.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelView {
    pub owner: ShapeId,
    pub lines: Vec<String>,
    /// Top-left corner of the label box in world space.
    pub position: Point,
    /// Font size in world units.
    pub font_size: f64,
    /// Background padding in world units.
    pub padding: f64,
    /// Rotation (degrees) that cancels the viewport rotation.
    pub rotation: f64,
    /// Whether the text must be mirrored back to cancel a flipped viewport.
    pub mirrored: bool,
}

/// Lay out the label for a shape, `None` when nothing should show.
pub fn layout_label(
    shape: &Shape,
    selected: bool,
    hovered: bool,
    ctx: &OverlayContext,
) -> Option<LabelView> {
    let options = &ctx.config.label;
    if !shape.style.visible || !(selected || hovered || options.always_visible) {
        return None;
    }

    let lines = label_lines(&shape.measurement, options);
    if lines.is_empty() {
        return None;
    }

    let bounds = shape.geometry.bounds()?;
    let offset = ctx.frame.world_length(constants::LABEL_OFFSET);
    Some(LabelView {
        owner: shape.id.clone(),
        lines,
        position: Point::new(bounds.max.x + offset, bounds.min.y),
        font_size: ctx.font_size(),
        padding: ctx.frame.world_length(constants::LABEL_PADDING),
        rotation: -ctx.frame.rotation,
        mirrored: ctx.frame.flip,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::approx_eq;
    use crate::model::{Geometry, RectangleGeometry, Style};
    use crate::viewport::{Scale, ViewportFrame};

    fn shape() -> Shape {
        let geometry = Geometry::Rectangle(RectangleGeometry {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 50.0,
        });
        let mut measurement = Measurement {
            label_tag: "Tumor".into(),
            description: "check margin".into(),
            ..Measurement::default()
        };
        measurement.recompute(&geometry, 1.0);
        Shape {
            id: "s1".into(),
            geometry,
            style: Style {
                stroke: "#fff".into(),
                stroke_width: 1.0,
                visible: true,
            },
            measurement,
        }
    }

    #[test]
    fn test_line_order() {
        let lines = label_lines(&shape().measurement, &LabelOptions::default());
        assert_eq!(lines.first().map(String::as_str), Some("Tumor"));
        assert_eq!(lines.get(1).map(String::as_str), Some("Width: 100.00 μm"));
        assert_eq!(lines.last().map(String::as_str), Some("check margin"));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_hidden_categories_leave_no_blank_lines() {
        let options = LabelOptions {
            measurement_visible: false,
            ..LabelOptions::default()
        };
        assert_eq!(
            label_lines(&shape().measurement, &options),
            vec!["Tumor", "check margin"]
        );

        let mut s = shape();
        s.measurement.label_tag.clear();
        s.measurement.description.clear();
        assert!(label_lines(&s.measurement, &options).is_empty());
    }

    #[test]
    fn test_visibility_rules() {
        let ctx = OverlayContext::default();
        let s = shape();
        assert!(layout_label(&s, false, false, &ctx).is_none());
        assert!(layout_label(&s, true, false, &ctx).is_some());
        assert!(layout_label(&s, false, true, &ctx).is_some());

        let mut always = OverlayContext::default();
        always.config.label.always_visible = true;
        assert!(layout_label(&s, false, false, &always).is_some());
    }

    #[test]
    fn test_font_size_is_screen_invariant() {
        for zoom in [0.1, 1.0, 10.0, 100.0] {
            let mut ctx = OverlayContext::default();
            ctx.frame = ViewportFrame {
                scale: Scale { x: zoom, y: zoom },
                rotation: 30.0,
                ..ViewportFrame::identity()
            };
            let view = layout_label(&shape(), true, false, &ctx).unwrap();
            assert!(approx_eq(view.font_size * zoom, ctx.config.label.font_size));
            assert!(approx_eq(view.rotation, -30.0));
        }
    }
}
