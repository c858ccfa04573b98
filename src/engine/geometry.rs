use crate::settings::StyleConfig;

/// Absolute pixel layout values for one canvas, derived from the base image
/// dimensions and the style ratios. Recomputed per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementGeometry {
    /// Height both marks are scaled to.
    pub mark_size: u32,
    /// Distance of the marks from the left and bottom edges.
    pub padding: u32,
    /// Horizontal gap between the two marks.
    pub spacing: u32,
    /// Distance of the text block from the right edge.
    pub text_x_offset: u32,
    /// Top of the first text line.
    pub text_y_offset: u32,
    /// Widest a wrapped line may measure.
    pub max_text_width: u32,
    /// Vertical space the text block may occupy before colliding with the
    /// mark row at the bottom.
    pub vertical_budget: u32,
}

/// Maps image dimensions and style ratios to absolute pixels. Every output
/// is `floor(ratio * dimension)`; the x/y text offsets and the text width
/// are width-relative, the mark row is height-relative.
pub fn placement(width: u32, height: u32, style: &StyleConfig) -> PlacementGeometry {
    let mark_size = scaled(height, style.mark_height_ratio);
    let padding = scaled(height, style.padding_ratio);
    let spacing = scaled(width, style.spacing_ratio);
    PlacementGeometry {
        mark_size,
        padding,
        spacing,
        text_x_offset: scaled(width, style.x_offset),
        text_y_offset: scaled(width, style.y_offset),
        max_text_width: scaled(width, style.text_width_ratio),
        vertical_budget: height.saturating_sub(mark_size + padding * 2),
    }
}

fn scaled(dimension: u32, ratio: f32) -> u32 {
    (dimension as f32 * ratio).floor() as u32
}
