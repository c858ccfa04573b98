use std::io::Cursor;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use resvg::render;
use tiny_skia::Pixmap;
use usvg::{fontdb, Options, Tree};

use crate::engine::geometry::PlacementGeometry;
use crate::engine::{ImageAsset, LayoutResult};
use crate::error::EngineError;
use crate::font::TextMeasurer;
use crate::settings::StyleConfig;

/// Builds the composite as a single SVG document: blurred backdrop, then
/// the text block line by line and run by run, then the two marks. Element
/// order is the z-order; later elements occlude earlier ones.
pub(crate) fn compose_svg(
    base: &ImageAsset,
    marks: [&ImageAsset; 2],
    layout: &LayoutResult,
    geometry: &PlacementGeometry,
    style: &StyleConfig,
    font_family: &str,
    measurer: &dyn TextMeasurer,
) -> String {
    let width = base.width();
    let height = base.height();
    let font_size = layout.font_size as f32;

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    ));

    if let Some(radius) = style.blur_radius {
        svg.push_str(&format!(
            r#"<filter id="backdrop-blur"><feGaussianBlur stdDeviation="{radius}"/></filter>"#
        ));
    }
    let has_shadow = style.shadow_opacity > 0.0
        && (style.shadow_offset_factor > 0.0 || style.shadow_blur_factor > 0.0);
    if has_shadow && !layout.lines.is_empty() {
        let offset = font_size * style.shadow_offset_factor;
        let blur = font_size * style.shadow_blur_factor;
        svg.push_str(&format!(
            r#"<filter id="text-shadow" x="-50%" y="-50%" width="200%" height="200%"><feDropShadow dx="{offset}" dy="{offset}" stdDeviation="{blur}" flood-color="{color}" flood-opacity="{opacity}"/></filter>"#,
            color = style.shadow_color,
            opacity = style.shadow_opacity,
        ));
    }

    let backdrop_filter = if style.blur_radius.is_some() {
        r#" filter="url(#backdrop-blur)""#
    } else {
        ""
    };
    svg.push_str(&format!(
        r#"<image href="{uri}" xlink:href="{uri}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="none"{filter}/>"#,
        uri = data_uri(base),
        w = width,
        h = height,
        filter = backdrop_filter,
    ));

    let stroke_width = font_size * style.stroke_width_factor;
    let space_width = measurer.advance_width(" ", font_size);
    for (line_index, line) in layout.lines.iter().enumerate() {
        let line_width: f32 = line
            .runs
            .iter()
            .map(|run| measurer.advance_width(&run.text, font_size))
            .sum::<f32>()
            + space_width * line.runs.len().saturating_sub(1) as f32;
        let top = geometry.text_y_offset + line_index as u32 * layout.line_height;
        // SVG text positions at the baseline; the ascent is approximated by
        // the font size, matching the measured block height.
        let baseline = top as f32 + font_size;
        let mut x = width as f32 - geometry.text_x_offset as f32 - line_width;

        for run in &line.runs {
            let (fill, stroke) = if run.accent {
                (&style.accent_fill_color, &style.accent_stroke_color)
            } else {
                (&style.fill_color, &style.stroke_color)
            };
            let mut attrs = format!(
                r#"x="{x}" y="{baseline}" font-family="{family}" font-size="{font_size}" fill="{fill}""#,
                family = escape_xml(font_family),
            );
            if stroke_width > 0.0 {
                attrs.push_str(&format!(
                    r#" stroke="{stroke}" stroke-width="{stroke_width}" paint-order="stroke""#
                ));
            }
            if has_shadow {
                attrs.push_str(r#" filter="url(#text-shadow)""#);
            }
            svg.push_str(&format!("<text {attrs}>{}</text>", escape_xml(&run.text)));
            x += measurer.advance_width(&run.text, font_size) + space_width;
        }
    }

    // Marks carry no filter; the shadow never bleeds past the text block.
    let mark_y = height.saturating_sub(geometry.mark_size + geometry.padding);
    let mut mark_x = geometry.padding;
    for mark in marks {
        let mark_width = scaled_mark_width(mark, geometry.mark_size);
        svg.push_str(&format!(
            r#"<image href="{uri}" xlink:href="{uri}" x="{x}" y="{y}" width="{w}" height="{h}" preserveAspectRatio="none"/>"#,
            uri = data_uri(mark),
            x = mark_x,
            y = mark_y,
            w = mark_width,
            h = geometry.mark_size,
        ));
        mark_x += mark_width + geometry.spacing;
    }

    svg.push_str("</svg>");
    svg
}

/// Width of a mark scaled to the shared mark height, keeping its own
/// aspect ratio.
pub(crate) fn scaled_mark_width(mark: &ImageAsset, mark_size: u32) -> u32 {
    let aspect = mark.width() as f32 / mark.height().max(1) as f32;
    (aspect * mark_size as f32).floor() as u32
}

/// Rasterizes the SVG and encodes the canvas as PNG.
pub(crate) fn rasterize(
    svg: &str,
    db: Arc<fontdb::Database>,
) -> Result<(Vec<u8>, u32, u32), EngineError> {
    let options = Options {
        fontdb: db,
        ..Options::default()
    };
    let tree = Tree::from_str(svg, &options).map_err(|err| EngineError::Render(err.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height())
        .ok_or_else(|| EngineError::Render("empty canvas size".to_string()))?;
    let mut pixmap_mut = pixmap.as_mut();
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);
    let canvas = image::RgbaImage::from_raw(size.width(), size.height(), pixmap.data().to_vec())
        .ok_or_else(|| EngineError::Render("failed to build output buffer".to_string()))?;
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok((bytes, size.width(), size.height()))
}

fn data_uri(asset: &ImageAsset) -> String {
    format!(
        "data:{};base64,{}",
        asset.mime(),
        BASE64.encode(asset.bytes())
    )
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
