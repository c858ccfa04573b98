pub(crate) mod accent;
pub(crate) mod fit;
pub(crate) mod geometry;
pub(crate) mod render;
pub(crate) mod wrap;

use std::collections::HashSet;
use std::io::Cursor;

use image::GenericImageView;
use tracing::{debug, info};

use crate::error::{EngineError, EngineWarning};
use crate::font::FontRegistry;
use crate::settings::StyleConfig;

pub use accent::Run;
pub use geometry::{placement, PlacementGeometry};

/// Decoded raster plus the encoded bytes the rasterizer embeds. Immutable
/// once built.
#[derive(Debug)]
pub struct ImageAsset {
    pub(crate) bytes: Vec<u8>,
    pub(crate) mime: &'static str,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl ImageAsset {
    /// Decodes arbitrary raster bytes. Formats the rasterizer cannot embed
    /// directly (anything beyond PNG/JPEG/GIF) are transcoded to PNG.
    pub fn decode(bytes: &[u8], what: &'static str) -> Result<Self, EngineError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|source| EngineError::Decode { what, source })?;
        let (width, height) = decoded.dimensions();
        match infer::get(bytes).map(|kind| kind.mime_type()) {
            Some(mime @ ("image/png" | "image/jpeg" | "image/gif")) => Ok(Self {
                bytes: bytes.to_vec(),
                mime,
                width,
                height,
            }),
            _ => {
                let mut png = Vec::new();
                decoded
                    .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
                    .map_err(|source| EngineError::Decode { what, source })?;
                Ok(Self {
                    bytes: png,
                    mime: "image/png",
                    width,
                    height,
                })
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// One rendered line: styled runs in left-to-right drawing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub runs: Vec<Run>,
}

/// Output of the fit solver and highlight classifier, consumed once by the
/// compositor.
#[derive(Debug, Clone)]
pub struct LayoutResult {
    pub font_size: u32,
    pub line_height: u32,
    /// The block exceeds the vertical budget even at the floor font size.
    pub overflowed: bool,
    pub lines: Vec<Line>,
}

/// The encoded composite.
#[derive(Debug)]
pub struct CompositeResult {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub warnings: Vec<EngineWarning>,
}

/// Runs the full pipeline: decode the base and both marks, derive the
/// placement geometry, solve the caption layout, classify accent runs, and
/// rasterize the composite to PNG.
///
/// The call is pure CPU work with no I/O; callers fetch the mark bytes and
/// register fonts ahead of time.
pub fn composite(
    base_bytes: &[u8],
    caption: &str,
    mark_bytes: [&[u8]; 2],
    style: &StyleConfig,
    fonts: &FontRegistry,
) -> Result<CompositeResult, EngineError> {
    let base = ImageAsset::decode(base_bytes, "base")?;
    let logo = ImageAsset::decode(mark_bytes[0], "mark")?;
    let second_mark = ImageAsset::decode(mark_bytes[1], "mark")?;
    info!(
        "composite: base {}x{} (mime={})",
        base.width, base.height, base.mime
    );

    let geometry = geometry::placement(base.width, base.height, style);
    let words = wrap::split_words(caption);
    let initial_size = (base.width as f32 * style.font_size_factor).floor() as u32;
    let outcome = fit::solve(&words, initial_size, &geometry, style, fonts.metrics());
    debug!(
        "fit: resolved size {} over {} lines",
        outcome.font_size,
        outcome.lines.len()
    );

    let phrases: HashSet<String> = style.accent_phrases.iter().cloned().collect();
    let lines = outcome
        .lines
        .iter()
        .map(|line| Line {
            runs: accent::classify_line(line, &phrases),
        })
        .collect();
    let layout = LayoutResult {
        font_size: outcome.font_size,
        line_height: outcome.line_height,
        overflowed: outcome.overflowed,
        lines,
    };

    let mut warnings = Vec::new();
    if words.is_empty() {
        warnings.push(EngineWarning::EmptyCaption);
    }
    if layout.overflowed {
        warnings.push(EngineWarning::LayoutOverflow);
    }

    let svg = render::compose_svg(
        &base,
        [&logo, &second_mark],
        &layout,
        &geometry,
        style,
        fonts.family(),
        fonts.metrics(),
    );
    let (bytes, width, height) = render::rasterize(&svg, fonts.fontdb())?;
    info!("composite: encoded {width}x{height} png ({} bytes)", bytes.len());
    Ok(CompositeResult {
        bytes,
        width,
        height,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let canvas = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    #[test]
    fn decode_reports_dimensions_and_mime() {
        let asset = ImageAsset::decode(&png_bytes(320, 200), "base").expect("decode");
        assert_eq!(asset.width(), 320);
        assert_eq!(asset.height(), 200);
        assert_eq!(asset.mime(), "image/png");
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = ImageAsset::decode(b"definitely not a raster", "mark").unwrap_err();
        assert!(matches!(err, EngineError::Decode { what: "mark", .. }));
    }

    #[test]
    fn bmp_input_is_transcoded_to_png() {
        let canvas = image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 0, 255]));
        let mut bmp = Vec::new();
        image::DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut bmp), image::ImageFormat::Bmp)
            .expect("encode bmp");
        let asset = ImageAsset::decode(&bmp, "mark").expect("decode");
        assert_eq!(asset.mime(), "image/png");
    }
}
