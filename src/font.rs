use std::path::Path;
use std::sync::Arc;

use ttf_parser::name_id;
use ttf_parser::Face;
use usvg::fontdb;

use crate::error::EngineError;

/// Width measurement seam between layout and the font backend.
///
/// Implementations must be deterministic: identical text at an identical
/// size always yields the identical advance, otherwise the fit solver's
/// convergence is not reproducible.
pub trait TextMeasurer {
    fn advance_width(&self, text: &str, font_size: f32) -> f32;
}

/// Parsed face data used for advance-width measurement.
#[derive(Clone, Debug)]
pub struct FontMetrics {
    data: Arc<Vec<u8>>,
    face_index: u32,
    units_per_em: u16,
    space_advance: u16,
    family: Option<String>,
}

impl FontMetrics {
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn from_data(data: &[u8], preferred_family: Option<&str>) -> Result<Self, EngineError> {
        let mut fallback = None;
        let count = ttf_parser::fonts_in_collection(data).unwrap_or(1);
        for index in 0..count {
            if let Ok(face) = Face::parse(data, index) {
                let family = extract_family_name(&face);
                let units_per_em = face.units_per_em().max(1);
                let space_advance = face
                    .glyph_index(' ')
                    .and_then(|id| face.glyph_hor_advance(id))
                    .unwrap_or(units_per_em / 2);
                let metrics = FontMetrics {
                    data: Arc::new(data.to_vec()),
                    face_index: index,
                    units_per_em,
                    space_advance,
                    family: family.clone(),
                };
                if let (Some(preferred), Some(found)) = (preferred_family, &family) {
                    if found.eq_ignore_ascii_case(preferred) {
                        return Ok(metrics);
                    }
                }
                if fallback.is_none() {
                    fallback = Some(metrics);
                }
            }
        }
        if let Some(preferred) = preferred_family {
            return Err(EngineError::Font(format!(
                "family '{preferred}' not found in font data"
            )));
        }
        fallback.ok_or_else(|| EngineError::Font("failed to parse font data".to_string()))
    }
}

impl TextMeasurer for FontMetrics {
    fn advance_width(&self, text: &str, font_size: f32) -> f32 {
        let Ok(face) = Face::parse(&self.data, self.face_index) else {
            return 0.0;
        };
        let mut advance = 0u32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            if ch == ' ' {
                advance = advance.saturating_add(self.space_advance as u32);
                continue;
            }
            if let Some(glyph) = face.glyph_index(ch) {
                let glyph_advance = face.glyph_hor_advance(glyph).unwrap_or(self.space_advance);
                advance = advance.saturating_add(glyph_advance as u32);
            } else {
                advance = advance.saturating_add(self.space_advance as u32);
            }
        }
        let units = self.units_per_em.max(1) as f32;
        advance as f32 * (font_size / units)
    }
}

/// Font state loaded once at process start and shared across requests.
///
/// Holds the measurement metrics and the font database handed to the
/// rasterizer, so both stages see the same face. Unknown fonts fail here,
/// before any layout runs; a silent substitute would invalidate every
/// measured width downstream.
#[derive(Debug)]
pub struct FontRegistry {
    metrics: FontMetrics,
    family: String,
    db: Arc<fontdb::Database>,
}

impl FontRegistry {
    /// Registers an in-memory font (TTF/OTF, collections allowed).
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, EngineError> {
        let metrics = FontMetrics::from_data(&data, None)?;
        let family = metrics
            .family()
            .map(|name| name.to_string())
            .ok_or_else(|| EngineError::Font("font data carries no family name".to_string()))?;
        let mut db = fontdb::Database::new();
        db.load_font_data(data);
        Ok(Self {
            metrics,
            family,
            db: Arc::new(db),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let data = std::fs::read(path).map_err(|err| {
            EngineError::Font(format!("failed to read font {}: {err}", path.display()))
        })?;
        Self::from_bytes(data)
    }

    /// Resolves an installed font by family name.
    pub fn from_system_family(family: &str) -> Result<Self, EngineError> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        let query = fontdb::Query {
            families: &[fontdb::Family::Name(family)],
            ..Default::default()
        };
        let id = db
            .query(&query)
            .ok_or_else(|| EngineError::Font(format!("font not found: {family}")))?;
        let metrics = db
            .with_face_data(id, |data, _index| FontMetrics::from_data(data, Some(family)))
            .ok_or_else(|| EngineError::Font(format!("failed to load font data: {family}")))??;
        let resolved_family = metrics
            .family()
            .map(|name| name.to_string())
            .unwrap_or_else(|| family.to_string());
        Ok(Self {
            metrics,
            family: resolved_family,
            db: Arc::new(db),
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    pub(crate) fn fontdb(&self) -> Arc<fontdb::Database> {
        Arc::clone(&self.db)
    }
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}
