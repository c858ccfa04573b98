use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::accent::normalize_phrase;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

/// How the fit solver treats the initial font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitPolicy {
    /// Keep the initial size even when the block overflows the budget.
    Fixed,
    /// Shrink the size stepwise until the block fits or the floor is hit.
    ShrinkToFit,
}

/// Immutable styling input for one composite request.
///
/// All geometric fields are ratios of the base image dimensions; nothing in
/// here is an absolute pixel value. Defaults match `settings.toml`.
#[derive(Debug, Clone)]
pub struct StyleConfig {
    pub font_family: Option<String>,
    pub font_path: Option<String>,
    pub fill_color: String,
    pub stroke_color: String,
    pub stroke_width_factor: f32,
    pub shadow_color: String,
    pub shadow_opacity: f32,
    pub shadow_offset_factor: f32,
    pub shadow_blur_factor: f32,
    pub accent_fill_color: String,
    pub accent_stroke_color: String,
    /// Normalized (lowercased, single-spaced) phrases of one or two words.
    pub accent_phrases: Vec<String>,
    pub fit_policy: FitPolicy,
    pub blur_radius: Option<f32>,
    pub font_size_factor: f32,
    pub floor_font_size: u32,
    pub shrink_factor: f32,
    pub mark_height_ratio: f32,
    pub padding_ratio: f32,
    pub spacing_ratio: f32,
    pub x_offset: f32,
    pub y_offset: f32,
    pub text_width_ratio: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_family: None,
            font_path: None,
            fill_color: "#fffaf5".to_string(),
            stroke_color: "#000000".to_string(),
            stroke_width_factor: 0.08,
            shadow_color: "#000000".to_string(),
            shadow_opacity: 0.8,
            shadow_offset_factor: 0.08,
            shadow_blur_factor: 0.15,
            accent_fill_color: "#ffd166".to_string(),
            accent_stroke_color: "#000000".to_string(),
            accent_phrases: Vec::new(),
            fit_policy: FitPolicy::ShrinkToFit,
            blur_radius: Some(5.0),
            font_size_factor: 1.0,
            floor_font_size: 12,
            shrink_factor: 0.95,
            mark_height_ratio: 0.10,
            padding_ratio: 0.03,
            spacing_ratio: 0.01,
            x_offset: 0.10,
            y_offset: 0.50,
            text_width_ratio: 0.50,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct StyleFile {
    font: Option<FontSettings>,
    text: Option<TextSettings>,
    accent: Option<AccentSettings>,
    layout: Option<LayoutSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct FontSettings {
    family: Option<String>,
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TextSettings {
    fill_color: Option<String>,
    stroke_color: Option<String>,
    stroke_width_factor: Option<f32>,
    shadow_color: Option<String>,
    shadow_opacity: Option<f32>,
    shadow_offset_factor: Option<f32>,
    shadow_blur_factor: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct AccentSettings {
    fill_color: Option<String>,
    stroke_color: Option<String>,
    phrases: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct LayoutSettings {
    fit: Option<String>,
    blur_radius: Option<f32>,
    font_size_factor: Option<f32>,
    floor_font_size: Option<u32>,
    shrink_factor: Option<f32>,
    mark_height_ratio: Option<f32>,
    padding_ratio: Option<f32>,
    spacing_ratio: Option<f32>,
    x_offset: Option<f32>,
    y_offset: Option<f32>,
    text_width_ratio: Option<f32>,
}

/// Loads style settings with layered overrides: built-in defaults, then
/// `settings.toml` / `settings.local.toml` in the working directory and the
/// per-user directory, then an optional explicit path.
pub fn load_style(extra_path: Option<&Path>) -> Result<StyleConfig> {
    let mut style = StyleConfig::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: StyleFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            style.merge(parsed);
        }
    }

    Ok(style)
}

impl StyleConfig {
    fn merge(&mut self, incoming: StyleFile) {
        if let Some(font) = incoming.font {
            if let Some(family) = font.family {
                if !family.trim().is_empty() {
                    self.font_family = Some(family);
                }
            }
            if let Some(path) = font.path {
                if !path.trim().is_empty() {
                    self.font_path = Some(path);
                }
            }
        }
        if let Some(text) = incoming.text {
            if let Some(color) = text.fill_color {
                if !color.trim().is_empty() {
                    self.fill_color = color;
                }
            }
            if let Some(color) = text.stroke_color {
                if !color.trim().is_empty() {
                    self.stroke_color = color;
                }
            }
            if let Some(factor) = text.stroke_width_factor {
                if factor >= 0.0 {
                    self.stroke_width_factor = factor;
                }
            }
            if let Some(color) = text.shadow_color {
                if !color.trim().is_empty() {
                    self.shadow_color = color;
                }
            }
            if let Some(opacity) = text.shadow_opacity {
                if (0.0..=1.0).contains(&opacity) {
                    self.shadow_opacity = opacity;
                }
            }
            if let Some(factor) = text.shadow_offset_factor {
                if factor >= 0.0 {
                    self.shadow_offset_factor = factor;
                }
            }
            if let Some(factor) = text.shadow_blur_factor {
                if factor >= 0.0 {
                    self.shadow_blur_factor = factor;
                }
            }
        }
        if let Some(accent) = incoming.accent {
            if let Some(color) = accent.fill_color {
                if !color.trim().is_empty() {
                    self.accent_fill_color = color;
                }
            }
            if let Some(color) = accent.stroke_color {
                if !color.trim().is_empty() {
                    self.accent_stroke_color = color;
                }
            }
            if let Some(phrases) = accent.phrases {
                self.accent_phrases = phrases
                    .iter()
                    .map(|phrase| normalize_phrase(phrase))
                    .filter(|phrase| !phrase.is_empty())
                    .collect();
            }
        }
        if let Some(layout) = incoming.layout {
            if let Some(fit) = layout.fit {
                match fit.trim() {
                    "fixed" => self.fit_policy = FitPolicy::Fixed,
                    "shrink-to-fit" | "shrink_to_fit" => {
                        self.fit_policy = FitPolicy::ShrinkToFit;
                    }
                    _ => {}
                }
            }
            if let Some(radius) = layout.blur_radius {
                self.blur_radius = if radius > 0.0 { Some(radius) } else { None };
            }
            if let Some(factor) = layout.font_size_factor {
                if factor > 0.0 {
                    self.font_size_factor = factor;
                }
            }
            if let Some(floor) = layout.floor_font_size {
                if floor > 0 {
                    self.floor_font_size = floor;
                }
            }
            if let Some(factor) = layout.shrink_factor {
                if factor > 0.0 && factor < 1.0 {
                    self.shrink_factor = factor;
                }
            }
            if let Some(ratio) = layout.mark_height_ratio {
                if ratio > 0.0 {
                    self.mark_height_ratio = ratio;
                }
            }
            if let Some(ratio) = layout.padding_ratio {
                if ratio >= 0.0 {
                    self.padding_ratio = ratio;
                }
            }
            if let Some(ratio) = layout.spacing_ratio {
                if ratio >= 0.0 {
                    self.spacing_ratio = ratio;
                }
            }
            if let Some(ratio) = layout.x_offset {
                if ratio >= 0.0 {
                    self.x_offset = ratio;
                }
            }
            if let Some(ratio) = layout.y_offset {
                if ratio >= 0.0 {
                    self.y_offset = ratio;
                }
            }
            if let Some(ratio) = layout.text_width_ratio {
                if ratio > 0.0 {
                    self.text_width_ratio = ratio;
                }
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".caption-forge"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_home;

    #[test]
    fn defaults_match_documented_ratios() {
        let style = StyleConfig::default();
        assert_eq!(style.fill_color, "#fffaf5");
        assert_eq!(style.fit_policy, FitPolicy::ShrinkToFit);
        assert_eq!(style.blur_radius, Some(5.0));
        assert!((style.mark_height_ratio - 0.10).abs() < 1e-6);
        assert!((style.padding_ratio - 0.03).abs() < 1e-6);
        assert!((style.spacing_ratio - 0.01).abs() < 1e-6);
        assert!((style.x_offset - 0.10).abs() < 1e-6);
        assert!((style.y_offset - 0.50).abs() < 1e-6);
        assert_eq!(style.floor_font_size, 12);
    }

    #[test]
    fn extra_path_overrides_defaults() {
        with_temp_home(|_| {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("override.toml");
            fs::write(
                &path,
                r#"
[accent]
phrases = ["AI Agent", "  Launch  "]

[layout]
fit = "fixed"
blur_radius = 0.0
y_offset = 0.4
"#,
            )
            .expect("write override");

            let style = load_style(Some(&path)).expect("load style");
            assert_eq!(style.fit_policy, FitPolicy::Fixed);
            assert_eq!(style.blur_radius, None);
            assert!((style.y_offset - 0.4).abs() < 1e-6);
            assert_eq!(style.accent_phrases, vec!["ai agent", "launch"]);
        });
    }

    #[test]
    fn missing_extra_path_is_an_error() {
        with_temp_home(|_| {
            let dir = tempfile::tempdir().expect("tempdir");
            let missing = dir.path().join("nope.toml");
            assert!(load_style(Some(&missing)).is_err());
        });
    }

    #[test]
    fn unknown_fit_value_keeps_default() {
        let mut style = StyleConfig::default();
        let parsed: StyleFile = toml::from_str("[layout]\nfit = \"stretch\"\n").expect("parse");
        style.merge(parsed);
        assert_eq!(style.fit_policy, FitPolicy::ShrinkToFit);
    }
}
