use tracing::debug;

use crate::engine::geometry::PlacementGeometry;
use crate::engine::wrap::break_lines;
use crate::font::TextMeasurer;
use crate::settings::{FitPolicy, StyleConfig};

/// Resolved font size and the wrapped (not yet styled) lines.
#[derive(Debug, Clone)]
pub(crate) struct FitOutcome {
    pub(crate) font_size: u32,
    pub(crate) line_height: u32,
    pub(crate) lines: Vec<String>,
    /// Floor reached while the block still exceeds the vertical budget.
    pub(crate) overflowed: bool,
}

/// Solves for the final font size. `FitPolicy::Fixed` runs a single pass at
/// the initial size; `ShrinkToFit` multiplies the size by the shrink factor
/// (flooring each step) and re-wraps until the block height
/// `text_y_offset + lines * line_height` fits the vertical budget or the
/// floor size is reached. Overflow at the floor is accepted and flagged,
/// never looped on, so iteration count is bounded by the size range alone.
pub(crate) fn solve(
    words: &[&str],
    initial_size: u32,
    geometry: &PlacementGeometry,
    style: &StyleConfig,
    measurer: &dyn TextMeasurer,
) -> FitOutcome {
    let floor = style.floor_font_size.max(1);
    let mut font_size = initial_size.max(floor);
    let max_width = geometry.max_text_width as f32;

    loop {
        let lines = break_lines(words, max_width, font_size as f32, measurer);
        let line_height = line_height_for(font_size);
        let block_height = geometry.text_y_offset + lines.len() as u32 * line_height;
        let fits = block_height <= geometry.vertical_budget;

        if style.fit_policy == FitPolicy::Fixed || fits || font_size <= floor {
            let overflowed = !lines.is_empty() && !fits;
            if overflowed {
                debug!(
                    "fit: overflow at size {font_size} ({} lines over budget {})",
                    lines.len(),
                    geometry.vertical_budget
                );
            }
            return FitOutcome {
                font_size,
                line_height,
                lines,
                overflowed,
            };
        }

        let next = (font_size as f32 * style.shrink_factor).floor() as u32;
        // The floored product can equal the current size for shrink factors
        // close to 1; force at least one pixel of progress.
        font_size = next.min(font_size - 1).max(floor);
        debug!("fit: shrinking to {font_size}");
    }
}

pub(crate) fn line_height_for(font_size: u32) -> u32 {
    (font_size as f32 * 1.1).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geometry::placement;
    use crate::engine::wrap::split_words;
    use crate::test_util::ScaledAdvance;

    const MEASURER: ScaledAdvance = ScaledAdvance { em_per_char: 0.5 };

    fn geometry_with_budget(budget: u32) -> PlacementGeometry {
        let mut geometry = placement(1000, 800, &StyleConfig::default());
        geometry.text_y_offset = 0;
        geometry.vertical_budget = budget;
        geometry
    }

    #[test]
    fn shrinks_until_block_fits() {
        let style = StyleConfig::default();
        let words = split_words("a caption long enough to need several wrapped lines here");
        let geometry = geometry_with_budget(120);
        let outcome = solve(&words, 100, &geometry, &style, &MEASURER);
        assert!(!outcome.overflowed);
        assert!(outcome.font_size < 100);
        let block = outcome.lines.len() as u32 * outcome.line_height;
        assert!(block <= 120);
    }

    #[test]
    fn stops_at_floor_and_reports_overflow() {
        let style = StyleConfig::default();
        let caption = "word ".repeat(200);
        let words = split_words(&caption);
        let geometry = geometry_with_budget(10);
        let outcome = solve(&words, 100, &geometry, &style, &MEASURER);
        assert_eq!(outcome.font_size, style.floor_font_size);
        assert!(outcome.overflowed);
        assert!(!outcome.lines.is_empty());
    }

    #[test]
    fn idempotent_on_its_own_output() {
        let style = StyleConfig::default();
        let words = split_words("a caption long enough to need several wrapped lines here");
        let geometry = geometry_with_budget(150);
        let first = solve(&words, 90, &geometry, &style, &MEASURER);
        let second = solve(&words, first.font_size, &geometry, &style, &MEASURER);
        assert_eq!(second.font_size, first.font_size);
        assert_eq!(second.lines, first.lines);
    }

    #[test]
    fn smaller_budget_never_grows_the_size() {
        let style = StyleConfig::default();
        let words = split_words("monotonicity check over a fairly long caption string");
        let mut previous = u32::MAX;
        for budget in [400, 300, 200, 100, 50] {
            let geometry = geometry_with_budget(budget);
            let outcome = solve(&words, 80, &geometry, &style, &MEASURER);
            assert!(
                outcome.font_size <= previous,
                "budget {budget} grew the size to {}",
                outcome.font_size
            );
            previous = outcome.font_size;
        }
    }

    #[test]
    fn fixed_policy_never_shrinks() {
        let mut style = StyleConfig::default();
        style.fit_policy = FitPolicy::Fixed;
        let caption = "word ".repeat(100);
        let words = split_words(&caption);
        let geometry = geometry_with_budget(10);
        let outcome = solve(&words, 64, &geometry, &style, &MEASURER);
        assert_eq!(outcome.font_size, 64);
        assert!(outcome.overflowed);
    }

    #[test]
    fn empty_caption_fits_without_overflow() {
        let style = StyleConfig::default();
        let geometry = geometry_with_budget(0);
        let outcome = solve(&[], 48, &geometry, &style, &MEASURER);
        assert!(outcome.lines.is_empty());
        assert!(!outcome.overflowed);
    }

    #[test]
    fn line_height_is_ten_percent_leading_floored() {
        assert_eq!(line_height_for(100), 110);
        assert_eq!(line_height_for(13), 14);
        assert_eq!(line_height_for(12), 13);
    }
}
