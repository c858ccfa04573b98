use crate::font::TextMeasurer;

/// Synthetic measurer with a constant per-character advance, independent of
/// the font size. Keeps layout tests free of real font assets.
pub(crate) struct FixedAdvance {
    pub(crate) px_per_char: f32,
}

impl TextMeasurer for FixedAdvance {
    fn advance_width(&self, text: &str, _font_size: f32) -> f32 {
        text.chars().count() as f32 * self.px_per_char
    }
}

/// Per-character advance scaled by the font size, for fit-solver tests
/// where shrinking must actually change measured widths.
pub(crate) struct ScaledAdvance {
    pub(crate) em_per_char: f32,
}

impl TextMeasurer for ScaledAdvance {
    fn advance_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * self.em_per_char * font_size
    }
}

pub(crate) fn with_temp_home<F, R>(func: F) -> R
where
    F: FnOnce(&std::path::Path) -> R,
{
    static HOME_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
    let _guard = HOME_MUTEX.lock().expect("home lock");
    let dir = tempfile::tempdir().expect("tempdir");
    let old_home = std::env::var("HOME").ok();
    // SAFETY: the process-wide mutex above serializes every HOME mutation.
    unsafe { std::env::set_var("HOME", dir.path()) };
    let result = func(dir.path());
    if let Some(old) = old_home {
        unsafe { std::env::set_var("HOME", old) };
    } else {
        unsafe { std::env::remove_var("HOME") };
    }
    result
}
