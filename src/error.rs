use thiserror::Error;

/// Fatal pipeline failures. The engine returns at most one of these per
/// request and never produces partial output alongside an error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to decode {what} image: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: image::ImageError,
    },
    #[error("font unavailable: {0}")]
    Font(String),
    #[error("failed to render composite: {0}")]
    Render(String),
    #[error("failed to encode output image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Non-fatal conditions, reported on the success value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineWarning {
    /// The caption was empty; the output carries backdrop and marks only.
    EmptyCaption,
    /// The text block still exceeds the vertical budget at the floor font
    /// size. The output is produced with the overflowing block.
    LayoutOverflow,
}
