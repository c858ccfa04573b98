//! Caption layout and compositing engine.
//!
//! Takes a base photograph, a caption, and two brand marks, and produces a
//! single PNG: blurred backdrop, right-aligned shrink-to-fit caption with
//! per-phrase accent highlighting, and the marks in a fixed bottom-left
//! row. Transport, asset fetching, and persistence belong to the caller;
//! this crate is the pure layout-and-render core.

mod engine;
mod error;
mod font;
pub mod logging;
pub mod settings;
#[cfg(test)]
mod test_util;

pub use engine::{
    composite, placement, CompositeResult, ImageAsset, LayoutResult, Line, PlacementGeometry, Run,
};
pub use error::{EngineError, EngineWarning};
pub use font::{FontMetrics, FontRegistry, TextMeasurer};
pub use settings::{load_style, FitPolicy, StyleConfig};
