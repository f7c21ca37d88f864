#![no_std]
//! Spectral mapping and peak-hold rendering engine.
//!
//! One call to [`SpectrumRenderer::render`] per display frame pulls a
//! magnitude snapshot from an external analysis stage, maps its bins onto
//! display columns, tracks per-column peaks and returns the draw commands
//! for that frame. Painting the commands is left to [`surface`] or to any
//! other consumer.
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

#[cfg(feature = "logging")]
use defmt_rtt as _;

/// Routes diagnostics to `defmt` on target builds and to the `log` facade
/// everywhere else.
macro_rules! viz_log {
    ($level:ident, $($arg:tt)*) => {{
        #[cfg(feature = "logging")]
        defmt::$level!($($arg)*);
        #[cfg(not(feature = "logging"))]
        log::$level!($($arg)*);
    }};
}

pub mod bin_summary;
pub mod color_strategy;
pub mod config;
pub mod frequency_bin_mapper;
pub mod level_quantizer;
pub mod peak_tracker;
pub mod render_strategy;
pub mod renderer;
pub mod source;
pub mod surface;
pub mod types;

pub use config::{
    AnalysisSettings, Band, BandWindow, ConfigChange, ConfigDelta, ConfigError, DisplayGeometry,
    Gridlines, RenderConfig, RenderMode,
};
pub use frequency_bin_mapper::{ColumnBinRange, FrequencyAxis, FrequencyBinMapper};
pub use level_quantizer::{LevelQuantizer, SegmentColor};
pub use peak_tracker::{GravityPeaks, PeakTracker, StepHoldPeaks};
pub use renderer::{FrameError, SpectrumRenderer};
pub use source::SpectrumSource;
pub use types::{DrawCommand, Layer, MagnitudeSnapshot};
