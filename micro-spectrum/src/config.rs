use alloc::vec::Vec;

use thiserror::Error;

// --- Segment (LED) Config ---
pub const YDIV: u32 = 20; // Lit segments per LED column at full scale
pub const PEAK_HOLD_FRAMES: u32 = 30; // ~0.5 s at 60 fps before a held segment starts to drop
pub const PEAK_FALL_FRAMES: u32 = 2; // Frames between single-segment drops once falling

// --- Continuous Bar Config ---
pub const GRAVITY_DIVISOR: f32 = 64.0 * 64.0; // gravity = height / divisor, px per frame^2
pub const PEAK_CAP_HEIGHT: u32 = 2;

// --- Frequency Axis Config ---
pub const MIN_AUDIBLE_HZ: f32 = 20.0;
pub const MAX_AUDIBLE_HZ: f32 = 20_000.0;

// --- Analysis Config ---
pub const TRANSFORM_SIZE_MIN: u32 = 32;
pub const TRANSFORM_SIZE_MAX: u32 = 32_768;
pub const TRANSFORM_SIZE_OPTIONS: [u32; 5] = [512, 1024, 2048, 4096, 8192];
pub const MIN_DECIBEL_SPAN: f32 = 10.0; // Smallest max-min gap the config keeps

pub const DEFAULT_MAX_DECIBELS: f32 = -30.0;
pub const DEFAULT_MIN_DECIBELS: f32 = -70.0;
pub const DEFAULT_TRANSFORM_SIZE: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// One column per pixel, bins spread evenly over 0 Hz..max.
    Linear,
    /// One column per pixel, bins spread over a log10 axis.
    Logarithmic,
    /// LED segments per band, each band aggregating a bin range.
    LedBlock,
    /// LED segments per band, each band reading one representative bin in dB.
    LedBand,
}

impl RenderMode {
    pub const ALL: [RenderMode; 4] = [
        RenderMode::Linear,
        RenderMode::Logarithmic,
        RenderMode::LedBlock,
        RenderMode::LedBand,
    ];

    pub fn is_led(self) -> bool {
        matches!(self, RenderMode::LedBlock | RenderMode::LedBand)
    }

    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Linear => "linear",
            RenderMode::Logarithmic => "log",
            RenderMode::LedBlock => "led-block",
            RenderMode::LedBand => "led-band",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.name() == name)
    }
}

/// Per-band rescale window applied after normalisation to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandWindow {
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub center_hz: f32,
    pub label: &'static str,
    pub window: Option<BandWindow>,
}

impl Band {
    pub const fn new(center_hz: f32, label: &'static str) -> Self {
        Self {
            center_hz,
            label,
            window: None,
        }
    }

    pub const fn with_window(self, min: f32, max: f32) -> Self {
        Self {
            window: Some(BandWindow { min, max }),
            ..self
        }
    }
}

pub const SEVEN_BANDS: [Band; 7] = [
    Band::new(63.0, "63"),
    Band::new(160.0, "160"),
    Band::new(400.0, "400"),
    Band::new(1_000.0, "1k"),
    Band::new(2_500.0, "2.5k").with_window(0.0, 0.9),
    Band::new(6_300.0, "6.3k").with_window(0.05, 0.8),
    Band::new(16_000.0, "16k").with_window(0.1, 0.7),
];

pub const OCTAVE_BANDS: [Band; 10] = [
    Band::new(31.5, "31"),
    Band::new(63.0, "63"),
    Band::new(125.0, "125"),
    Band::new(250.0, "250"),
    Band::new(500.0, "500"),
    Band::new(1_000.0, "1k").with_window(0.0, 0.95),
    Band::new(2_000.0, "2k").with_window(0.0, 0.9),
    Band::new(4_000.0, "4k").with_window(0.05, 0.85),
    Band::new(8_000.0, "8k").with_window(0.05, 0.8),
    Band::new(16_000.0, "16k").with_window(0.1, 0.7),
];

pub const TWO_THIRDS_OCTAVE_BANDS: [Band; 15] = [
    Band::new(25.0, "25"),
    Band::new(40.0, "40"),
    Band::new(63.0, "63"),
    Band::new(100.0, "100"),
    Band::new(160.0, "160"),
    Band::new(250.0, "250"),
    Band::new(400.0, "400"),
    Band::new(630.0, "630"),
    Band::new(1_000.0, "1k"),
    Band::new(1_600.0, "1.6k").with_window(0.0, 0.95),
    Band::new(2_500.0, "2.5k").with_window(0.0, 0.9),
    Band::new(4_000.0, "4k").with_window(0.05, 0.85),
    Band::new(6_300.0, "6.3k").with_window(0.05, 0.8),
    Band::new(10_000.0, "10k").with_window(0.1, 0.75),
    Band::new(16_000.0, "16k").with_window(0.1, 0.7),
];

/// A reference frequency drawn as a labelled gridline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMark {
    pub freq_hz: f32,
    pub label: &'static str,
}

const CANONICAL_GRID: [GridMark; 3] = [
    GridMark { freq_hz: 100.0, label: "100Hz" },
    GridMark { freq_hz: 1_000.0, label: "1kHz" },
    GridMark { freq_hz: 10_000.0, label: "10kHz" },
];

const DENSE_GRID: [GridMark; 10] = [
    GridMark { freq_hz: 20.0, label: "20" },
    GridMark { freq_hz: 50.0, label: "50" },
    GridMark { freq_hz: 100.0, label: "100" },
    GridMark { freq_hz: 200.0, label: "200" },
    GridMark { freq_hz: 500.0, label: "500" },
    GridMark { freq_hz: 1_000.0, label: "1k" },
    GridMark { freq_hz: 2_000.0, label: "2k" },
    GridMark { freq_hz: 5_000.0, label: "5k" },
    GridMark { freq_hz: 10_000.0, label: "10k" },
    GridMark { freq_hz: 20_000.0, label: "20k" },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gridlines {
    Off,
    Canonical,
    Dense,
}

impl Gridlines {
    pub fn marks(self) -> &'static [GridMark] {
        match self {
            Gridlines::Off => &[],
            Gridlines::Canonical => &CANONICAL_GRID,
            Gridlines::Dense => &DENSE_GRID,
        }
    }
}

/// Display size in pixels. Continuous modes draw one column per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    pub width: u32,
    pub height: u32,
}

impl DisplayGeometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// What the external analysis stage needs to know to produce snapshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSettings {
    pub transform_size: u32,
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub min_decibels: f32,
    pub max_decibels: f32,
    pub transform_size: u32,
    /// Forwarded to the analysis stage; the engine itself never smooths.
    pub smoothing: f32,
    pub mode: RenderMode,
    pub gridlines: Gridlines,
    pub bands: Vec<Band>,
    pub geometry: DisplayGeometry,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            min_decibels: DEFAULT_MIN_DECIBELS,
            max_decibels: DEFAULT_MAX_DECIBELS,
            transform_size: DEFAULT_TRANSFORM_SIZE,
            smoothing: 0.0,
            mode: RenderMode::Logarithmic,
            gridlines: Gridlines::Canonical,
            bands: OCTAVE_BANDS.to_vec(),
            geometry: DisplayGeometry::new(128, 64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub enum ConfigError {
    #[error("transform size {0} must be a power of two between 32 and 32768")]
    InvalidTransformSize(u32),
    #[error("smoothing factor {0} must lie in 0.0..=1.0")]
    SmoothingOutOfRange(f32),
    #[error("decibel bounds must be finite")]
    NonFiniteDecibels,
    #[error("display geometry must be at least 1x1")]
    EmptyDisplay,
    #[error("LED render modes need at least one band")]
    EmptyBandTable,
    #[error("band {0} centre must be positive and above the previous band")]
    UnorderedBands(usize),
}

/// A partial update from the UI layer. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDelta {
    pub min_decibels: Option<f32>,
    pub max_decibels: Option<f32>,
    pub transform_size: Option<u32>,
    pub smoothing: Option<f32>,
    pub mode: Option<RenderMode>,
    pub gridlines: Option<Gridlines>,
    pub bands: Option<Vec<Band>>,
    pub geometry: Option<DisplayGeometry>,
}

/// Which derived state an accepted delta invalidated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigChange {
    /// Column table and peak state must be rebuilt together.
    pub layout: bool,
    /// The analysis stage must be re-configured.
    pub analysis: bool,
}

impl ConfigChange {
    pub fn is_empty(&self) -> bool {
        !self.layout && !self.analysis
    }
}

impl RenderConfig {
    pub fn frequency_bin_count(&self) -> usize {
        (self.transform_size / 2) as usize
    }

    pub fn decibel_window_is_valid(&self) -> bool {
        self.max_decibels > self.min_decibels
    }

    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            transform_size: self.transform_size,
            smoothing: self.smoothing,
            min_decibels: self.min_decibels,
            max_decibels: self.max_decibels,
        }
    }

    /// Checks everything except the ordering of the decibel bounds; a window
    /// with `max <= min` is legal and renders as background.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_decibels.is_finite() || !self.max_decibels.is_finite() {
            return Err(ConfigError::NonFiniteDecibels);
        }
        let size = self.transform_size;
        if !size.is_power_of_two() || !(TRANSFORM_SIZE_MIN..=TRANSFORM_SIZE_MAX).contains(&size) {
            return Err(ConfigError::InvalidTransformSize(size));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(ConfigError::SmoothingOutOfRange(self.smoothing));
        }
        if self.geometry.width == 0 || self.geometry.height == 0 {
            return Err(ConfigError::EmptyDisplay);
        }
        if self.mode.is_led() && self.bands.is_empty() {
            return Err(ConfigError::EmptyBandTable);
        }
        let mut previous = 0.0;
        for (index, band) in self.bands.iter().enumerate() {
            if !band.center_hz.is_finite() || band.center_hz <= previous {
                return Err(ConfigError::UnorderedBands(index));
            }
            previous = band.center_hz;
        }
        Ok(())
    }

    /// Validates `delta` against the current config and commits it whole, or
    /// leaves `self` untouched and returns the first violation.
    ///
    /// Moving the max bound drags min down to keep `MIN_DECIBEL_SPAN`; moving
    /// the min bound drags max up. When both arrive together max wins.
    pub fn apply(&mut self, delta: ConfigDelta) -> Result<ConfigChange, ConfigError> {
        let mut next = self.clone();

        match (delta.min_decibels, delta.max_decibels) {
            (Some(min), Some(max)) => {
                next.max_decibels = max;
                next.min_decibels = min.min(max - MIN_DECIBEL_SPAN);
            }
            (None, Some(max)) => {
                next.max_decibels = max;
                if next.min_decibels > max - MIN_DECIBEL_SPAN {
                    next.min_decibels = max - MIN_DECIBEL_SPAN;
                }
            }
            (Some(min), None) => {
                next.min_decibels = min;
                if next.max_decibels < min + MIN_DECIBEL_SPAN {
                    next.max_decibels = min + MIN_DECIBEL_SPAN;
                }
            }
            (None, None) => {}
        }
        if let Some(size) = delta.transform_size {
            next.transform_size = size;
        }
        if let Some(smoothing) = delta.smoothing {
            next.smoothing = smoothing;
        }
        if let Some(geometry) = delta.geometry {
            next.geometry = geometry;
        }
        if let Some(mode) = delta.mode {
            next.mode = mode;
        }
        if let Some(gridlines) = delta.gridlines {
            next.gridlines = gridlines;
        }
        if let Some(bands) = delta.bands {
            next.bands = bands;
        }
        next.validate()?;

        let change = ConfigChange {
            layout: next.transform_size != self.transform_size
                || next.mode != self.mode
                || next.geometry != self.geometry
                || next.bands != self.bands,
            analysis: next.analysis_settings() != self.analysis_settings(),
        };
        *self = next;
        Ok(change)
    }
}
