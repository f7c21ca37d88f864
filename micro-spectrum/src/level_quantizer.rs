use crate::config::{BandWindow, YDIV};

/// Units of an aggregated magnitude and the range that maps onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelScale {
    /// 0..=255 energy, already windowed by the analysis stage.
    Byte,
    Decibel { min: f32, max: f32 },
}

impl LevelScale {
    /// `(value - min) / (max - min)` clamped to [0, 1]. NaN maps to 0.
    pub fn normalize(&self, value: f32) -> f32 {
        let (min, max) = match *self {
            LevelScale::Byte => (0.0, 255.0),
            LevelScale::Decibel { min, max } => (min, max),
        };
        if max <= min {
            return 0.0;
        }
        clamp01((value - min) / (max - min))
    }
}

pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentColor {
    Off,
    Normal,
    Warn,
    Clip,
}

/// Turns a level into a count of lit LED segments and colours each segment.
///
/// The warn band starts at 4/5 of the column and the clip band is the top
/// twentieth (at least one segment); both follow `segments` when it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelQuantizer {
    segments: u32,
    warn_from: u32,
    clip_from: u32,
}

impl Default for LevelQuantizer {
    fn default() -> Self {
        Self::new(YDIV)
    }
}

impl LevelQuantizer {
    pub fn new(segments: u32) -> Self {
        let segments = segments.max(1);
        Self {
            segments,
            warn_from: segments * 4 / 5,
            clip_from: segments - (segments / 20).max(1),
        }
    }

    pub fn segments(&self) -> u32 {
        self.segments
    }

    pub fn set_segments(&mut self, segments: u32) {
        *self = Self::new(segments);
    }

    /// Lit segment count for `magnitude`, always within `0..=segments`.
    pub fn quantize(&self, magnitude: f32, scale: LevelScale, window: Option<BandWindow>) -> u32 {
        self.quantize_normalized(scale.normalize(magnitude), window)
    }

    /// Same as [`quantize`](Self::quantize) for a value already in [0, 1].
    ///
    /// A band window stretches `window.min..window.max` over the full column,
    /// so bands with little natural energy can still reach the top.
    pub fn quantize_normalized(&self, normalized: f32, window: Option<BandWindow>) -> u32 {
        let mut v = clamp01(normalized);
        if let Some(window) = window.filter(|w| w.max > w.min) {
            v = (v - window.min) * (1.0 / (window.max - window.min));
        }
        let lit = v * self.segments as f32;
        if lit.is_nan() || lit <= 0.0 {
            0
        } else {
            (lit as u32).min(self.segments)
        }
    }

    /// Colour of segment `index` (0 at the bottom) in a column with `lit` segments on.
    pub fn segment_color(&self, index: u32, lit: u32) -> SegmentColor {
        if index >= lit {
            SegmentColor::Off
        } else if index >= self.clip_from {
            SegmentColor::Clip
        } else if index >= self.warn_from {
            SegmentColor::Warn
        } else {
            SegmentColor::Normal
        }
    }
}
