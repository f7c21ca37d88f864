extern crate alloc;

use alloc::vec::Vec;

use libm::{log10f, powf, sqrtf};

use crate::config::{Band, MAX_AUDIBLE_HZ, MIN_AUDIBLE_HZ};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisScale {
    Linear,
    Logarithmic,
}

/// Maps between a horizontal pixel position and a frequency.
///
/// The logarithmic axis spans `log10(20)..log10(min(20k, nyquist))`, the
/// linear axis `0..min(20k, nyquist)`. Both are used for bin edges and for
/// gridline placement so the two never drift apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyAxis {
    scale: AxisScale,
    max_hz: f32,
    min_val: f32,
    max_val: f32,
    width: f32,
}

impl FrequencyAxis {
    pub fn new(scale: AxisScale, sample_rate: f32, width: u32) -> Self {
        let max_hz = MAX_AUDIBLE_HZ.min(sample_rate * 0.5).max(MIN_AUDIBLE_HZ);
        let (min_val, max_val) = match scale {
            AxisScale::Linear => (0.0, max_hz),
            AxisScale::Logarithmic => (log10f(MIN_AUDIBLE_HZ), log10f(max_hz)),
        };
        Self {
            scale,
            max_hz,
            min_val,
            max_val,
            width: width as f32,
        }
    }

    pub fn logarithmic(sample_rate: f32, width: u32) -> Self {
        Self::new(AxisScale::Logarithmic, sample_rate, width)
    }

    pub fn linear(sample_rate: f32, width: u32) -> Self {
        Self::new(AxisScale::Linear, sample_rate, width)
    }

    pub fn scale(&self) -> AxisScale {
        self.scale
    }

    pub fn max_frequency(&self) -> f32 {
        self.max_hz
    }

    /// Frequency at the left edge of pixel column `x`.
    pub fn frequency_at(&self, x: f32) -> f32 {
        let e = x / self.width * (self.max_val - self.min_val) + self.min_val;
        match self.scale {
            AxisScale::Linear => e,
            AxisScale::Logarithmic => powf(10.0, e),
        }
    }

    /// Fractional pixel position of `freq_hz`. May fall outside `0..width`.
    pub fn x_for(&self, freq_hz: f32) -> Option<f32> {
        let e = match self.scale {
            AxisScale::Linear => freq_hz,
            AxisScale::Logarithmic if freq_hz > 0.0 => log10f(freq_hz),
            AxisScale::Logarithmic => return None,
        };
        Some((e - self.min_val) * self.width / (self.max_val - self.min_val))
    }
}

/// Half-open range `[start, end)` of transform bins feeding one column.
///
/// `end <= start` is legal at the coarse low end of a log axis; such a column
/// evaluates its start bin alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnBinRange {
    pub start: usize,
    pub end: usize,
}

impl ColumnBinRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn single(bin: usize) -> Self {
        Self {
            start: bin,
            end: bin + 1,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.end <= self.start
    }
}

/// Transform bin holding `freq_hz`, truncated toward zero and capped at `bin_count`.
pub fn bin_for_frequency(freq_hz: f32, bin_count: usize, sample_rate: f32) -> usize {
    ((freq_hz.max(0.0) * bin_count as f32 / (sample_rate * 0.5)) as usize).min(bin_count)
}

fn ranges_from_axis(
    bin_count: usize,
    sample_rate: f32,
    width: u32,
    scale: AxisScale,
) -> Vec<ColumnBinRange> {
    let axis = FrequencyAxis::new(scale, sample_rate, width);
    let calc_bin = |i: u32| {
        // the far edge is pinned to the exact axis maximum
        let freq = if i == width { axis.max_frequency() } else { axis.frequency_at(i as f32) };
        bin_for_frequency(freq, bin_count, sample_rate)
    };

    let mut ranges = Vec::with_capacity(width as usize);
    let mut prev_bin = 0;
    for i in 0..width {
        let next_bin = calc_bin(i + 1).max(prev_bin);
        ranges.push(ColumnBinRange::new(prev_bin, next_bin));
        prev_bin = next_bin;
    }
    ranges
}

/// Log-axis column table: column `i` aggregates `[edge(i), edge(i + 1))`.
///
/// Column 0 starts at bin 0 so nothing below 20 Hz is dropped on the floor.
pub fn build_column_ranges(
    bin_count: usize,
    sample_rate: f32,
    display_width: u32,
) -> Vec<ColumnBinRange> {
    ranges_from_axis(bin_count, sample_rate, display_width, AxisScale::Logarithmic)
}

pub fn build_linear_column_ranges(
    bin_count: usize,
    sample_rate: f32,
    display_width: u32,
) -> Vec<ColumnBinRange> {
    ranges_from_axis(bin_count, sample_rate, display_width, AxisScale::Linear)
}

/// One range per band, split at the geometric mean between neighbouring centres.
pub fn build_band_ranges(
    bands: &[Band],
    bin_count: usize,
    sample_rate: f32,
) -> Vec<ColumnBinRange> {
    let nyquist = sample_rate * 0.5;
    let edge_bin = |hz: f32| bin_for_frequency(hz.min(nyquist), bin_count, sample_rate);
    let centers: Vec<f32> = bands.iter().map(|band| band.center_hz).collect();

    let lower_edge = |i: usize| -> f32 {
        match i {
            0 if centers.len() > 1 => centers[0] * sqrtf(centers[0] / centers[1]),
            0 => centers[0] / core::f32::consts::SQRT_2,
            _ => sqrtf(centers[i - 1] * centers[i]),
        }
    };
    let upper_edge = |i: usize| -> f32 {
        let last = centers.len() - 1;
        if i < last {
            sqrtf(centers[i] * centers[i + 1])
        } else if last > 0 {
            centers[last] * sqrtf(centers[last] / centers[last - 1])
        } else {
            centers[last] * core::f32::consts::SQRT_2
        }
    };

    let mut prev_end = 0;
    (0..centers.len())
        .map(|i| {
            let start = edge_bin(lower_edge(i)).max(prev_end);
            let end = edge_bin(upper_edge(i)).max(start);
            prev_end = end;
            ColumnBinRange::new(start, end)
        })
        .collect()
}

/// One representative bin per band centre.
pub fn build_band_bins(bands: &[Band], bin_count: usize, sample_rate: f32) -> Vec<ColumnBinRange> {
    let last_bin = bin_count.saturating_sub(1);
    bands
        .iter()
        .map(|band| bin_for_frequency(band.center_hz, bin_count, sample_rate).min(last_bin))
        .map(ColumnBinRange::single)
        .collect()
}

/// Cached column table for one (bin count, sample rate, layout) combination.
///
/// Immutable once built; a change to any input means building a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyBinMapper {
    bin_count: usize,
    sample_rate: f32,
    ranges: Vec<ColumnBinRange>,
}

impl FrequencyBinMapper {
    pub fn for_pixels(bin_count: usize, sample_rate: f32, width: u32, scale: AxisScale) -> Self {
        Self {
            bin_count,
            sample_rate,
            ranges: ranges_from_axis(bin_count, sample_rate, width, scale),
        }
    }

    pub fn for_band_ranges(bin_count: usize, sample_rate: f32, bands: &[Band]) -> Self {
        Self {
            bin_count,
            sample_rate,
            ranges: build_band_ranges(bands, bin_count, sample_rate),
        }
    }

    pub fn for_band_bins(bin_count: usize, sample_rate: f32, bands: &[Band]) -> Self {
        Self {
            bin_count,
            sample_rate,
            ranges: build_band_bins(bands, bin_count, sample_rate),
        }
    }

    pub fn column_ranges(&self) -> &[ColumnBinRange] {
        &self.ranges
    }

    pub fn columns(&self) -> usize {
        self.ranges.len()
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}
