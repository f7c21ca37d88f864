use alloc::vec::Vec;

use embedded_graphics::{
    geometry::{Point, Size},
    primitives::Rectangle,
};
use libm::log10f;
#[allow(unused_imports)]
use micromath::F32Ext;

use crate::color_strategy::{ColorContext, Palette};
use crate::config::{Band, DisplayGeometry, RenderConfig, RenderMode, PEAK_CAP_HEIGHT};
use crate::frequency_bin_mapper::{AxisScale, FrequencyAxis, FrequencyBinMapper};
use crate::level_quantizer::{LevelQuantizer, LevelScale};
use crate::peak_tracker::{GravityPeaks, PeakTracker, StepHoldPeaks};
use crate::types::{DrawCommand, Layer};

/// Which accessor of the analysis stage a mode reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Byte,
    Decibel,
}

/// Horizontal placement of one column in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSlot {
    pub x: i32,
    pub width: u32,
}

/// Frequency to x for gridlines, sharing the transform the columns use.
#[derive(Debug, Clone, PartialEq)]
pub enum GridAxis {
    Pixels(FrequencyAxis),
    /// Log-interpolated between the centres of neighbouring band columns.
    Bands { log_centers: Vec<f32>, x_centers: Vec<f32> },
}

impl GridAxis {
    pub fn x_for(&self, freq_hz: f32) -> Option<f32> {
        match self {
            GridAxis::Pixels(axis) => axis.x_for(freq_hz),
            GridAxis::Bands { log_centers, x_centers } => {
                if freq_hz <= 0.0 {
                    return None;
                }
                let e = log10f(freq_hz);
                if log_centers.len() == 1 {
                    return (e == log_centers[0]).then(|| x_centers[0]);
                }
                let k = log_centers.windows(2).position(|w| w[0] <= e && e <= w[1])?;
                let t = (e - log_centers[k]) / (log_centers[k + 1] - log_centers[k]);
                Some(x_centers[k] + t * (x_centers[k + 1] - x_centers[k]))
            }
        }
    }
}

/// Everything a mode derives from (bin count, sample rate, config).
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub mapper: FrequencyBinMapper,
    pub slots: Vec<ColumnSlot>,
    pub grid: GridAxis,
}

impl FramePlan {
    pub fn columns(&self) -> usize {
        self.slots.len()
    }
}

/// Read-only inputs shared by every column of a frame.
pub struct PaintContext<'a> {
    pub geometry: DisplayGeometry,
    pub palette: &'a Palette,
    pub quantizer: &'a LevelQuantizer,
    pub scale: LevelScale,
    pub columns: usize,
}

/// One column's aggregated input for this frame.
#[derive(Debug, Clone, Copy)]
pub struct ColumnFrame<'a> {
    pub index: usize,
    pub slot: ColumnSlot,
    /// Max over the column's bins; `None` if the range lies past the snapshot.
    pub value: Option<f32>,
    pub band: Option<&'a Band>,
}

/// One of the four render modes. Aggregation and gridlines are shared by the
/// renderer; a strategy only decides the column layout and how a column's
/// value turns into rectangles.
pub trait RenderStrategy {
    fn mode(&self) -> RenderMode;
    fn snapshot_kind(&self) -> SnapshotKind;
    fn plan(&self, bin_count: usize, sample_rate: f32, config: &RenderConfig) -> FramePlan;
    fn new_peaks(&self, columns: usize, geometry: DisplayGeometry) -> PeakTracker;
    fn paint_column(
        &self,
        column: &ColumnFrame<'_>,
        ctx: &PaintContext<'_>,
        peaks: &mut PeakTracker,
        out: &mut Vec<DrawCommand>,
    );
}

pub struct LinearBars;
pub struct LogBars;
pub struct LedBlock;
pub struct LedBands;

static LINEAR_BARS: LinearBars = LinearBars;
static LOG_BARS: LogBars = LogBars;
static LED_BLOCK: LedBlock = LedBlock;
static LED_BANDS: LedBands = LedBands;

pub fn strategy_for(mode: RenderMode) -> &'static dyn RenderStrategy {
    match mode {
        RenderMode::Linear => &LINEAR_BARS,
        RenderMode::Logarithmic => &LOG_BARS,
        RenderMode::LedBlock => &LED_BLOCK,
        RenderMode::LedBand => &LED_BANDS,
    }
}

fn pixel_plan(
    bin_count: usize,
    sample_rate: f32,
    geometry: DisplayGeometry,
    scale: AxisScale,
) -> FramePlan {
    let width = geometry.width;
    FramePlan {
        mapper: FrequencyBinMapper::for_pixels(bin_count, sample_rate, width, scale),
        slots: (0..width).map(|x| ColumnSlot { x: x as i32, width: 1 }).collect(),
        grid: GridAxis::Pixels(FrequencyAxis::new(scale, sample_rate, width)),
    }
}

/// Evenly pitched band columns, centred, with a one pixel gutter when there is room.
pub fn band_slots(width: u32, count: usize) -> Vec<ColumnSlot> {
    if count == 0 {
        return Vec::new();
    }
    let pitch = (width / count as u32).max(1);
    let slot_width = if pitch > 2 { pitch - 1 } else { pitch };
    let margin = width.saturating_sub(pitch * count as u32) / 2;
    (0..count as u32)
        .map(|i| ColumnSlot {
            x: (margin + i * pitch) as i32,
            width: slot_width,
        })
        .collect()
}

fn band_plan(mapper: FrequencyBinMapper, bands: &[Band], geometry: DisplayGeometry) -> FramePlan {
    let slots = band_slots(geometry.width, bands.len());
    let grid = GridAxis::Bands {
        log_centers: bands.iter().map(|band| log10f(band.center_hz)).collect(),
        x_centers: slots.iter().map(|slot| slot.x as f32 + slot.width as f32 * 0.5).collect(),
    };
    FramePlan { mapper, slots, grid }
}

/// Continuous bar plus a falling 2 px cap once the peak detaches from the bar.
fn paint_bar(
    column: &ColumnFrame<'_>,
    ctx: &PaintContext<'_>,
    peaks: &mut PeakTracker,
    out: &mut Vec<DrawCommand>,
) {
    let height = ctx.geometry.height;
    let level = column.value.map_or(0.0, |v| ctx.scale.normalize(v));
    let bar_height = ((level * height as f32) as u32).min(height);
    let color_ctx = |element_height: f32| ColorContext {
        element_index: column.index,
        num_elements: ctx.columns,
        element_height,
        max_element_height: height as f32,
    };

    if bar_height > 0 {
        out.push(DrawCommand::Fill {
            area: Rectangle::new(
                Point::new(column.slot.x, (height - bar_height) as i32),
                Size::new(column.slot.width, bar_height),
            ),
            color: ctx.palette.bar.get_color(&color_ctx(bar_height as f32)),
            layer: Layer::Bar,
        });
    }

    let held = peaks.update(column.index, bar_height as f32);
    if held > bar_height as f32 {
        let cap_y = height as i32 - 1 - held.round() as i32;
        out.push(DrawCommand::Fill {
            area: Rectangle::new(
                Point::new(column.slot.x, cap_y.max(0)),
                Size::new(column.slot.width, PEAK_CAP_HEIGHT),
            ),
            color: ctx.palette.peak.get_color(&color_ctx(held)),
            layer: Layer::Peak,
        });
    }
}

/// A full stack of LED segments; the held peak segment replaces its slot.
fn paint_segments(
    column: &ColumnFrame<'_>,
    ctx: &PaintContext<'_>,
    peaks: &mut PeakTracker,
    out: &mut Vec<DrawCommand>,
) {
    let quantizer = ctx.quantizer;
    let segments = quantizer.segments();
    let window = column.band.and_then(|band| band.window);
    let lit = column.value.map_or(0, |v| quantizer.quantize(v, ctx.scale, window));
    let held = peaks.update(column.index, lit as f32) as u32;

    for j in 0..segments {
        let is_held = held > lit && j + 1 == held;
        let (color, layer) = if is_held {
            (ctx.palette.segments.held, Layer::Peak)
        } else {
            (ctx.palette.segments.color(quantizer.segment_color(j, lit)), Layer::Segment)
        };
        let (y, segment_height) = segment_rows(j, segments, ctx.geometry.height);
        out.push(DrawCommand::Fill {
            area: Rectangle::new(
                Point::new(column.slot.x, y),
                Size::new(column.slot.width, segment_height),
            ),
            color,
            layer,
        });
    }
}

/// Top row and height of segment `j`, counted from the bottom.
///
/// Edges sit at `j * height / segments`, so the stack always spans the full
/// height. On a display shorter than the stack neighbouring segments share
/// a row; the lowest one is never pushed below the bottom edge.
pub fn segment_rows(j: u32, segments: u32, height: u32) -> (i32, u32) {
    let segments = segments.max(1);
    let top = height - ((j + 1) * height / segments);
    let bottom = height - (j * height / segments);
    let span = bottom - top;
    let segment_height = if span > 1 { span - 1 } else { 1 };
    (top.min(height.saturating_sub(1)) as i32, segment_height)
}

impl RenderStrategy for LinearBars {
    fn mode(&self) -> RenderMode {
        RenderMode::Linear
    }

    fn snapshot_kind(&self) -> SnapshotKind {
        SnapshotKind::Byte
    }

    fn plan(&self, bin_count: usize, sample_rate: f32, config: &RenderConfig) -> FramePlan {
        pixel_plan(bin_count, sample_rate, config.geometry, AxisScale::Linear)
    }

    fn new_peaks(&self, columns: usize, geometry: DisplayGeometry) -> PeakTracker {
        PeakTracker::Gravity(GravityPeaks::for_height(columns, geometry.height))
    }

    fn paint_column(
        &self,
        column: &ColumnFrame<'_>,
        ctx: &PaintContext<'_>,
        peaks: &mut PeakTracker,
        out: &mut Vec<DrawCommand>,
    ) {
        paint_bar(column, ctx, peaks, out);
    }
}

impl RenderStrategy for LogBars {
    fn mode(&self) -> RenderMode {
        RenderMode::Logarithmic
    }

    fn snapshot_kind(&self) -> SnapshotKind {
        SnapshotKind::Byte
    }

    fn plan(&self, bin_count: usize, sample_rate: f32, config: &RenderConfig) -> FramePlan {
        pixel_plan(bin_count, sample_rate, config.geometry, AxisScale::Logarithmic)
    }

    fn new_peaks(&self, columns: usize, geometry: DisplayGeometry) -> PeakTracker {
        PeakTracker::Gravity(GravityPeaks::for_height(columns, geometry.height))
    }

    fn paint_column(
        &self,
        column: &ColumnFrame<'_>,
        ctx: &PaintContext<'_>,
        peaks: &mut PeakTracker,
        out: &mut Vec<DrawCommand>,
    ) {
        paint_bar(column, ctx, peaks, out);
    }
}

impl RenderStrategy for LedBlock {
    fn mode(&self) -> RenderMode {
        RenderMode::LedBlock
    }

    fn snapshot_kind(&self) -> SnapshotKind {
        SnapshotKind::Byte
    }

    fn plan(&self, bin_count: usize, sample_rate: f32, config: &RenderConfig) -> FramePlan {
        let mapper = FrequencyBinMapper::for_band_ranges(bin_count, sample_rate, &config.bands);
        band_plan(mapper, &config.bands, config.geometry)
    }

    fn new_peaks(&self, columns: usize, _geometry: DisplayGeometry) -> PeakTracker {
        PeakTracker::StepHold(StepHoldPeaks::with_defaults(columns))
    }

    fn paint_column(
        &self,
        column: &ColumnFrame<'_>,
        ctx: &PaintContext<'_>,
        peaks: &mut PeakTracker,
        out: &mut Vec<DrawCommand>,
    ) {
        paint_segments(column, ctx, peaks, out);
    }
}

impl RenderStrategy for LedBands {
    fn mode(&self) -> RenderMode {
        RenderMode::LedBand
    }

    fn snapshot_kind(&self) -> SnapshotKind {
        SnapshotKind::Decibel
    }

    fn plan(&self, bin_count: usize, sample_rate: f32, config: &RenderConfig) -> FramePlan {
        let mapper = FrequencyBinMapper::for_band_bins(bin_count, sample_rate, &config.bands);
        band_plan(mapper, &config.bands, config.geometry)
    }

    fn new_peaks(&self, columns: usize, _geometry: DisplayGeometry) -> PeakTracker {
        PeakTracker::StepHold(StepHoldPeaks::with_defaults(columns))
    }

    fn paint_column(
        &self,
        column: &ColumnFrame<'_>,
        ctx: &PaintContext<'_>,
        peaks: &mut PeakTracker,
        out: &mut Vec<DrawCommand>,
    ) {
        paint_segments(column, ctx, peaks, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OCTAVE_BANDS;
    use approx::assert_abs_diff_eq;

    fn ctx<'a>(
        palette: &'a Palette,
        quantizer: &'a LevelQuantizer,
        height: u32,
    ) -> PaintContext<'a> {
        PaintContext {
            geometry: DisplayGeometry::new(8, height),
            palette,
            quantizer,
            scale: LevelScale::Byte,
            columns: 8,
        }
    }

    fn column(value: f32) -> ColumnFrame<'static> {
        ColumnFrame {
            index: 0,
            slot: ColumnSlot { x: 3, width: 1 },
            value: Some(value),
            band: None,
        }
    }

    #[test]
    fn test_strategies_report_their_mode() {
        for mode in RenderMode::ALL {
            assert_eq!(strategy_for(mode).mode(), mode);
        }
        assert_eq!(strategy_for(RenderMode::LedBand).snapshot_kind(), SnapshotKind::Decibel);
        assert_eq!(strategy_for(RenderMode::LedBlock).snapshot_kind(), SnapshotKind::Byte);
    }

    #[test]
    fn test_bar_height_follows_byte_value() {
        let palette = Palette::default();
        let quantizer = LevelQuantizer::default();
        let mut peaks = LogBars.new_peaks(1, DisplayGeometry::new(8, 64));
        let mut out = Vec::new();
        // 100 / 255 * 64 = 25.1
        LogBars.paint_column(&column(100.0), &ctx(&palette, &quantizer, 64), &mut peaks, &mut out);
        assert_eq!(out.len(), 1);
        match &out[0] {
            DrawCommand::Fill { area, layer, .. } => {
                assert_eq!(*layer, Layer::Bar);
                assert_eq!(area.top_left, Point::new(3, 39));
                assert_eq!(area.size, Size::new(1, 25));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cap_appears_once_the_bar_drops() {
        let palette = Palette::default();
        let quantizer = LevelQuantizer::default();
        let mut peaks = LogBars.new_peaks(1, DisplayGeometry::new(8, 64));
        let mut out = Vec::new();
        // 50 px, then 12 px
        LogBars.paint_column(&column(200.0), &ctx(&palette, &quantizer, 64), &mut peaks, &mut out);
        out.clear();
        LogBars.paint_column(&column(50.0), &ctx(&palette, &quantizer, 64), &mut peaks, &mut out);
        let cap = out.iter().find(|cmd| cmd.layer() == Some(Layer::Peak)).unwrap();
        if let DrawCommand::Fill { area, .. } = cap {
            assert_eq!(area.size, Size::new(1, PEAK_CAP_HEIGHT));
            // held = 50 - 64/4096, rounds back to 50
            assert_eq!(area.top_left, Point::new(3, 64 - 1 - 50));
        }
    }

    #[test]
    fn test_empty_column_draws_nothing() {
        let palette = Palette::default();
        let quantizer = LevelQuantizer::default();
        let mut peaks = LinearBars.new_peaks(1, DisplayGeometry::new(8, 64));
        let mut out = Vec::new();
        let silent = ColumnFrame { value: None, ..column(0.0) };
        LinearBars.paint_column(&silent, &ctx(&palette, &quantizer, 64), &mut peaks, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_segments_fill_a_full_stack() {
        let palette = Palette::default();
        let quantizer = LevelQuantizer::new(20);
        let mut peaks = LedBlock.new_peaks(1, DisplayGeometry::new(8, 100));
        let mut out = Vec::new();
        // 255 * 0.5 -> 10 lit segments of 20
        let ctx = ctx(&palette, &quantizer, 100);
        LedBlock.paint_column(&column(127.5), &ctx, &mut peaks, &mut out);
        assert_eq!(out.len(), 20);
        let lit = out
            .iter()
            .filter(|cmd| {
                matches!(cmd, DrawCommand::Fill { color, .. } if *color == palette.segments.normal)
            })
            .count();
        assert_eq!(lit, 10);
        if let DrawCommand::Fill { area, .. } = &out[0] {
            assert_eq!(area.top_left, Point::new(3, 95));
            assert_eq!(area.size, Size::new(1, 4));
        }
    }

    #[test]
    fn test_held_segment_marks_the_peak() {
        let palette = Palette::default();
        let quantizer = LevelQuantizer::new(20);
        let mut peaks = LedBlock.new_peaks(1, DisplayGeometry::new(8, 100));
        let mut out = Vec::new();
        let ctx = ctx(&palette, &quantizer, 100);
        LedBlock.paint_column(&column(255.0), &ctx, &mut peaks, &mut out);
        out.clear();
        LedBlock.paint_column(&column(0.0), &ctx, &mut peaks, &mut out);
        let held: Vec<&DrawCommand> =
            out.iter().filter(|cmd| cmd.layer() == Some(Layer::Peak)).collect();
        assert_eq!(held.len(), 1);
        if let DrawCommand::Fill { area, color, .. } = held[0] {
            assert_eq!(*color, palette.segments.held);
            assert_eq!(area.top_left.y, 0);
        }
    }

    #[test]
    fn test_segment_stack_fits_a_short_display() {
        let palette = Palette::default();
        let quantizer = LevelQuantizer::new(20);
        let mut peaks = LedBlock.new_peaks(1, DisplayGeometry::new(8, 12));
        let mut out = Vec::new();
        LedBlock.paint_column(
            &column(255.0),
            &ctx(&palette, &quantizer, 12),
            &mut peaks,
            &mut out,
        );
        assert_eq!(out.len(), 20);
        for cmd in &out {
            if let DrawCommand::Fill { area, .. } = cmd {
                assert!(area.top_left.y >= 0, "segment at {:?}", area);
                assert!(area.top_left.y + area.size.height as i32 <= 12, "segment at {:?}", area);
            }
        }
        // the clip segment lands on the top row
        if let DrawCommand::Fill { area, color, .. } = &out[19] {
            assert_eq!(area.top_left.y, 0);
            assert_eq!(*color, palette.segments.clip);
        }
        if let DrawCommand::Fill { area, .. } = &out[0] {
            assert_eq!(area.top_left.y, 11);
        }
    }

    #[test]
    fn test_segment_rows_match_even_pitch() {
        assert_eq!(segment_rows(0, 20, 100), (95, 4));
        assert_eq!(segment_rows(19, 20, 100), (0, 4));
        assert_eq!(segment_rows(18, 20, 40), (2, 1));
        assert_eq!(segment_rows(0, 20, 1), (0, 1));
        assert_eq!(segment_rows(19, 20, 1), (0, 1));
    }

    #[test]
    fn test_band_slots_are_centred() {
        let slots = band_slots(100, 10);
        assert_eq!(slots[0], ColumnSlot { x: 0, width: 9 });
        assert_eq!(slots[9], ColumnSlot { x: 90, width: 9 });
        let slots = band_slots(64, 7);
        assert_eq!(slots[0].x, 0);
        assert_eq!(slots[0].width, 8);
        assert!(band_slots(64, 0).is_empty());
        assert_eq!(band_slots(3, 10)[9], ColumnSlot { x: 9, width: 1 });
    }

    #[test]
    fn test_band_grid_interpolates_between_centres() {
        let config = RenderConfig {
            geometry: DisplayGeometry::new(100, 40),
            ..RenderConfig::default()
        };
        let plan = LedBlock.plan(1024, 44_100.0, &config);
        assert_eq!(plan.columns(), OCTAVE_BANDS.len());
        // 1 kHz is band 5's centre, 2 kHz band 6's
        assert_abs_diff_eq!(plan.grid.x_for(1_000.0).unwrap(), 54.5, epsilon = 0.01);
        let mid = plan.grid.x_for(1_414.2).unwrap();
        assert!(mid > 54.5 && mid < 64.5);
        assert_eq!(plan.grid.x_for(20_000.0), None);
    }
}
