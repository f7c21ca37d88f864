use alloc::vec::Vec;

#[allow(unused_imports)]
use micromath::F32Ext;
use thiserror::Error;

use crate::bin_summary::max_over_range;
use crate::color_strategy::Palette;
use crate::config::{ConfigChange, ConfigDelta, ConfigError, RenderConfig};
use crate::frequency_bin_mapper::ColumnBinRange;
use crate::level_quantizer::{LevelQuantizer, LevelScale};
use crate::peak_tracker::PeakTracker;
use crate::render_strategy::{
    strategy_for, ColumnFrame, FramePlan, PaintContext, RenderStrategy, SnapshotKind,
};
use crate::source::SpectrumSource;
use crate::types::{DrawCommand, MagnitudeSnapshot};

/// A frame that cannot be drawn. Never leaves the renderer: the frame is
/// logged and degrades to background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub enum FrameError {
    #[error("column table has {columns} columns but peak state has {peaks}")]
    ColumnMismatch { columns: usize, peaks: usize },
}

/// Column table and peak state, only ever replaced as a pair.
struct FrameLayout {
    bin_count: usize,
    sample_rate: f32,
    plan: FramePlan,
    peaks: PeakTracker,
}

impl FrameLayout {
    fn build(
        strategy: &dyn RenderStrategy,
        bin_count: usize,
        sample_rate: f32,
        config: &RenderConfig,
    ) -> Self {
        let plan = strategy.plan(bin_count, sample_rate, config);
        let peaks = strategy.new_peaks(plan.columns(), config.geometry);
        viz_log!(
            debug,
            "rebuilt {} layout: {} bins at {} Hz -> {} columns",
            strategy.mode().name(),
            bin_count,
            sample_rate,
            plan.columns()
        );
        Self {
            bin_count,
            sample_rate,
            plan,
            peaks,
        }
    }

    fn matches(&self, bin_count: usize, sample_rate: f32) -> bool {
        self.bin_count == bin_count && self.sample_rate == sample_rate
    }

    fn check(&self) -> Result<(), FrameError> {
        let columns = self.plan.mapper.columns();
        let peaks = self.peaks.columns();
        if columns != peaks || columns != self.plan.slots.len() {
            return Err(FrameError::ColumnMismatch { columns, peaks });
        }
        Ok(())
    }
}

/// Per-frame orchestration: aggregate, quantize, track peaks, overlay gridlines.
///
/// The column table and peak state are derived from the config, the
/// snapshot length and the sample rate. Whenever any of those change both
/// are rebuilt together before the frame that needs them.
pub struct SpectrumRenderer {
    config: RenderConfig,
    palette: Palette,
    quantizer: LevelQuantizer,
    layout: Option<FrameLayout>,
    analysis_dirty: bool,
    window_warned: bool,
    bytes: Vec<u8>,
    decibels: Vec<f32>,
}

impl SpectrumRenderer {
    pub fn new(config: RenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            palette: Palette::default(),
            quantizer: LevelQuantizer::default(),
            layout: None,
            analysis_dirty: true,
            window_warned: false,
            bytes: Vec::new(),
            decibels: Vec::new(),
        })
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Validated partial update. On error nothing changes.
    pub fn apply_config(&mut self, delta: ConfigDelta) -> Result<ConfigChange, ConfigError> {
        match self.config.apply(delta) {
            Ok(change) => {
                if change.layout {
                    self.layout = None;
                }
                if change.analysis {
                    self.analysis_dirty = true;
                }
                self.window_warned = false;
                viz_log!(
                    info,
                    "config accepted: mode {}, {}..{} dB, transform {}",
                    self.config.mode.name(),
                    self.config.min_decibels,
                    self.config.max_decibels,
                    self.config.transform_size
                );
                Ok(change)
            }
            Err(err) => {
                viz_log!(warn, "config rejected: {}", err);
                Err(err)
            }
        }
    }

    /// Columns in the current table, 0 before the first frame or after a
    /// layout change.
    pub fn columns(&self) -> usize {
        self.layout.as_ref().map_or(0, |layout| layout.plan.columns())
    }

    pub fn column_ranges(&self) -> Option<&[ColumnBinRange]> {
        self.layout.as_ref().map(|layout| layout.plan.mapper.column_ranges())
    }

    pub fn peaks(&self) -> Option<&PeakTracker> {
        self.layout.as_ref().map(|layout| &layout.peaks)
    }

    /// Zeroes every held peak without touching the column table.
    pub fn reset_peaks(&mut self) {
        if let Some(layout) = self.layout.as_mut() {
            let columns = layout.plan.columns();
            layout.peaks.reset(columns);
        }
    }

    /// One display frame: pulls a single snapshot from `source` and returns
    /// the draw commands for it.
    ///
    /// Pending analysis settings are pushed to the source first. LED band
    /// mode reads native decibels, every other mode reads bytes.
    pub fn render<S: SpectrumSource + ?Sized>(&mut self, source: &mut S) -> Vec<DrawCommand> {
        if self.analysis_dirty {
            source.configure(&self.config.analysis_settings());
            self.analysis_dirty = false;
        }
        if !self.config.decibel_window_is_valid() {
            return self.background_frame();
        }

        let bin_count = source.frequency_bin_count();
        let sample_rate = source.sample_rate();
        match strategy_for(self.config.mode).snapshot_kind() {
            SnapshotKind::Byte => {
                let mut bytes = core::mem::take(&mut self.bytes);
                bytes.clear();
                bytes.resize(bin_count, 0);
                source.byte_frequency_data(&mut bytes);
                let commands = self.render_snapshot(MagnitudeSnapshot::Byte(&bytes), sample_rate);
                self.bytes = bytes;
                commands
            }
            SnapshotKind::Decibel => {
                let mut decibels = core::mem::take(&mut self.decibels);
                decibels.clear();
                decibels.resize(bin_count, f32::NEG_INFINITY);
                source.float_frequency_data(&mut decibels);
                let commands =
                    self.render_snapshot(MagnitudeSnapshot::Decibel(&decibels), sample_rate);
                self.decibels = decibels;
                commands
            }
        }
    }

    /// The same pipeline as [`render`](Self::render) for a snapshot the
    /// caller already holds. The snapshot length is the bin count.
    pub fn render_snapshot(
        &mut self,
        snapshot: MagnitudeSnapshot<'_>,
        sample_rate: f32,
    ) -> Vec<DrawCommand> {
        if !self.config.decibel_window_is_valid() {
            return self.background_frame();
        }

        let strategy = strategy_for(self.config.mode);
        let bin_count = snapshot.len();
        if !self
            .layout
            .as_ref()
            .is_some_and(|layout| layout.matches(bin_count, sample_rate))
        {
            self.layout = Some(FrameLayout::build(strategy, bin_count, sample_rate, &self.config));
        }

        let mut out = Vec::new();
        out.push(DrawCommand::Clear(self.palette.background));
        let Some(layout) = self.layout.as_mut() else {
            return out;
        };
        if let Err(err) = layout.check() {
            viz_log!(error, "dropping frame: {}", err);
            // the next frame rebuilds the pair from scratch
            self.layout = None;
            return out;
        }

        let scale = match snapshot {
            MagnitudeSnapshot::Byte(_) => LevelScale::Byte,
            MagnitudeSnapshot::Decibel(_) => LevelScale::Decibel {
                min: self.config.min_decibels,
                max: self.config.max_decibels,
            },
        };
        let ctx = PaintContext {
            geometry: self.config.geometry,
            palette: &self.palette,
            quantizer: &self.quantizer,
            scale,
            columns: layout.plan.columns(),
        };
        let led = self.config.mode.is_led();
        let columns = layout.plan.mapper.column_ranges().iter().zip(&layout.plan.slots);
        for (index, (range, slot)) in columns.enumerate() {
            let column = ColumnFrame {
                index,
                slot: *slot,
                value: max_over_range(&snapshot, *range),
                band: if led { self.config.bands.get(index) } else { None },
            };
            strategy.paint_column(&column, &ctx, &mut layout.peaks, &mut out);
        }

        let width = self.config.geometry.width as i32;
        for mark in self.config.gridlines.marks() {
            let Some(x) = layout.plan.grid.x_for(mark.freq_hz) else {
                continue;
            };
            let x = x.round() as i32;
            if (0..width).contains(&x) {
                out.push(DrawCommand::Gridline {
                    x,
                    label: mark.label,
                    line_color: self.palette.gridline,
                    label_color: self.palette.label,
                });
            }
        }
        out
    }

    fn background_frame(&mut self) -> Vec<DrawCommand> {
        if !self.window_warned {
            viz_log!(
                warn,
                "decibel window {}..{} is empty, drawing background only",
                self.config.min_decibels,
                self.config.max_decibels
            );
            self.window_warned = true;
        }
        alloc::vec![DrawCommand::Clear(self.palette.background)]
    }
}
