use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay};
use micro_spectrum::{
    color_strategy::Palette, config::TRANSFORM_SIZE_OPTIONS, surface::draw_commands, ConfigDelta,
    DisplayGeometry, DrawCommand, Gridlines, RenderConfig, RenderMode, SpectrumRenderer,
};

mod synthetic;
use synthetic::SyntheticSpectrum;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GridChoice {
    Off,
    Canonical,
    Dense,
}

impl From<GridChoice> for Gridlines {
    fn from(choice: GridChoice) -> Self {
        match choice {
            GridChoice::Off => Gridlines::Off,
            GridChoice::Canonical => Gridlines::Canonical,
            GridChoice::Dense => Gridlines::Dense,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BarColors {
    /// Brightens with bar height.
    Energy,
    /// Hue follows the column.
    Rainbow,
}

impl BarColors {
    fn palette(self) -> Palette {
        match self {
            BarColors::Energy => Palette::default(),
            BarColors::Rainbow => Palette::rainbow(),
        }
    }
}

fn parse_fft_size(value: &str) -> Result<u32, String> {
    let size: u32 = value.parse().map_err(|err: std::num::ParseIntError| err.to_string())?;
    if TRANSFORM_SIZE_OPTIONS.contains(&size) {
        Ok(size)
    } else {
        Err(format!(
            "transform size {} not offered, expected one of {:?}",
            size, TRANSFORM_SIZE_OPTIONS
        ))
    }
}

fn parse_mode(name: &str) -> Result<RenderMode, String> {
    RenderMode::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = RenderMode::ALL.iter().map(|mode| mode.name()).collect();
        format!("unknown mode '{}', expected one of {}", name, known.join(", "))
    })
}

/// Drives the spectrum renderer from a synthetic analyser and saves the last frame.
#[derive(Debug, Parser)]
#[command(name = "micro-spectrum-simulator", version)]
struct Args {
    #[arg(long, default_value_t = 128)]
    width: u32,
    #[arg(long, default_value_t = 64)]
    height: u32,
    /// linear, log, led-block or led-band
    #[arg(long, default_value = "log", value_parser = parse_mode)]
    mode: RenderMode,
    #[arg(long, default_value_t = 120)]
    frames: u32,
    #[arg(long, default_value_t = 4096, value_parser = parse_fft_size)]
    fft_size: u32,
    #[arg(long, default_value_t = 44_100.0)]
    sample_rate: f32,
    #[arg(long, default_value_t = -70.0, allow_negative_numbers = true)]
    min_db: f32,
    #[arg(long, default_value_t = -30.0, allow_negative_numbers = true)]
    max_db: f32,
    #[arg(long, default_value_t = 0.8)]
    smoothing: f32,
    #[arg(long, value_enum, default_value_t = GridChoice::Canonical)]
    gridlines: GridChoice,
    #[arg(long, value_enum, default_value_t = BarColors::Energy)]
    bar_colors: BarColors,
    /// Seed for the synthetic noise floor.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Pixel scale of the saved image.
    #[arg(long, default_value_t = 4)]
    scale: u32,
    #[arg(long, default_value = "spectrum.png")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut renderer = SpectrumRenderer::new(RenderConfig {
        mode: args.mode,
        gridlines: args.gridlines.into(),
        geometry: DisplayGeometry::new(args.width, args.height),
        ..RenderConfig::default()
    })
    .context("invalid display settings")?
    .with_palette(args.bar_colors.palette());
    renderer
        .apply_config(ConfigDelta {
            min_decibels: Some(args.min_db),
            max_decibels: Some(args.max_db),
            transform_size: Some(args.fft_size),
            smoothing: Some(args.smoothing),
            ..Default::default()
        })
        .context("invalid analysis settings")?;

    let mut source = SyntheticSpectrum::new(args.sample_rate, args.seed);
    let mut commands: Vec<DrawCommand> = Vec::new();
    for _ in 0..args.frames {
        commands = renderer.render(&mut source);
    }
    log::info!(
        "rendered {} frames in {} mode, {} columns, {} commands in the last frame",
        source.frame(),
        args.mode.name(),
        renderer.columns(),
        commands.len()
    );

    let mut display: SimulatorDisplay<Rgb888> =
        SimulatorDisplay::new(Size::new(args.width, args.height));
    draw_commands(&mut display, &commands)?;

    let output_settings = OutputSettingsBuilder::new().scale(args.scale.max(1)).build();
    display
        .to_rgb_output_image(&output_settings)
        .save_png(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    log::info!("saved {}", args.output.display());
    Ok(())
}
