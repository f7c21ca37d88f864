use embedded_graphics::{pixelcolor::Rgb888, primitives::Rectangle};

/// One frame of per-bin magnitudes, evenly spaced from 0 Hz to Nyquist.
///
/// Borrowed for exactly one render call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MagnitudeSnapshot<'a> {
    /// Energy already mapped to 0..=255 by the analysis stage.
    Byte(&'a [u8]),
    /// Native decibel values, read against the configured decibel window.
    Decibel(&'a [f32]),
}

impl MagnitudeSnapshot<'_> {
    pub fn len(&self) -> usize {
        match self {
            MagnitudeSnapshot::Byte(bins) => bins.len(),
            MagnitudeSnapshot::Decibel(bins) => bins.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which part of the picture a filled rectangle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Bar,
    Segment,
    Peak,
}

/// A single primitive for the external drawing surface.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole surface.
    Clear(Rgb888),
    Fill {
        area: Rectangle,
        color: Rgb888,
        layer: Layer,
    },
    /// Full-height reference line with a label at the bottom edge.
    Gridline {
        x: i32,
        label: &'static str,
        line_color: Rgb888,
        label_color: Rgb888,
    },
}

impl DrawCommand {
    pub fn layer(&self) -> Option<Layer> {
        match self {
            DrawCommand::Fill { layer, .. } => Some(*layer),
            _ => None,
        }
    }
}
