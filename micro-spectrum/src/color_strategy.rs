use alloc::boxed::Box;

use embedded_graphics::{pixelcolor::Rgb888, prelude::*};

use crate::level_quantizer::SegmentColor;

pub struct ColorContext {
    pub element_index: usize,
    pub num_elements: usize,
    pub element_height: f32,
    pub max_element_height: f32,
}

impl ColorContext {
    /// Height as a 0..=255 energy value.
    fn energy(&self) -> u8 {
        if self.max_element_height <= 0.0 {
            return 0;
        }
        (self.element_height / self.max_element_height * 255.0).clamp(0.0, 255.0) as u8
    }
}

pub trait ColorStrategy {
    fn get_color(&self, context: &ColorContext) -> Rgb888;
}

/// Fully saturated colour at `hue` on a 0..255 wheel running red, green, blue.
fn hue_to_rgb(hue: u8) -> Rgb888 {
    let hue = hue % 255;
    let rise = (hue % 85) * 3;
    let fall = 255 - rise;
    match hue / 85 {
        0 => Rgb888::new(fall, rise, 0),
        1 => Rgb888::new(0, fall, rise),
        _ => Rgb888::new(rise, 0, fall),
    }
}

/// Green-cyan ramp that brightens with bar height.
pub struct EnergyColor;
impl ColorStrategy for EnergyColor {
    fn get_color(&self, context: &ColorContext) -> Rgb888 {
        let v = context.energy();
        Rgb888::new(v >> 2, v, 160 - (v >> 1))
    }
}

/// Bright green cap, tinted by how high the held peak sits.
pub struct PeakCapColor;
impl ColorStrategy for PeakCapColor {
    fn get_color(&self, context: &ColorContext) -> Rgb888 {
        let v = context.energy();
        Rgb888::new(0, (v >> 2) + 192, v >> 1)
    }
}

/// Hue follows the column position, independent of height.
pub struct RainbowColor;
impl ColorStrategy for RainbowColor {
    fn get_color(&self, context: &ColorContext) -> Rgb888 {
        if context.num_elements == 0 {
            return Rgb888::BLACK;
        }
        let hue = context.element_index * 255 / context.num_elements;
        hue_to_rgb(hue as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPalette {
    pub off: Rgb888,
    pub normal: Rgb888,
    pub warn: Rgb888,
    pub clip: Rgb888,
    pub held: Rgb888,
}

impl Default for SegmentPalette {
    fn default() -> Self {
        Self {
            off: Rgb888::new(24, 24, 24),
            normal: Rgb888::new(0, 200, 64),
            warn: Rgb888::new(255, 176, 0),
            clip: Rgb888::new(255, 32, 32),
            held: Rgb888::WHITE,
        }
    }
}

impl SegmentPalette {
    pub fn color(&self, segment: SegmentColor) -> Rgb888 {
        match segment {
            SegmentColor::Off => self.off,
            SegmentColor::Normal => self.normal,
            SegmentColor::Warn => self.warn,
            SegmentColor::Clip => self.clip,
        }
    }
}

/// Every colour a frame can use.
pub struct Palette {
    pub background: Rgb888,
    pub bar: Box<dyn ColorStrategy>,
    pub peak: Box<dyn ColorStrategy>,
    pub segments: SegmentPalette,
    pub gridline: Rgb888,
    pub label: Rgb888,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb888::BLACK,
            bar: Box::new(EnergyColor),
            peak: Box::new(PeakCapColor),
            segments: SegmentPalette::default(),
            gridline: Rgb888::WHITE,
            label: Rgb888::new(255, 255, 64),
        }
    }
}

impl Palette {
    /// Default palette with bars coloured by column position.
    pub fn rainbow() -> Self {
        Self {
            bar: Box::new(RainbowColor),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(height: f32, max: f32) -> ColorContext {
        ColorContext {
            element_index: 0,
            num_elements: 1,
            element_height: height,
            max_element_height: max,
        }
    }

    #[test]
    fn test_energy_ramp_endpoints() {
        assert_eq!(EnergyColor.get_color(&context(0.0, 64.0)), Rgb888::new(0, 0, 160));
        assert_eq!(EnergyColor.get_color(&context(64.0, 64.0)), Rgb888::new(63, 255, 33));
    }

    #[test]
    fn test_peak_cap_stays_bright() {
        assert_eq!(PeakCapColor.get_color(&context(0.0, 64.0)), Rgb888::new(0, 192, 0));
        assert_eq!(PeakCapColor.get_color(&context(64.0, 64.0)), Rgb888::new(0, 255, 127));
        assert_eq!(PeakCapColor.get_color(&context(10.0, 0.0)), Rgb888::new(0, 192, 0));
    }

    #[test]
    fn test_rainbow_walks_the_wheel() {
        let at = |index: usize| {
            RainbowColor.get_color(&ColorContext {
                element_index: index,
                num_elements: 3,
                element_height: 0.0,
                max_element_height: 1.0,
            })
        };
        assert_eq!(at(0), Rgb888::new(255, 0, 0));
        assert_eq!(at(1), Rgb888::new(0, 255, 0));
        assert_eq!(at(2), Rgb888::new(0, 0, 255));
        let empty = RainbowColor.get_color(&ColorContext {
            element_index: 0,
            num_elements: 0,
            element_height: 0.0,
            max_element_height: 1.0,
        });
        assert_eq!(empty, Rgb888::BLACK);
    }

    #[test]
    fn test_hue_wraps_back_to_red() {
        assert_eq!(hue_to_rgb(255), hue_to_rgb(0));
        assert_eq!(hue_to_rgb(42), Rgb888::new(129, 126, 0));
    }

    #[test]
    fn test_segment_palette_lookup() {
        let palette = SegmentPalette::default();
        assert_eq!(palette.color(SegmentColor::Off), palette.off);
        assert_eq!(palette.color(SegmentColor::Clip), palette.clip);
    }
}
