use micro_spectrum::{AnalysisSettings, SpectrumSource};

/// A single steady tone over a flat noise floor, in decibels.
pub struct ToneSource {
    pub sample_rate: f32,
    pub bins: usize,
    pub tone_hz: f32,
    pub tone_db: f32,
    pub floor_db: f32,
    pub settings: Option<AnalysisSettings>,
}

impl ToneSource {
    pub fn new(bins: usize, tone_hz: f32) -> Self {
        Self {
            sample_rate: 44_100.0,
            bins,
            tone_hz,
            tone_db: -32.0,
            floor_db: -95.0,
            settings: None,
        }
    }

    pub fn tone_bin(&self) -> usize {
        (self.tone_hz * self.bins as f32 / (self.sample_rate * 0.5)) as usize
    }

    pub fn silence(&mut self) {
        self.tone_db = self.floor_db;
    }

    fn decibels_at(&self, bin: usize) -> f32 {
        if bin == self.tone_bin() {
            self.tone_db
        } else {
            self.floor_db
        }
    }
}

impl SpectrumSource for ToneSource {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn frequency_bin_count(&self) -> usize {
        self.bins
    }

    fn configure(&mut self, settings: &AnalysisSettings) {
        self.settings = Some(*settings);
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        let settings = self.settings.expect("configured before the first pull");
        let span = settings.max_decibels - settings.min_decibels;
        for (bin, byte) in out.iter_mut().enumerate() {
            let scaled = (self.decibels_at(bin) - settings.min_decibels) / span * 255.0;
            *byte = scaled.clamp(0.0, 255.0) as u8;
        }
    }

    fn float_frequency_data(&mut self, out: &mut [f32]) {
        for (bin, value) in out.iter_mut().enumerate() {
            *value = self.decibels_at(bin);
        }
    }
}
