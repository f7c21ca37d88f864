use micro_spectrum::{AnalysisSettings, RenderConfig, SpectrumSource};
use rand::{rngs::StdRng, Rng, SeedableRng};

const SWEEP_START_HZ: f32 = 40.0;
const SWEEP_END_HZ: f32 = 16_000.0;
const SWEEP_FRAMES: u32 = 240;
const SWEEP_DB: f32 = -34.0;
const PULSE_HZ: f32 = 60.0;
const PULSE_EVERY: u32 = 30;
const PULSE_DB: f32 = -31.0;
const PULSE_DECAY_DB_PER_FRAME: f32 = 2.5;
const FLOOR_DB_AT_100HZ: f32 = -72.0;
const FLOOR_JITTER_DB: f32 = 3.0;
const TONE_SKIRT_DB_PER_OCTAVE: f32 = 48.0;
const SILENCE_DB: f32 = -160.0;

/// Stand-in analysis stage: a pink-ish noise floor, a log sweep and a
/// decaying bass pulse, smoothed across frames like a real analyser.
///
/// Each pull through either accessor advances one frame.
pub struct SyntheticSpectrum {
    sample_rate: f32,
    settings: AnalysisSettings,
    magnitudes: Vec<f32>,
    frame: u32,
    rng: StdRng,
}

impl SyntheticSpectrum {
    pub fn new(sample_rate: f32, seed: u64) -> Self {
        let settings = RenderConfig::default().analysis_settings();
        Self {
            sample_rate,
            magnitudes: vec![0.0; (settings.transform_size / 2) as usize],
            settings,
            frame: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    fn bin_hz(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate * 0.5 / self.magnitudes.len() as f32
    }

    fn sweep_hz(&self) -> f32 {
        let t = (self.frame % SWEEP_FRAMES) as f32 / SWEEP_FRAMES as f32;
        SWEEP_START_HZ * (SWEEP_END_HZ / SWEEP_START_HZ).powf(t)
    }

    fn pulse_db(&self) -> f32 {
        PULSE_DB - (self.frame % PULSE_EVERY) as f32 * PULSE_DECAY_DB_PER_FRAME
    }

    /// Instantaneous level of `bin` for the current frame.
    fn instant_db(&mut self, bin: usize, sweep_hz: f32, pulse_db: f32) -> f32 {
        let hz = self.bin_hz(bin).max(1.0);
        let floor = FLOOR_DB_AT_100HZ - 10.0 * (hz / 100.0).log10()
            + self.rng.random_range(-FLOOR_JITTER_DB..FLOOR_JITTER_DB);
        // window leakage, steep enough to keep tones narrow on a log axis
        let tone = |center: f32, level: f32| {
            level - TONE_SKIRT_DB_PER_OCTAVE * (hz / center).log2().abs()
        };
        floor.max(tone(sweep_hz, SWEEP_DB)).max(tone(PULSE_HZ, pulse_db))
    }

    /// Advances one frame and blends it into the running magnitudes.
    fn analyse(&mut self) {
        self.frame += 1;
        let sweep_hz = self.sweep_hz();
        let pulse_db = self.pulse_db();
        let tau = self.settings.smoothing;
        for bin in 0..self.magnitudes.len() {
            let current = 10f32.powf(self.instant_db(bin, sweep_hz, pulse_db) / 20.0);
            self.magnitudes[bin] = tau * self.magnitudes[bin] + (1.0 - tau) * current;
        }
    }

    fn decibels(&self, bin: usize) -> f32 {
        let magnitude = self.magnitudes[bin];
        if magnitude > 0.0 {
            20.0 * magnitude.log10()
        } else {
            SILENCE_DB
        }
    }
}

impl SpectrumSource for SyntheticSpectrum {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn frequency_bin_count(&self) -> usize {
        self.magnitudes.len()
    }

    fn configure(&mut self, settings: &AnalysisSettings) {
        let bins = (settings.transform_size / 2) as usize;
        if bins != self.magnitudes.len() {
            self.magnitudes = vec![0.0; bins];
        }
        self.settings = *settings;
        log::debug!(
            "analysis configured: transform {}, smoothing {}, {}..{} dB",
            settings.transform_size,
            settings.smoothing,
            settings.min_decibels,
            settings.max_decibels
        );
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.analyse();
        let min = self.settings.min_decibels;
        let span = self.settings.max_decibels - min;
        for (bin, byte) in out.iter_mut().enumerate().take(self.magnitudes.len()) {
            let scaled = if span > 0.0 {
                (self.decibels(bin) - min) / span * 255.0
            } else {
                0.0
            };
            *byte = scaled.clamp(0.0, 255.0) as u8;
        }
    }

    fn float_frequency_data(&mut self, out: &mut [f32]) {
        self.analyse();
        for (bin, value) in out.iter_mut().enumerate().take(self.magnitudes.len()) {
            *value = self.decibels(bin);
        }
    }
}
