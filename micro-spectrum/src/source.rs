use crate::config::AnalysisSettings;

/// The external analysis stage: owns the audio input and the transform.
///
/// The renderer pulls exactly one snapshot per frame through one of the two
/// accessors and never holds on to it past the call.
pub trait SpectrumSource {
    /// Current sample rate in Hz. May change between frames.
    fn sample_rate(&self) -> f32;

    /// Number of bins a snapshot holds, half the transform size.
    fn frequency_bin_count(&self) -> usize;

    /// Called whenever transform size, smoothing or the decibel window change.
    fn configure(&mut self, settings: &AnalysisSettings);

    /// Fills `out` with 0..=255 energy, windowed by the configured decibel range.
    /// Bins beyond `out.len()` are dropped; missing bins are left untouched.
    fn byte_frequency_data(&mut self, out: &mut [u8]);

    /// Fills `out` with native decibel values.
    fn float_frequency_data(&mut self, out: &mut [f32]);
}
