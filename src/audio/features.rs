//! Per-frame spectral features: amplitude spectrum, RMS and loudness.
//!
//! Loudness follows the usual Bark-band model: the amplitude spectrum is
//! split into 24 bands of equal Bark width, each band's summed amplitude is
//! compressed with exponent 0.23, and the band values are totalled.

use super::{AudioError, SpectrumAnalyzer};

/// Number of Bark bands in the loudness model.
pub const BARK_BANDS: usize = 24;

const LOUDNESS_EXPONENT: f32 = 0.23;

/// Features of one analysis frame.
#[derive(Debug, Clone)]
pub struct FrameFeatures {
    pub amplitude_spectrum: Vec<f32>,
    pub rms: f32,
    /// Total loudness across Bark bands.
    pub loudness: f32,
}

/// Extracts [`FrameFeatures`] from fixed-size frames at one sample rate.
pub struct FeatureExtractor {
    analyzer: SpectrumAnalyzer,
    sample_rate: u32,
    /// Bin boundaries of the Bark bands; `BARK_BANDS + 1` entries.
    bark_limits: Vec<usize>,
}

impl FeatureExtractor {
    pub fn new(frame_size: usize, sample_rate: u32) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::UnknownSampleRate);
        }
        let analyzer = SpectrumAnalyzer::new(frame_size)?;
        let bark_limits = bark_limits(&analyzer, sample_rate);
        Ok(Self {
            analyzer,
            sample_rate,
            bark_limits,
        })
    }

    pub fn frame_size(&self) -> usize {
        self.analyzer.fft_size()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Features of `frame`; short frames are zero-padded.
    pub fn extract(&mut self, frame: &[f32]) -> FrameFeatures {
        let frame = &frame[..frame.len().min(self.frame_size())];
        let amplitude_spectrum = self.analyzer.amplitude_spectrum(frame);
        let loudness = self
            .bark_limits
            .windows(2)
            .map(|w| {
                let sum: f32 = amplitude_spectrum[w[0]..w[1]].iter().sum();
                sum.powf(LOUDNESS_EXPONENT)
            })
            .sum();

        FrameFeatures {
            rms: rms(frame, self.frame_size()),
            loudness,
            amplitude_spectrum,
        }
    }

    /// Energy of the bins whose centre frequency lies in `[low_hz, high_hz)`:
    /// the square root of their summed squared amplitudes.
    pub fn range_energy(&self, spectrum: &[f32], low_hz: f32, high_hz: f32) -> f32 {
        spectrum
            .iter()
            .enumerate()
            .filter(|(bin, _)| {
                let freq = self.analyzer.bin_to_freq(*bin, self.sample_rate);
                freq >= low_hz && freq < high_hz
            })
            .map(|(_, amp)| amp * amp)
            .sum::<f32>()
            .sqrt()
    }
}

/// Root mean square over a frame of `frame_size` samples (missing samples
/// count as silence).
pub fn rms(samples: &[f32], frame_size: usize) -> f32 {
    let n = frame_size.max(samples.len());
    if n == 0 {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / n as f32).sqrt()
}

fn bark(freq: f32) -> f32 {
    13.0 * (freq / 1315.8).atan() + 3.5 * (freq / 7518.0).powi(2).atan()
}

fn bark_limits(analyzer: &SpectrumAnalyzer, sample_rate: u32) -> Vec<usize> {
    let bins = analyzer.num_bins();
    let scale: Vec<f32> = (0..bins)
        .map(|bin| bark(analyzer.bin_to_freq(bin, sample_rate)))
        .collect();
    let top = scale[bins - 1];

    let mut limits = vec![0usize; BARK_BANDS + 1];
    let mut band = 1;
    let mut band_end = top / BARK_BANDS as f32;
    for (bin, &value) in scale.iter().enumerate() {
        while band < BARK_BANDS && value > band_end {
            limits[band] = bin;
            band += 1;
            band_end = band as f32 * top / BARK_BANDS as f32;
        }
    }
    for limit in limits.iter_mut().skip(band) {
        *limit = bins - 1;
    }
    limits[BARK_BANDS] = bins - 1;
    limits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synth::generate_sine;

    #[test]
    fn test_silence_has_no_loudness() {
        let mut extractor = FeatureExtractor::new(2048, 44100).unwrap();
        let features = extractor.extract(&vec![0.0; 2048]);
        assert_eq!(features.loudness, 0.0);
        assert_eq!(features.rms, 0.0);
        assert_eq!(features.amplitude_spectrum.len(), 1024);
    }

    #[test]
    fn test_louder_signal_is_louder() {
        let mut extractor = FeatureExtractor::new(2048, 44100).unwrap();
        let quiet = extractor.extract(&generate_sine(440.0, 44100, 0.05, 0.1));
        let loud = extractor.extract(&generate_sine(440.0, 44100, 0.05, 0.9));
        assert!(loud.loudness > quiet.loudness);
        assert!((loud.rms - 0.9 / 2f32.sqrt()).abs() < 0.02);
    }

    #[test]
    fn test_range_energy_isolates_band() {
        let mut extractor = FeatureExtractor::new(2048, 44100).unwrap();
        let features = extractor.extract(&generate_sine(100.0, 44100, 0.05, 1.0));
        let low = extractor.range_energy(&features.amplitude_spectrum, 20.0, 250.0);
        let high = extractor.range_energy(&features.amplitude_spectrum, 4000.0, 16000.0);
        assert!(low > 100.0 * high.max(1e-6), "low {} high {}", low, high);
    }

    #[test]
    fn test_bark_limits_are_monotonic() {
        let analyzer = SpectrumAnalyzer::new(2048).unwrap();
        let limits = bark_limits(&analyzer, 44100);
        assert_eq!(limits.len(), BARK_BANDS + 1);
        assert_eq!(limits[0], 0);
        assert_eq!(limits[BARK_BANDS], 1023);
        assert!(limits.windows(2).all(|w| w[0] <= w[1]));
    }
}
