//! FFT spectrum analysis using RustFFT.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::AudioError;

/// Windowed magnitude spectrum of fixed-size frames.
///
/// Output is the unnormalized amplitude spectrum `|X[k]|` for bins
/// `0..fft_size / 2`, after a Hann window.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    /// `fft_size` must be a power of two. Common sizes: 1024, 2048, 4096.
    pub fn new(fft_size: usize) -> Result<Self, AudioError> {
        if fft_size < 2 || !fft_size.is_power_of_two() {
            return Err(AudioError::InvalidFrameSize(fft_size));
        }

        let window = (0..fft_size)
            .map(|i| {
                let t = i as f32 / (fft_size - 1) as f32;
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos())
            })
            .collect();

        Ok(Self {
            fft: FftPlanner::new().plan_fft_forward(fft_size),
            fft_size,
            window,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of output bins (FFT size / 2).
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2
    }

    /// Amplitude spectrum of `samples`.
    ///
    /// Short input (the last frame of a track) is zero-padded; samples past
    /// `fft_size` are ignored.
    pub fn amplitude_spectrum(&mut self, samples: &[f32]) -> Vec<f32> {
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let s = samples.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);
        self.buffer[..self.num_bins()].iter().map(|c| c.norm()).collect()
    }

    /// Centre frequency of `bin` in Hz.
    pub fn bin_to_freq(&self, bin: usize, sample_rate: u32) -> f32 {
        bin as f32 * sample_rate as f32 / self.fft_size as f32
    }

    pub fn freq_to_bin(&self, freq: f32, sample_rate: u32) -> usize {
        (freq * self.fft_size as f32 / sample_rate as f32).round() as usize
    }
}
