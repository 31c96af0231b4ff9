//! Audio decoding and analysis for timeline generation.
//!
//! This module provides:
//! - Audio file decoding via Symphonia (WAV, MP3, FLAC, AAC, Ogg)
//! - FFT amplitude spectra via RustFFT
//! - Per-frame RMS and Bark-band loudness
//! - Whole-track calibration statistics
//! - Synthetic test signals

pub mod calibration;
pub mod features;
pub mod fft;
pub mod loader;
pub mod synth;

pub use calibration::{percentile, Calibration, Calibrator};
pub use features::{FeatureExtractor, FrameFeatures};
pub use fft::SpectrumAnalyzer;
pub use loader::{decode_audio_bytes, load_audio, AudioData, AudioError};
pub use synth::{
    concat, generate_click_track, generate_kick, generate_sine, generate_test_beat,
    generate_white_noise,
};
