//! Timeline generation from audio.
//!
//! Three passes over the track at one frame per time step:
//!
//! 1. **Calibration**: loudness, RMS and per-band energy statistics, from
//!    which thresholds are derived unless given explicitly.
//! 2. **Synthesis**: each LED in a band lights in proportion to the energy
//!    of its slice of the band's frequency span, relative to the frame's
//!    loudness. Quiet frames stay dark.
//! 3. **Segment effects** (dynamic strategy only): busy stretches may be
//!    replaced by one of the scripted [`SweepPattern`]s.
//!
//! The output is a [`BrightnessMatrix`](crate::codec::BrightnessMatrix),
//! turned into blocks by the matrix decoder like any imported matrix.

mod bands;
mod config;
mod engine;
mod sustain;
mod sweep;

use thiserror::Error;

use crate::audio::AudioError;

pub use bands::{sub_ranges, LedBands};
pub use config::{BandSpans, GenerationConfig, Strategy, ThresholdOverrides};
pub use engine::{generate_matrix, Thresholds};
pub use sustain::SustainDecay;
pub use sweep::{busy_segments, SweepPattern, BUSY_RATIO};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Frame size must be a power of two, got {0}")]
    FrameSize(usize),

    #[error("Band span must satisfy 0 <= low < high, got {low} to {high} Hz")]
    BandSpan { low: f32, high: f32 },

    #[error("Decay factor must be in [0, 1), got {0}")]
    DecayFactor(f32),

    #[error("Segment effect probability must be in [0, 1], got {0}")]
    Probability(f64),

    #[error("LED {led} does not exist (device has {zone_count} zones)")]
    LedOutOfRange { led: usize, zone_count: usize },

    #[error("Sample rate must be positive")]
    SampleRate,

    #[error(transparent)]
    Audio(#[from] AudioError),
}
