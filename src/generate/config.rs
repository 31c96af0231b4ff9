//! Generation settings.

use serde::{Deserialize, Serialize};

use super::GenerationError;
use crate::model::TIME_STEP_MS;

/// How raw band triggers are turned into LED levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Strategy {
    /// Hold each triggered LED for `sustain_frames`, then decay it by
    /// `decay_factor` per frame. Re-triggers during the hold are ignored.
    #[serde(rename_all = "camelCase")]
    SustainDecay {
        sustain_frames: usize,
        decay_factor: f32,
    },
    /// Reassign LEDs to bands every `reshuffle_interval` frames, sweep on
    /// very loud frames, and overlay scripted patterns on busy segments
    /// with `segment_effect_probability`.
    #[serde(rename_all = "camelCase")]
    Dynamic {
        reshuffle_interval: usize,
        segment_effect_probability: f64,
    },
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::SustainDecay {
            sustain_frames: 6,
            decay_factor: 0.85,
        }
    }
}

impl Strategy {
    pub fn dynamic() -> Self {
        Strategy::Dynamic {
            reshuffle_interval: 120,
            segment_effect_probability: 0.3,
        }
    }
}

/// Frequency span `[low_hz, high_hz)` of each logical band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSpans {
    pub low: [f32; 2],
    pub mid: [f32; 2],
    pub high: [f32; 2],
}

impl Default for BandSpans {
    fn default() -> Self {
        Self {
            low: [20.0, 250.0],
            mid: [250.0, 4000.0],
            high: [4000.0, 16000.0],
        }
    }
}

impl BandSpans {
    pub fn as_array(&self) -> [[f32; 2]; 3] {
        [self.low, self.mid, self.high]
    }
}

/// Explicit thresholds; `None` means derive from calibration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    pub amplitude: Option<f32>,
    pub low: Option<f32>,
    pub mid: Option<f32>,
    pub high: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Analysis frame length in samples; a power of two.
    pub frame_size: usize,
    pub strategy: Strategy,
    pub bands: BandSpans,
    pub thresholds: ThresholdOverrides,
    /// Derived amplitude threshold = mean loudness × this.
    pub amplitude_factor: f32,
    /// Derived band threshold = mean band energy × this.
    pub band_factor: f32,
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            strategy: Strategy::default(),
            bands: BandSpans::default(),
            thresholds: ThresholdOverrides::default(),
            amplitude_factor: 1.0,
            band_factor: 1.0,
            seed: None,
        }
    }
}

impl GenerationConfig {
    /// Samples between frame starts: one time step.
    pub fn hop_size(sample_rate: u32) -> usize {
        ((sample_rate as f64 * TIME_STEP_MS / 1000.0).round() as usize).max(1)
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.frame_size < 2 || !self.frame_size.is_power_of_two() {
            return Err(GenerationError::FrameSize(self.frame_size));
        }
        for [low, high] in self.bands.as_array() {
            if !(low >= 0.0 && high > low) {
                return Err(GenerationError::BandSpan { low, high });
            }
        }
        match self.strategy {
            Strategy::SustainDecay { decay_factor, .. } if !(0.0..1.0).contains(&decay_factor) => {
                Err(GenerationError::DecayFactor(decay_factor))
            }
            Strategy::Dynamic {
                segment_effect_probability: p,
                ..
            } if !(0.0..=1.0).contains(&p) => Err(GenerationError::Probability(p)),
            _ => Ok(()),
        }
    }
}
