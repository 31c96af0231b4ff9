//! The three generation passes.

use rand::Rng;

use super::bands::sub_ranges;
use super::sweep::{busy_segments, SweepPattern};
use super::{GenerationConfig, GenerationError, LedBands, Strategy, SustainDecay};
use crate::audio::{Calibration, Calibrator, FeatureExtractor, FrameFeatures};
use crate::codec::BrightnessMatrix;
use crate::model::{clamp_brightness, frame_index, MAX_BRIGHTNESS};

/// Thresholds in effect for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Frames quieter than this are dark.
    pub amplitude: f32,
    /// Per-band LED trigger energy (low, mid, high).
    pub bands: [f32; 3],
    /// Frames louder than this trigger the sequential sweep.
    pub heavy_beat: f32,
}

impl Thresholds {
    /// Overrides where given, else derived from calibration.
    pub fn resolve(config: &GenerationConfig, calibration: &Calibration) -> Self {
        let overrides = &config.thresholds;
        let band_override = [overrides.low, overrides.mid, overrides.high];
        let mut bands = [0.0; 3];
        for (band, slot) in bands.iter_mut().enumerate() {
            let derived = calibration.mean_band_energy.get(band).copied().unwrap_or(0.0)
                * config.band_factor;
            *slot = band_override[band].unwrap_or(derived);
        }
        Self {
            amplitude: overrides
                .amplitude
                .unwrap_or(calibration.mean_loudness * config.amplitude_factor),
            bands,
            heavy_beat: calibration.loudness_p90,
        }
    }
}

/// Generate a brightness matrix from mono `samples`.
///
/// One row per time step of audio, one column per LED in `bands`.
pub fn generate_matrix<R: Rng + ?Sized>(
    samples: &[f32],
    sample_rate: u32,
    bands: &LedBands,
    config: &GenerationConfig,
    rng: &mut R,
) -> Result<BrightnessMatrix, GenerationError> {
    config.validate()?;
    if sample_rate == 0 {
        return Err(GenerationError::SampleRate);
    }

    let mut frames = Frames::new(samples, sample_rate, config)?;
    let leds = bands.zone_count();
    log::info!(
        "generating {} frames for {} LEDs ({:?})",
        frames.count,
        leds,
        config.strategy
    );

    let calibration = calibrate(&mut frames, bands, config);
    let thresholds = Thresholds::resolve(config, &calibration);
    log::debug!("calibration {:?}, thresholds {:?}", calibration, thresholds);

    let mut matrix = BrightnessMatrix::zeros(frames.count, leds);
    let flagged = synthesize(&mut frames, bands, config, &thresholds, &mut matrix, rng);

    if let Strategy::Dynamic {
        segment_effect_probability,
        ..
    } = config.strategy
    {
        overlay_segments(&mut matrix, &flagged, segment_effect_probability, rng);
    }

    Ok(matrix)
}

/// Frame iterator over the input at one time step per frame.
struct Frames<'a> {
    samples: &'a [f32],
    extractor: FeatureExtractor,
    hop: usize,
    count: usize,
    spans: [[f32; 2]; 3],
}

impl<'a> Frames<'a> {
    fn new(
        samples: &'a [f32],
        sample_rate: u32,
        config: &GenerationConfig,
    ) -> Result<Self, GenerationError> {
        let duration_ms = samples.len() as f64 * 1000.0 / sample_rate as f64;
        Ok(Self {
            samples,
            extractor: FeatureExtractor::new(config.frame_size, sample_rate)?,
            hop: GenerationConfig::hop_size(sample_rate),
            count: frame_index(duration_ms),
            spans: config.bands.as_array(),
        })
    }

    fn features(&mut self, frame: usize) -> FrameFeatures {
        let start = (frame * self.hop).min(self.samples.len());
        let end = (start + self.extractor.frame_size()).min(self.samples.len());
        self.extractor.extract(&self.samples[start..end])
    }

    /// Energy of each LED's share of its band's span, per band.
    fn led_energies(&self, features: &FrameFeatures, bands: &LedBands) -> [Vec<f32>; 3] {
        std::array::from_fn(|band| {
            sub_ranges(self.spans[band], bands.band(band).len())
                .into_iter()
                .map(|[low, high]| {
                    self.extractor
                        .range_energy(&features.amplitude_spectrum, low, high)
                })
                .collect()
        })
    }
}

/// Pass 1: loudness and band-energy statistics over the whole track.
fn calibrate(frames: &mut Frames<'_>, bands: &LedBands, config: &GenerationConfig) -> Calibration {
    let overrides = &config.thresholds;
    let mut calibrator = Calibrator::new(3);
    if overrides.amplitude.is_some()
        && overrides.low.is_some()
        && overrides.mid.is_some()
        && overrides.high.is_some()
        && !matches!(config.strategy, Strategy::Dynamic { .. })
    {
        log::debug!("all thresholds given, skipping calibration");
        return calibrator.finish();
    }

    for frame in 0..frames.count {
        let features = frames.features(frame);
        let energies = frames.led_energies(&features, bands);
        let means: Vec<f32> = energies
            .iter()
            .map(|e| {
                if e.is_empty() {
                    0.0
                } else {
                    e.iter().sum::<f32>() / e.len() as f32
                }
            })
            .collect();
        calibrator.push(features.loudness, features.rms, &means);
    }
    calibrator.finish()
}

/// Pass 2: per-frame LED levels. Returns the frames flagged as heavy beats.
fn synthesize<R: Rng + ?Sized>(
    frames: &mut Frames<'_>,
    initial: &LedBands,
    config: &GenerationConfig,
    thresholds: &Thresholds,
    matrix: &mut BrightnessMatrix,
    rng: &mut R,
) -> Vec<bool> {
    let leds = initial.zone_count();
    let mut flagged = vec![false; frames.count];
    let mut bands = initial.clone();
    let mut sweep_position = 0usize;
    let mut smoothing = match config.strategy {
        Strategy::SustainDecay {
            sustain_frames,
            decay_factor,
        } => Some(SustainDecay::new(leds, sustain_frames, decay_factor)),
        Strategy::Dynamic { .. } => None,
    };

    for frame in 0..frames.count {
        if let Strategy::Dynamic {
            reshuffle_interval, ..
        } = config.strategy
        {
            if reshuffle_interval > 0 && frame > 0 && frame % reshuffle_interval == 0 {
                bands = bands.reshuffled(rng);
            }
        }

        let features = frames.features(frame);
        let row = matrix.row_mut(frame);

        if features.loudness >= thresholds.amplitude && features.loudness > 0.0 {
            let energies = frames.led_energies(&features, &bands);
            for (band, energies) in energies.iter().enumerate() {
                for (&led, &energy) in bands.band(band).iter().zip(energies) {
                    if energy > thresholds.bands[band] {
                        row[led] = clamp_brightness(
                            (energy / features.loudness * MAX_BRIGHTNESS as f32) as f64,
                        );
                    }
                }
            }

            if matches!(config.strategy, Strategy::Dynamic { .. })
                && leds > 0
                && features.loudness > thresholds.heavy_beat
            {
                row[sweep_position % leds] = MAX_BRIGHTNESS;
                sweep_position += 1;
                flagged[frame] = true;
            }
        }

        if let Some(filter) = smoothing.as_mut() {
            filter.apply(row);
        }
    }

    flagged
}

/// Pass 3: scripted patterns over busy segments.
fn overlay_segments<R: Rng + ?Sized>(
    matrix: &mut BrightnessMatrix,
    flagged: &[bool],
    probability: f64,
    rng: &mut R,
) {
    let leds = matrix.columns();
    let active: Vec<usize> = matrix
        .rows()
        .iter()
        .map(|row| row.iter().filter(|&&v| v > 0).count())
        .collect();

    let mut applied = 0;
    for (start, len) in busy_segments(&active, flagged, leds) {
        if !rng.random_bool(probability) {
            continue;
        }
        let pattern = SweepPattern::random(rng);
        log::debug!("{:?} over frames {}..{}", pattern, start, start + len);
        for t in 0..len {
            let levels = pattern.render(t, len, leds, rng);
            matrix.row_mut(start + t).copy_from_slice(&levels);
        }
        applied += 1;
    }
    log::info!("applied {} segment pattern(s)", applied);
}
