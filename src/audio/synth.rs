//! Synthetic test signals.
//!
//! Sine tones, seeded noise and percussive patterns for tests and benches.

use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn sample_count(sample_rate: u32, duration: f32) -> usize {
    (duration * sample_rate as f32) as usize
}

/// Sine tone of `duration` seconds.
pub fn generate_sine(frequency: f32, sample_rate: u32, duration: f32, amplitude: f32) -> Vec<f32> {
    (0..sample_count(sample_rate, duration))
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * PI * frequency * t).sin()
        })
        .collect()
}

/// Uniform white noise, reproducible for a given seed.
pub fn generate_white_noise(sample_rate: u32, duration: f32, amplitude: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..sample_count(sample_rate, duration))
        .map(|_| amplitude * rng.random_range(-1.0f32..=1.0))
        .collect()
}

/// Pitched kick drum, 150 ms.
pub fn generate_kick(sample_rate: u32) -> Vec<f32> {
    (0..sample_count(sample_rate, 0.15))
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            // Pitch sweeps from 150 Hz down to 50 Hz.
            let freq = 50.0 + 100.0 * (-t * 30.0).exp();
            (-t * 15.0).exp() * (2.0 * PI * freq * t).sin()
        })
        .collect()
}

/// 10 ms decaying clicks at `bpm`.
pub fn generate_click_track(bpm: f32, sample_rate: u32, duration: f32, click_freq: f32) -> Vec<f32> {
    let click_len = sample_count(sample_rate, 0.01);
    let click: Vec<f32> = (0..click_len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let envelope = (1.0 - i as f32 / click_len as f32).powi(2);
            envelope * (2.0 * PI * click_freq * t).sin()
        })
        .collect();
    repeat_at(&click, bpm, sample_rate, duration)
}

/// Kicks on every beat over a quiet high-pitched bed.
///
/// Gives generation a signal with clear loud/quiet structure in both the
/// low and high bands.
pub fn generate_test_beat(bpm: f32, sample_rate: u32, duration: f32) -> Vec<f32> {
    let mut samples = repeat_at(&generate_kick(sample_rate), bpm, sample_rate, duration);
    let bed = generate_sine(6000.0, sample_rate, duration, 0.05);
    for (s, b) in samples.iter_mut().zip(bed) {
        *s = (*s + b).clamp(-1.0, 1.0);
    }
    samples
}

/// Concatenate signals back to back.
pub fn concat(parts: &[Vec<f32>]) -> Vec<f32> {
    parts.iter().flatten().copied().collect()
}

fn repeat_at(hit: &[f32], bpm: f32, sample_rate: u32, duration: f32) -> Vec<f32> {
    let total = sample_count(sample_rate, duration);
    let spacing = ((60.0 / bpm * sample_rate as f32) as usize).max(1);
    let mut samples = vec![0.0; total];
    for start in (0..total).step_by(spacing) {
        for (slot, &value) in samples[start..].iter_mut().zip(hit) {
            *slot = value;
        }
    }
    samples
}
