//! Effect synthesis.
//!
//! Maps (effect, peak brightness, frame position, block length) to the
//! instantaneous brightness of one frame. The same function fills a block's
//! `effect_data` and flattens blocks into the export matrix, so it carries no
//! state between calls. Randomized effects draw from the caller's `Rng`.

use std::f64::consts::PI;

use rand::Rng;

use crate::model::{clamp_brightness, Effect, MAX_BRIGHTNESS, TIME_STEP_MS};

/// Strobe period in frames (50% duty).
const STROBE_PERIOD: usize = 30;

/// Frames a periodic pulse stays lit.
const PULSE_WIDTH: usize = 5;

/// Brightness of `effect` at 0-based `frame` of a block `total_frames` long.
///
/// Unknown and imported effects fail open to full brightness. Formulas count
/// frames from 1, so `FadeIn` starts one step above 0 (`P / N` at frame 0).
pub fn sample<R: Rng + ?Sized>(
    effect: Effect,
    peak: u16,
    frame: usize,
    total_frames: usize,
    rng: &mut R,
) -> u16 {
    let p = peak.min(MAX_BRIGHTNESS) as f64;
    let n = total_frames.max(1) as f64;
    // Formulas count elapsed frames from 1.
    let i = (frame + 1) as f64;

    match effect {
        Effect::Constant => clamp_brightness(p),
        Effect::SmoothFade => clamp_brightness(p * (PI * i / n).sin()),
        Effect::FadeIn => clamp_brightness(p / n * i),
        Effect::FadeOut => clamp_brightness(p - p / n * (i - 1.0)),
        Effect::FadeInOut => fade_in_out(p, i, total_frames.max(1)),
        Effect::Strobe => {
            if (frame + 1) % STROBE_PERIOD < STROBE_PERIOD / 2 {
                clamp_brightness(p)
            } else {
                0
            }
        }
        Effect::Chaos => {
            let r: f64 = rng.random();
            if r > 0.9 {
                MAX_BRIGHTNESS
            } else if r > 0.5 {
                clamp_brightness(p * (PI * r * i / n).sin())
            } else {
                0
            }
        }
        Effect::Heartbeat => heartbeat(p, i, n),
        Effect::ChaosV2 => {
            let r: f64 = rng.random();
            if r > 0.8 {
                MAX_BRIGHTNESS
            } else if r > 0.6 {
                0
            } else {
                let jitter: f64 = rng.random();
                clamp_brightness(p * (0.5 + 0.5 * jitter))
            }
        }
        Effect::Pulse1s => pulse(p, frame, 1000.0),
        Effect::Pulse2s => pulse(p, frame, 2000.0),
        Effect::Pulse4s => pulse(p, frame, 4000.0),
        Effect::Pulse8s => pulse(p, frame, 8000.0),
        Effect::Imported | Effect::Other(_) => MAX_BRIGHTNESS,
    }
}

/// Full envelope of a block `frames` long.
pub fn synthesize<R: Rng + ?Sized>(
    effect: Effect,
    peak: u16,
    frames: usize,
    rng: &mut R,
) -> Vec<u16> {
    (0..frames)
        .map(|frame| sample(effect, peak, frame, frames, rng))
        .collect()
}

fn fade_in_out(p: f64, i: f64, total_frames: usize) -> u16 {
    let half = (total_frames / 2) as f64;
    let n = total_frames as f64;
    if half > 0.0 && i <= half {
        clamp_brightness(p * i / half)
    } else {
        clamp_brightness(p * (n - i) / (n - half))
    }
}

/// Up to peak, down, up to half peak, down, then silence.
fn heartbeat(p: f64, i: f64, n: f64) -> u16 {
    let segment = n / 5.0;
    let phase = ((i - 1.0) / segment).floor().clamp(0.0, 4.0);
    let t = ((i - phase * segment) / segment).clamp(0.0, 1.0);
    let value = match phase as u8 {
        0 => p * t,
        1 => p * (1.0 - t),
        2 => p / 2.0 * t,
        3 => p / 2.0 * (1.0 - t),
        _ => 0.0,
    };
    clamp_brightness(value)
}

fn pulse(p: f64, frame: usize, interval_ms: f64) -> u16 {
    let interval = ((interval_ms / TIME_STEP_MS).round() as usize).max(1);
    if frame % interval < PULSE_WIDTH {
        clamp_brightness(p)
    } else {
        0
    }
}
