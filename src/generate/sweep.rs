//! Scripted sweep patterns overlaid on busy segments.
//!
//! Each pattern maps a position within a segment to a full row of LED
//! levels. Positions run from 0 to `len - 1`; LEDs are addressed by index
//! across the whole device.

use std::f32::consts::PI;

use rand::Rng;

use crate::model::MAX_BRIGHTNESS;

/// Share of LEDs that must be lit for a frame to count as busy.
pub const BUSY_RATIO: f32 = 0.7;

const FULL: f32 = MAX_BRIGHTNESS as f32;
const METEOR_TAIL: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPattern {
    Ripple,
    InverseRipple,
    WaveFlow,
    Meteor,
    BouncingBall,
    RandomSparkle,
    ReverseChase,
    FlashExpand,
    Sequential,
    ReverseSequential,
}

impl SweepPattern {
    pub const ALL: [SweepPattern; 10] = [
        SweepPattern::Ripple,
        SweepPattern::InverseRipple,
        SweepPattern::WaveFlow,
        SweepPattern::Meteor,
        SweepPattern::BouncingBall,
        SweepPattern::RandomSparkle,
        SweepPattern::ReverseChase,
        SweepPattern::FlashExpand,
        SweepPattern::Sequential,
        SweepPattern::ReverseSequential,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Levels of `leds` LEDs at position `t` of a segment `len` frames long.
    pub fn render<R: Rng + ?Sized>(self, t: usize, len: usize, leds: usize, rng: &mut R) -> Vec<u16> {
        if leds == 0 {
            return Vec::new();
        }
        let last = (leds - 1) as f32;
        let progress = if len > 1 {
            t as f32 / (len - 1) as f32
        } else {
            1.0
        };
        let centre = last / 2.0;
        let reach = centre.max(1.0);

        let level = |led: usize| -> f32 {
            let x = led as f32;
            match self {
                SweepPattern::Ripple => ring(x, centre, progress * reach),
                SweepPattern::InverseRipple => ring(x, centre, (1.0 - progress) * reach),
                SweepPattern::WaveFlow => {
                    let phase = 2.0 * PI * (x / leds as f32 - 2.0 * progress);
                    FULL * (0.5 + 0.5 * phase.sin())
                }
                SweepPattern::Meteor => {
                    let head = progress * (last + METEOR_TAIL);
                    let behind = head - x;
                    if (0.0..METEOR_TAIL).contains(&behind) {
                        FULL * (1.0 - behind / METEOR_TAIL)
                    } else {
                        0.0
                    }
                }
                SweepPattern::BouncingBall => {
                    let height = (PI * 2.0 * progress).sin().abs();
                    spot(x, (last * height).round())
                }
                SweepPattern::ReverseChase => {
                    let head = last - (t % leds) as f32;
                    match head - x {
                        d if d == 0.0 => FULL,
                        d if d == -1.0 => FULL * 0.5,
                        d if d == -2.0 => FULL * 0.25,
                        _ => 0.0,
                    }
                }
                SweepPattern::FlashExpand => {
                    if (x - centre).abs() <= progress * reach {
                        FULL * (1.0 - 0.5 * progress)
                    } else {
                        0.0
                    }
                }
                SweepPattern::Sequential => spot(x, (progress * last).round()),
                SweepPattern::ReverseSequential => spot(x, last - (progress * last).round()),
                SweepPattern::RandomSparkle => 0.0,
            }
        };

        if self == SweepPattern::RandomSparkle {
            return (0..leds)
                .map(|_| {
                    if rng.random_bool(0.3) {
                        rng.random_range(MAX_BRIGHTNESS / 2..=MAX_BRIGHTNESS)
                    } else {
                        0
                    }
                })
                .collect();
        }

        (0..leds).map(|led| level(led).round().clamp(0.0, FULL) as u16).collect()
    }
}

fn spot(x: f32, at: f32) -> f32 {
    if x == at {
        FULL
    } else {
        0.0
    }
}

fn ring(x: f32, centre: f32, radius: f32) -> f32 {
    let distance = ((x - centre).abs() - radius).abs();
    FULL * (1.0 - distance).max(0.0)
}

/// Maximal runs of frames that are busy or flagged, as `(start, len)`.
pub fn busy_segments(active: &[usize], flagged: &[bool], leds: usize) -> Vec<(usize, usize)> {
    let threshold = BUSY_RATIO * leds as f32;
    let busy = |frame: usize| {
        active.get(frame).is_some_and(|&n| n as f32 > threshold)
            || flagged.get(frame).copied().unwrap_or(false)
    };

    let frames = active.len().max(flagged.len());
    let mut segments = Vec::new();
    let mut start = None;
    for frame in 0..frames {
        match (busy(frame), start) {
            (true, None) => start = Some(frame),
            (false, Some(s)) => {
                segments.push((s, frame - s));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        segments.push((s, frames - s));
    }
    segments
}
