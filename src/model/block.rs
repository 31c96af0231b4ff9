//! Glyph block and effect kind definitions.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{frame_index, TIME_STEP_MS};
use crate::effects;

/// Number of synthesis frames a block of `duration_ms` covers.
pub fn frame_count(duration_ms: f64) -> usize {
    frame_index(duration_ms)
}

/// Opaque unique block identifier.
///
/// Fresh ids are random v4 UUIDs; ids read from project files are kept
/// verbatim as long as they are strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for BlockId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Brightness envelope applied within a block.
///
/// Serialized as its numeric id. Ids the editor does not know are carried
/// through as [`Effect::Other`] and synthesize at full brightness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum Effect {
    #[default]
    Constant,
    SmoothFade,
    FadeIn,
    FadeOut,
    FadeInOut,
    Strobe,
    Chaos,
    Heartbeat,
    ChaosV2,
    Pulse1s,
    Pulse2s,
    Pulse4s,
    Pulse8s,
    /// Samples reconstructed from a brightness matrix.
    Imported,
    Other(u32),
}

impl Effect {
    /// Numeric id of imported (matrix-reconstructed) blocks.
    pub const IMPORTED_ID: u32 = 101;

    /// Every effect a user can pick from.
    pub const ALL: [Effect; 13] = [
        Effect::Constant,
        Effect::SmoothFade,
        Effect::FadeIn,
        Effect::FadeOut,
        Effect::FadeInOut,
        Effect::Strobe,
        Effect::Chaos,
        Effect::Heartbeat,
        Effect::ChaosV2,
        Effect::Pulse1s,
        Effect::Pulse2s,
        Effect::Pulse4s,
        Effect::Pulse8s,
    ];

    pub fn id(self) -> u32 {
        self.into()
    }

    pub fn name(self) -> &'static str {
        match self {
            Effect::Constant => "Constant",
            Effect::SmoothFade => "Smooth fade",
            Effect::FadeIn => "Fade in",
            Effect::FadeOut => "Fade out",
            Effect::FadeInOut => "Fade in & out",
            Effect::Strobe => "Strobe",
            Effect::Chaos => "Chaos",
            Effect::Heartbeat => "Single heartbeat",
            Effect::ChaosV2 => "Chaos v2",
            Effect::Pulse1s => "Pulse every 1s",
            Effect::Pulse2s => "Pulse every 2s",
            Effect::Pulse4s => "Pulse every 4s",
            Effect::Pulse8s => "Pulse every 8s",
            Effect::Imported => "Imported",
            Effect::Other(_) => "Unknown",
        }
    }

    /// Whether the envelope draws from the random source.
    pub fn is_random(self) -> bool {
        matches!(self, Effect::Chaos | Effect::ChaosV2)
    }
}

impl From<u32> for Effect {
    fn from(id: u32) -> Self {
        match id {
            0 => Effect::Constant,
            1 => Effect::SmoothFade,
            2 => Effect::FadeIn,
            3 => Effect::FadeOut,
            4 => Effect::FadeInOut,
            5 => Effect::Strobe,
            6 => Effect::Chaos,
            7 => Effect::Heartbeat,
            8 => Effect::ChaosV2,
            9 => Effect::Pulse1s,
            10 => Effect::Pulse2s,
            11 => Effect::Pulse4s,
            12 => Effect::Pulse8s,
            Effect::IMPORTED_ID => Effect::Imported,
            other => Effect::Other(other),
        }
    }
}

impl From<Effect> for u32 {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Constant => 0,
            Effect::SmoothFade => 1,
            Effect::FadeIn => 2,
            Effect::FadeOut => 3,
            Effect::FadeInOut => 4,
            Effect::Strobe => 5,
            Effect::Chaos => 6,
            Effect::Heartbeat => 7,
            Effect::ChaosV2 => 8,
            Effect::Pulse1s => 9,
            Effect::Pulse2s => 10,
            Effect::Pulse4s => 11,
            Effect::Pulse8s => 12,
            Effect::Imported => Effect::IMPORTED_ID,
            Effect::Other(id) => id,
        }
    }
}

/// One lighting event on one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphBlock {
    pub id: BlockId,
    #[serde(rename = "glyphId")]
    pub zone: usize,
    #[serde(rename = "startTimeMilis")]
    pub start_ms: f64,
    #[serde(rename = "durationMilis")]
    pub duration_ms: f64,
    #[serde(rename = "startingBrightness")]
    pub brightness: u16,
    #[serde(rename = "isSelected")]
    pub selected: bool,
    #[serde(rename = "effectId")]
    pub effect: Effect,
    /// Per-frame brightness samples, one per [`TIME_STEP_MS`](super::TIME_STEP_MS).
    #[serde(rename = "effectData")]
    pub effect_data: Vec<u16>,
}

impl GlyphBlock {
    /// Create a block with a fresh id and a synthesized envelope.
    pub fn new<R: Rng + ?Sized>(
        zone: usize,
        start_ms: f64,
        duration_ms: f64,
        brightness: u16,
        effect: Effect,
        rng: &mut R,
    ) -> Self {
        let mut block = Self {
            id: BlockId::new(),
            zone,
            start_ms,
            duration_ms,
            brightness,
            selected: false,
            effect,
            effect_data: Vec::new(),
        };
        block.resynthesize(rng);
        block
    }

    /// Block built from captured matrix samples.
    pub fn imported(zone: usize, start_ms: f64, samples: Vec<u16>) -> Self {
        Self {
            id: BlockId::new(),
            zone,
            start_ms,
            duration_ms: samples.len() as f64 * TIME_STEP_MS,
            brightness: samples.first().copied().unwrap_or(0),
            selected: false,
            effect: Effect::Imported,
            effect_data: samples,
        }
    }

    /// Exclusive end of the block's `[start, end)` interval.
    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }

    pub fn frame_count(&self) -> usize {
        frame_count(self.duration_ms)
    }

    /// Recompute `effect_data` from the current parameters.
    ///
    /// Imported blocks keep their captured samples, trimmed or zero-padded to
    /// the current frame count.
    pub fn resynthesize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let frames = self.frame_count();
        if self.effect == Effect::Imported {
            self.effect_data.resize(frames, 0);
            return;
        }
        self.effect_data = effects::synthesize(self.effect, self.brightness, frames, rng);
    }

    /// Brightness this block drives at `frame` of a `frames`-long span.
    ///
    /// Imported blocks replay their captured samples; every other effect is
    /// synthesized on the spot.
    pub fn brightness_at<R: Rng + ?Sized>(&self, frame: usize, frames: usize, rng: &mut R) -> u16 {
        match self.effect {
            Effect::Imported => self
                .effect_data
                .get(frame)
                .copied()
                .unwrap_or(self.brightness),
            effect => effects::sample(effect, self.brightness, frame, frames, rng),
        }
    }

    /// Copy of this block under a fresh id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: BlockId::new(),
            selected: false,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_effect_id_round_trip() {
        for id in 0..=12u32 {
            assert_eq!(Effect::from(id).id(), id);
        }
        assert_eq!(Effect::from(101), Effect::Imported);
        assert_eq!(Effect::from(77), Effect::Other(77));
        assert_eq!(Effect::Other(77).id(), 77);
    }

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count(500.0), 30);
        assert_eq!(frame_count(TIME_STEP_MS), 1);
        assert_eq!(frame_count(10.0), 0);
        assert_eq!(frame_count(-5.0), 0);
    }

    #[test]
    fn test_new_block_synthesizes_envelope() {
        let mut rng = StdRng::seed_from_u64(7);
        let block = GlyphBlock::new(2, 100.0, 500.0, 4095, Effect::Constant, &mut rng);
        assert_eq!(block.zone, 2);
        assert_eq!(block.effect_data.len(), 30);
        assert!(block.effect_data.iter().all(|&v| v == 4095));
        assert!((block.end_ms() - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_imported_block_shape() {
        let block = GlyphBlock::imported(1, 50.0, vec![300, 310, 0, 320]);
        assert_eq!(block.effect, Effect::Imported);
        assert_eq!(block.brightness, 300);
        assert!((block.duration_ms - 4.0 * TIME_STEP_MS).abs() < 1e-9);

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(block.brightness_at(3, 4, &mut rng), 320);
    }

    #[test]
    fn test_block_serializes_with_wire_names() {
        let mut rng = StdRng::seed_from_u64(1);
        let block = GlyphBlock::new(0, 0.0, 50.0, 1000, Effect::FadeIn, &mut rng);
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["glyphId"], 0);
        assert_eq!(json["effectId"], 2);
        assert_eq!(json["startingBrightness"], 1000);
        assert_eq!(json["isSelected"], false);
        assert!(json["id"].is_string());
        assert!(json["effectData"].is_array());
    }
}
