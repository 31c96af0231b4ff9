//! Edits applied to selected blocks.

use crate::model::{clamp_brightness, Effect, GlyphBlock};

/// How a numeric block field changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjust {
    /// Replace the value.
    Set(f64),
    /// Add to the current value.
    Offset(f64),
}

impl Adjust {
    pub fn apply(self, current: f64) -> f64 {
        match self {
            Adjust::Set(value) => value,
            Adjust::Offset(delta) => current + delta,
        }
    }
}

/// Partial update applied independently to each selected block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockEdit {
    pub start_ms: Option<Adjust>,
    pub duration_ms: Option<Adjust>,
    pub brightness: Option<Adjust>,
    pub effect: Option<Effect>,
}

impl BlockEdit {
    pub fn is_empty(&self) -> bool {
        self.start_ms.is_none()
            && self.duration_ms.is_none()
            && self.brightness.is_none()
            && self.effect.is_none()
    }

    /// Shift along the timeline.
    pub fn moved_by(delta_ms: f64) -> Self {
        Self {
            start_ms: Some(Adjust::Offset(delta_ms)),
            ..Default::default()
        }
    }

    pub fn with_effect(effect: Effect) -> Self {
        Self {
            effect: Some(effect),
            ..Default::default()
        }
    }

    /// Edited copy of `block`. The envelope is not resynthesized here.
    pub fn apply(&self, block: &GlyphBlock) -> GlyphBlock {
        let mut edited = block.clone();
        if let Some(start) = self.start_ms {
            edited.start_ms = start.apply(block.start_ms);
        }
        if let Some(duration) = self.duration_ms {
            edited.duration_ms = duration.apply(block.duration_ms);
        }
        if let Some(brightness) = self.brightness {
            edited.brightness = clamp_brightness(brightness.apply(block.brightness as f64));
        }
        if let Some(effect) = self.effect {
            edited.effect = effect;
        }
        edited
    }

    /// Whether applying this edit changes the envelope's inputs.
    pub fn changes_envelope(&self) -> bool {
        self.duration_ms.is_some() || self.brightness.is_some() || self.effect.is_some()
    }
}
