//! Sustain-then-decay smoothing of per-LED triggers.

/// Per-LED hold/decay state.
#[derive(Debug, Clone)]
pub struct SustainDecay {
    sustain_frames: usize,
    decay_factor: f32,
    level: Vec<f32>,
    hold: Vec<usize>,
}

impl SustainDecay {
    pub fn new(leds: usize, sustain_frames: usize, decay_factor: f32) -> Self {
        Self {
            sustain_frames: sustain_frames.max(1),
            decay_factor,
            level: vec![0.0; leds],
            hold: vec![0; leds],
        }
    }

    /// Advance one frame. `row` holds this frame's triggers (0 = none) and
    /// is overwritten with the smoothed levels.
    pub fn apply(&mut self, row: &mut [u16]) {
        for (led, value) in row.iter_mut().enumerate().take(self.level.len()) {
            if self.hold[led] > 0 {
                self.hold[led] -= 1;
            } else if *value > 0 {
                self.level[led] = *value as f32;
                self.hold[led] = self.sustain_frames - 1;
            } else {
                self.level[led] *= self.decay_factor;
                if self.level[led] < 1.0 {
                    self.level[led] = 0.0;
                }
            }
            *value = self.level[led].round() as u16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_then_decay() {
        let mut filter = SustainDecay::new(1, 3, 0.5);
        let mut out = Vec::new();
        for trigger in [4000, 0, 1000, 0, 0, 0] {
            let mut row = [trigger];
            filter.apply(&mut row);
            out.push(row[0]);
        }
        // Held for three frames (re-trigger ignored), then halves each frame.
        assert_eq!(out, vec![4000, 4000, 4000, 2000, 1000, 500]);
    }

    #[test]
    fn test_retrigger_after_hold() {
        let mut filter = SustainDecay::new(2, 1, 0.5);
        let mut row = [100, 0];
        filter.apply(&mut row);
        assert_eq!(row, [100, 0]);
        let mut row = [300, 2];
        filter.apply(&mut row);
        assert_eq!(row, [300, 2]);
        let mut row = [0, 0];
        filter.apply(&mut row);
        assert_eq!(row, [150, 1]);
        let mut row = [0, 0];
        filter.apply(&mut row);
        assert_eq!(row, [75, 0]);
    }
}
