//! Copy/cut buffer.

use crate::model::GlyphBlock;

/// Blocks captured by copy or cut, pasted relative to their earliest start.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    blocks: Vec<GlyphBlock>,
    cut: bool,
}

impl Clipboard {
    /// Replace the contents with a deep copy of `blocks`.
    pub fn capture<'a>(&mut self, blocks: impl IntoIterator<Item = &'a GlyphBlock>, cut: bool) {
        self.blocks = blocks
            .into_iter()
            .map(|b| GlyphBlock {
                selected: false,
                ..b.clone()
            })
            .collect();
        self.cut = cut;
    }

    pub fn blocks(&self) -> &[GlyphBlock] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Contents came from a cut and are single-use.
    pub fn is_cut(&self) -> bool {
        self.cut
    }

    /// Start of the earliest captured block, the paste anchor.
    pub fn anchor_ms(&self) -> Option<f64> {
        self.blocks.iter().map(|b| b.start_ms).reduce(f64::min)
    }

    /// Blocks to paste. A cut clipboard is emptied by this call.
    pub fn take_for_paste(&mut self) -> Vec<GlyphBlock> {
        if self.cut {
            self.cut = false;
            std::mem::take(&mut self.blocks)
        } else {
            self.blocks.clone()
        }
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.cut = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Effect;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn blocks() -> Vec<GlyphBlock> {
        let mut rng = StdRng::seed_from_u64(5);
        [(0, 300.0), (1, 120.0), (0, 900.0)]
            .into_iter()
            .map(|(zone, start)| {
                let mut b = GlyphBlock::new(zone, start, 100.0, 4095, Effect::Constant, &mut rng);
                b.selected = true;
                b
            })
            .collect()
    }

    #[test]
    fn test_anchor_is_earliest_start() {
        let mut clipboard = Clipboard::default();
        assert_eq!(clipboard.anchor_ms(), None);
        clipboard.capture(&blocks(), false);
        assert_eq!(clipboard.anchor_ms(), Some(120.0));
        assert!(clipboard.blocks().iter().all(|b| !b.selected));
    }

    #[test]
    fn test_copy_is_reusable() {
        let mut clipboard = Clipboard::default();
        clipboard.capture(&blocks(), false);
        assert_eq!(clipboard.take_for_paste().len(), 3);
        assert_eq!(clipboard.take_for_paste().len(), 3);
    }

    #[test]
    fn test_cut_is_single_use() {
        let mut clipboard = Clipboard::default();
        clipboard.capture(&blocks(), true);
        assert!(clipboard.is_cut());
        assert_eq!(clipboard.take_for_paste().len(), 3);
        assert!(clipboard.is_empty());
        assert!(clipboard.take_for_paste().is_empty());
    }
}
