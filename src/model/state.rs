//! Zone → blocks aggregate.

use serde::ser::{Serialize, Serializer};

use super::{BlockId, GlyphBlock};

/// All blocks of a timeline, bucketed by zone.
///
/// Each zone's blocks are non-overlapping and ordered by start time. Only
/// the placement engine and the timeline store mutate the buckets, which is
/// what keeps that true.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineState {
    zones: Vec<Vec<GlyphBlock>>,
}

impl TimelineState {
    /// Empty timeline with `zone_count` empty zones.
    pub fn with_zones(zone_count: usize) -> Self {
        Self {
            zones: vec![Vec::new(); zone_count],
        }
    }

    /// Build from pre-bucketed zones without re-validating them.
    pub(crate) fn from_zones(zones: Vec<Vec<GlyphBlock>>) -> Self {
        Self { zones }
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Blocks of `zone` in start-time order (empty for unknown zones).
    pub fn zone(&self, zone: usize) -> &[GlyphBlock] {
        self.zones.get(zone).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn zone_mut(&mut self, zone: usize) -> Option<&mut Vec<GlyphBlock>> {
        self.zones.get_mut(zone)
    }

    pub fn zones(&self) -> impl Iterator<Item = (usize, &[GlyphBlock])> {
        self.zones.iter().enumerate().map(|(i, z)| (i, z.as_slice()))
    }

    pub fn blocks(&self) -> impl Iterator<Item = &GlyphBlock> {
        self.zones.iter().flatten()
    }

    pub(crate) fn blocks_mut(&mut self) -> impl Iterator<Item = &mut GlyphBlock> {
        self.zones.iter_mut().flatten()
    }

    pub fn block_count(&self) -> usize {
        self.zones.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.block_count() == 0
    }

    /// Zone and index of the block with `id`.
    pub fn position(&self, id: &BlockId) -> Option<(usize, usize)> {
        self.zones.iter().enumerate().find_map(|(zone, blocks)| {
            blocks
                .iter()
                .position(|b| &b.id == id)
                .map(|index| (zone, index))
        })
    }

    pub fn block(&self, id: &BlockId) -> Option<&GlyphBlock> {
        self.position(id).map(|(zone, index)| &self.zones[zone][index])
    }

    pub fn selected(&self) -> impl Iterator<Item = &GlyphBlock> {
        self.blocks().filter(|b| b.selected)
    }

    pub fn selected_ids(&self) -> Vec<BlockId> {
        self.selected().map(|b| b.id.clone()).collect()
    }

    /// Copy of the timeline with every selection flag cleared.
    ///
    /// Selection is view state; history snapshots and content comparisons
    /// go through this.
    pub fn without_selection(&self) -> Self {
        let mut copy = self.clone();
        for block in copy.blocks_mut() {
            block.selected = false;
        }
        copy
    }

    /// Equality that ignores selection flags.
    pub fn same_content(&self, other: &Self) -> bool {
        self.zones.len() == other.zones.len()
            && self.zones.iter().zip(&other.zones).all(|(a, b)| {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| {
                        x.id == y.id
                            && x.zone == y.zone
                            && x.start_ms == y.start_ms
                            && x.duration_ms == y.duration_ms
                            && x.brightness == y.brightness
                            && x.effect == y.effect
                            && x.effect_data == y.effect_data
                    })
            })
    }

    /// Latest block end across all zones.
    pub fn end_ms(&self) -> f64 {
        self.blocks().map(GlyphBlock::end_ms).fold(0.0, f64::max)
    }
}

impl Serialize for TimelineState {
    /// Serialized as a `{ "<zone>": [block, ...] }` map, the project file layout.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.zones.iter().enumerate().map(|(i, z)| (i.to_string(), z)))
    }
}
