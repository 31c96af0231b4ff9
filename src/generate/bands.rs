//! Assignment of physical LEDs to the low, mid and high bands.

use rand::seq::SliceRandom;
use rand::Rng;

use super::GenerationError;

/// Which LEDs each logical band drives.
///
/// Values are immutable; reassignment produces a new layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedBands {
    zone_count: usize,
    low: Vec<usize>,
    mid: Vec<usize>,
    high: Vec<usize>,
}

impl LedBands {
    pub fn new(
        zone_count: usize,
        low: Vec<usize>,
        mid: Vec<usize>,
        high: Vec<usize>,
    ) -> Result<Self, GenerationError> {
        if let Some(&led) = low.iter().chain(&mid).chain(&high).find(|&&led| led >= zone_count) {
            return Err(GenerationError::LedOutOfRange { led, zone_count });
        }
        Ok(Self {
            zone_count,
            low,
            mid,
            high,
        })
    }

    /// Split zones into thirds: lowest indices to the low band.
    pub fn even_split(zone_count: usize) -> Self {
        let third = zone_count / 3;
        let mid_end = zone_count - third;
        Self {
            zone_count,
            low: (0..third).collect(),
            mid: (third..mid_end).collect(),
            high: (mid_end..zone_count).collect(),
        }
    }

    pub fn zone_count(&self) -> usize {
        self.zone_count
    }

    /// LEDs of band 0 (low), 1 (mid) or 2 (high).
    pub fn band(&self, band: usize) -> &[usize] {
        match band {
            0 => &self.low,
            1 => &self.mid,
            _ => &self.high,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        [&self.low[..], &self.mid[..], &self.high[..]].into_iter()
    }

    /// Same band sizes, LEDs dealt out in a random order.
    pub fn reshuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut leds: Vec<usize> = self.iter().flatten().copied().collect();
        leds.shuffle(rng);
        let mut rest = leds.into_iter();
        let low = rest.by_ref().take(self.low.len()).collect();
        let mid = rest.by_ref().take(self.mid.len()).collect();
        let high = rest.collect();
        Self {
            zone_count: self.zone_count,
            low,
            mid,
            high,
        }
    }
}

/// Split `[low, high)` evenly into `parts` sub-ranges.
pub fn sub_ranges(span: [f32; 2], parts: usize) -> Vec<[f32; 2]> {
    if parts == 0 {
        return Vec::new();
    }
    let width = (span[1] - span[0]) / parts as f32;
    (0..parts)
        .map(|i| {
            let start = span[0] + width * i as f32;
            [start, start + width]
        })
        .collect()
}
