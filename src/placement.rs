//! Block placement rules.
//!
//! Every block that enters a zone goes through [`can_place`]: shape, audio
//! bounds, minimum duration and overlap with the zone's other blocks, checked
//! in that order. Intervals are half-open, so blocks may touch.

use thiserror::Error;

use crate::model::{BlockId, GlyphBlock};

/// Shortest block the editor accepts, in milliseconds.
pub const MIN_DURATION_MS: f64 = 20.0;

/// How far a failed add at the cursor is shifted back before retrying.
pub const RETRY_OFFSET_MS: f64 = 200.0;

/// Why a block could not be placed.
///
/// The `Display` text is meant for the user and names the valid range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    #[error("Invalid block: duration must be positive and start must not be negative (got start {start_ms:.0} ms, duration {duration_ms:.0} ms)")]
    InvalidShape { start_ms: f64, duration_ms: f64 },

    #[error("Block must lie within the audio (0 to {audio_ms:.0} ms), got {start_ms:.0} to {end_ms:.0} ms")]
    OutOfBounds {
        start_ms: f64,
        end_ms: f64,
        audio_ms: f64,
    },

    #[error("Block is too short: duration must be at least {min_ms:.0} ms (got {duration_ms:.1} ms)")]
    TooShort { duration_ms: f64, min_ms: f64 },

    #[error("Block overlaps block {neighbor} on zone {zone} ({neighbor_start_ms:.0} to {neighbor_end_ms:.0} ms)")]
    Overlap {
        zone: usize,
        neighbor: BlockId,
        neighbor_start_ms: f64,
        neighbor_end_ms: f64,
    },

    #[error("Zone {zone} does not exist (device has {zone_count} zones)")]
    UnknownZone { zone: usize, zone_count: usize },

    #[error("Block {id} is not on the timeline")]
    UnknownBlock { id: BlockId },
}

/// One block an operation could not apply.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Id of the source block (clipboard entry, selected block, ...).
    pub block: BlockId,
    pub zone: usize,
    pub error: PlacementError,
}

/// `[a0, a1)` and `[b0, b1)` intersect.
pub fn intervals_overlap(a0: f64, a1: f64, b0: f64, b1: f64) -> bool {
    a0 < b1 && a1 > b0
}

/// Check whether `candidate` may sit among `existing` (one zone's blocks).
///
/// `skip_index` names the block the candidate replaces during an in-place
/// update so it is not compared against its own prior self.
pub fn can_place(
    candidate: &GlyphBlock,
    existing: &[GlyphBlock],
    audio_ms: f64,
    skip_index: Option<usize>,
) -> Result<(), PlacementError> {
    let start = candidate.start_ms;
    let duration = candidate.duration_ms;
    let end = candidate.end_ms();

    if duration.is_nan() || duration <= 0.0 || start.is_nan() || start < 0.0 {
        return Err(PlacementError::InvalidShape {
            start_ms: start,
            duration_ms: duration,
        });
    }

    if start >= audio_ms || end > audio_ms {
        return Err(PlacementError::OutOfBounds {
            start_ms: start,
            end_ms: end,
            audio_ms,
        });
    }

    if duration < MIN_DURATION_MS {
        return Err(PlacementError::TooShort {
            duration_ms: duration,
            min_ms: MIN_DURATION_MS,
        });
    }

    let collision = existing
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != skip_index)
        .map(|(_, b)| b)
        .find(|b| intervals_overlap(start, end, b.start_ms, b.end_ms()));

    if let Some(neighbor) = collision {
        return Err(PlacementError::Overlap {
            zone: candidate.zone,
            neighbor: neighbor.id.clone(),
            neighbor_start_ms: neighbor.start_ms,
            neighbor_end_ms: neighbor.end_ms(),
        });
    }

    Ok(())
}

/// Index at which `start_ms` keeps `blocks` ordered by start time.
pub fn insertion_index(blocks: &[GlyphBlock], start_ms: f64) -> usize {
    blocks.partition_point(|b| b.start_ms <= start_ms)
}

/// Validate and insert `block` in start order. Returns its index.
pub fn place(
    blocks: &mut Vec<GlyphBlock>,
    block: GlyphBlock,
    audio_ms: f64,
) -> Result<usize, PlacementError> {
    can_place(&block, blocks, audio_ms, None)?;
    let index = insertion_index(blocks, block.start_ms);
    blocks.insert(index, block);
    Ok(index)
}

/// [`place`], retrying once with the start shifted back by [`RETRY_OFFSET_MS`].
///
/// Recovers the common case of a click landing slightly inside an existing
/// block. The first error is returned when the retry fails too.
pub fn place_with_retry(
    blocks: &mut Vec<GlyphBlock>,
    block: GlyphBlock,
    audio_ms: f64,
) -> Result<usize, PlacementError> {
    match can_place(&block, blocks, audio_ms, None) {
        Ok(()) => place(blocks, block, audio_ms),
        Err(first) => {
            let zone = block.zone;
            let mut shifted = block;
            shifted.start_ms -= RETRY_OFFSET_MS;
            log::debug!(
                "placement on zone {} rejected ({}), retrying at {:.1} ms",
                zone,
                first,
                shifted.start_ms
            );
            place(blocks, shifted, audio_ms).map_err(|retry| {
                log::warn!("dropping block on zone {}: {}", zone, retry);
                first
            })
        }
    }
}

/// Replace the block at `index` with `updated`, keeping start order.
///
/// The block is validated against its neighbours only. On failure the zone
/// is left untouched.
pub fn replace_at(
    blocks: &mut Vec<GlyphBlock>,
    index: usize,
    updated: GlyphBlock,
    audio_ms: f64,
) -> Result<usize, PlacementError> {
    can_place(&updated, blocks, audio_ms, Some(index))?;
    blocks.remove(index);
    let new_index = insertion_index(blocks, updated.start_ms);
    blocks.insert(new_index, updated);
    Ok(new_index)
}

/// True when `blocks` are ordered by start and pairwise disjoint.
pub fn is_consistent(blocks: &[GlyphBlock]) -> bool {
    blocks
        .windows(2)
        .all(|w| w[0].start_ms <= w[1].start_ms && w[0].end_ms() <= w[1].start_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Effect;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const AUDIO_MS: f64 = 5000.0;

    fn block(start: f64, duration: f64) -> GlyphBlock {
        let mut rng = StdRng::seed_from_u64(0);
        GlyphBlock::new(0, start, duration, 4095, Effect::Constant, &mut rng)
    }

    #[test]
    fn test_touching_blocks_are_allowed() {
        let mut zone = Vec::new();
        place(&mut zone, block(0.0, 500.0), AUDIO_MS).unwrap();
        let err = place(&mut zone, block(400.0, 200.0), AUDIO_MS).unwrap_err();
        assert!(matches!(err, PlacementError::Overlap { .. }));
        place(&mut zone, block(500.0, 200.0), AUDIO_MS).unwrap();
        assert_eq!(zone.len(), 2);
        assert!(is_consistent(&zone));
    }

    #[test]
    fn test_check_order() {
        let existing = vec![block(0.0, 100.0)];
        assert!(matches!(
            can_place(&block(-1.0, 0.0), &existing, AUDIO_MS, None),
            Err(PlacementError::InvalidShape { .. })
        ));
        assert!(matches!(
            can_place(&block(4990.0, 5.0), &existing, AUDIO_MS, None),
            Err(PlacementError::TooShort { .. })
        ));
        assert!(matches!(
            can_place(&block(4990.0, 50.0), &existing, AUDIO_MS, None),
            Err(PlacementError::OutOfBounds { .. })
        ));
        assert!(matches!(
            can_place(&block(5000.0, 20.0), &existing, AUDIO_MS, None),
            Err(PlacementError::OutOfBounds { .. })
        ));
        // Too short wins over overlap.
        assert!(matches!(
            can_place(&block(50.0, 10.0), &existing, AUDIO_MS, None),
            Err(PlacementError::TooShort { .. })
        ));
    }

    #[test]
    fn test_block_ending_at_audio_end_is_allowed() {
        assert!(can_place(&block(4500.0, 500.0), &[], AUDIO_MS, None).is_ok());
    }

    #[test]
    fn test_ordered_insertion() {
        let mut zone = Vec::new();
        for start in [3000.0, 1000.0, 2000.0, 0.0] {
            place(&mut zone, block(start, 100.0), AUDIO_MS).unwrap();
        }
        let starts: Vec<f64> = zone.iter().map(|b| b.start_ms).collect();
        assert_eq!(starts, vec![0.0, 1000.0, 2000.0, 3000.0]);
    }

    #[test]
    fn test_retry_shifts_back() {
        let mut zone = vec![block(0.0, 1000.0)];
        // Lands 100 ms inside the next free slot's neighbour.
        let mut candidate = block(1900.0, 300.0);
        zone.push(block(2000.0, 500.0));
        let index = place_with_retry(&mut zone, candidate.clone(), AUDIO_MS).unwrap();
        assert_eq!(zone[index].start_ms, 1700.0);

        candidate.start_ms = 2100.0;
        let err = place_with_retry(&mut zone, candidate, AUDIO_MS).unwrap_err();
        assert!(matches!(err, PlacementError::Overlap { .. }));
        assert_eq!(zone.len(), 3);
    }

    #[test]
    fn test_replace_skips_itself() {
        let mut zone = vec![block(0.0, 500.0), block(1000.0, 500.0)];
        let mut moved = zone[0].clone();
        moved.duration_ms = 800.0;
        replace_at(&mut zone, 0, moved.clone(), AUDIO_MS).unwrap();
        assert_eq!(zone[0].duration_ms, 800.0);

        moved.duration_ms = 1200.0;
        let err = replace_at(&mut zone, 0, moved, AUDIO_MS).unwrap_err();
        assert!(matches!(err, PlacementError::Overlap { .. }));
        assert_eq!(zone[0].duration_ms, 800.0);
    }

    #[test]
    fn test_replace_reorders_when_jumping_past_neighbour() {
        let mut zone = vec![block(0.0, 100.0), block(1000.0, 100.0)];
        let mut moved = zone[0].clone();
        moved.start_ms = 3000.0;
        let index = replace_at(&mut zone, 0, moved, AUDIO_MS).unwrap();
        assert_eq!(index, 1);
        assert!(is_consistent(&zone));
    }

    #[test]
    fn test_error_messages_name_the_range() {
        let err = can_place(&block(4900.0, 300.0), &[], AUDIO_MS, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Block must lie within the audio (0 to 5000 ms), got 4900 to 5200 ms"
        );
    }
}
