//! Timeline data model.
//!
//! Pure data contracts shared by every other module:
//! - [`GlyphBlock`]: one timed lighting event on one zone
//! - [`Effect`]: the brightness envelope kind applied within a block
//! - [`TimelineState`]: the zone → ordered blocks aggregate
//! - [`DeviceModel`]: device profiles and their zone counts

mod block;
mod device;
mod state;

pub use block::{frame_count, BlockId, Effect, GlyphBlock};
pub use device::{DeviceModel, UnknownDeviceModel};
pub use state::TimelineState;

/// Fixed sampling granularity in milliseconds (≈60 Hz).
pub const TIME_STEP_MS: f64 = 16.666;

/// Highest brightness a zone can be driven at.
pub const MAX_BRIGHTNESS: u16 = 4095;

/// Index of the frame containing `time_ms`, i.e. `floor(time_ms / TIME_STEP_MS)`.
///
/// Multiples of the time step land on their own frame despite float error.
pub fn frame_index(time_ms: f64) -> usize {
    if !time_ms.is_finite() || time_ms <= 0.0 {
        return 0;
    }
    (time_ms / TIME_STEP_MS + 1e-9).floor() as usize
}

/// Clamp any brightness computation into the valid `0..=4095` range.
pub fn clamp_brightness(value: f64) -> u16 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, MAX_BRIGHTNESS as f64) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_index_tolerates_step_multiples() {
        for n in 0..2000usize {
            assert_eq!(frame_index(n as f64 * TIME_STEP_MS), n);
        }
        assert_eq!(frame_index(TIME_STEP_MS * 0.5), 0);
    }

    #[test]
    fn test_clamp_brightness() {
        assert_eq!(clamp_brightness(-12.0), 0);
        assert_eq!(clamp_brightness(4095.4), 4095);
        assert_eq!(clamp_brightness(9000.0), 4095);
        assert_eq!(clamp_brightness(2047.5), 2048);
        assert_eq!(clamp_brightness(f64::NAN), 0);
    }
}
