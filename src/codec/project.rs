//! Project JSON: the zone → blocks mapping, saved and loaded as-is.
//!
//! Loading is two-staged. Every block is first checked structurally; one
//! malformed block aborts the whole load. Structurally sound blocks then go
//! through the placement rules one by one and those that break them are
//! reported instead of loaded.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{clamp_brightness, BlockId, Effect, GlyphBlock, TimelineState};
use crate::placement::{self, Rejection};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Project must be an object mapping zone numbers to block lists")]
    NotAnObject,

    #[error("Project key {0:?} is not a zone number")]
    InvalidZoneKey(String),

    #[error("Project uses zone {zone} but the device has {zone_count} zones")]
    ZoneOutOfRange { zone: usize, zone_count: usize },

    #[error("Zone {zone} must hold a list of blocks")]
    NotAList { zone: usize },

    #[error("Block {index} in zone {zone} is malformed: {reason}")]
    InvalidBlock {
        zone: usize,
        index: usize,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of loading a project.
#[derive(Debug, Clone)]
pub struct ProjectImport {
    pub state: TimelineState,
    /// Blocks dropped because they broke a placement rule.
    pub rejected: Vec<Rejection>,
}

/// Pretty-printed project text.
pub fn project_to_json(state: &TimelineState) -> Result<String, ProjectError> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Parse and place a project for a device with `zone_count` zones.
pub fn parse_project(
    json: &str,
    zone_count: usize,
    audio_ms: f64,
) -> Result<ProjectImport, ProjectError> {
    let value: Value = serde_json::from_str(json)?;
    let zones = value.as_object().ok_or(ProjectError::NotAnObject)?;

    let mut candidates = Vec::new();
    for (key, blocks) in zones {
        let zone: usize = key
            .trim()
            .parse()
            .map_err(|_| ProjectError::InvalidZoneKey(key.clone()))?;
        if zone >= zone_count {
            return Err(ProjectError::ZoneOutOfRange { zone, zone_count });
        }
        let list = blocks.as_array().ok_or(ProjectError::NotAList { zone })?;
        for (index, entry) in list.iter().enumerate() {
            let mut block = parse_block(entry).map_err(|reason| ProjectError::InvalidBlock {
                zone,
                index,
                reason,
            })?;
            if block.zone != zone {
                log::debug!(
                    "block {} claims zone {} but is stored under {}",
                    block.id,
                    block.zone,
                    zone
                );
                block.zone = zone;
            }
            candidates.push(block);
        }
    }

    candidates.sort_by(|a, b| a.start_ms.total_cmp(&b.start_ms));

    let mut state = TimelineState::with_zones(zone_count);
    let mut rejected = Vec::new();
    for block in candidates {
        let (id, zone) = (block.id.clone(), block.zone);
        let Some(blocks) = state.zone_mut(zone) else {
            continue;
        };
        if let Err(error) = placement::place(blocks, block, audio_ms) {
            log::warn!("dropping block {} on zone {}: {}", id, zone, error);
            rejected.push(Rejection {
                block: id,
                zone,
                error,
            });
        }
    }

    log::info!(
        "loaded project with {} blocks ({} rejected)",
        state.block_count(),
        rejected.len()
    );
    Ok(ProjectImport { state, rejected })
}

pub fn save_project(path: impl AsRef<Path>, state: &TimelineState) -> Result<(), ProjectError> {
    fs::write(path, project_to_json(state)?)?;
    Ok(())
}

pub fn load_project(
    path: impl AsRef<Path>,
    zone_count: usize,
    audio_ms: f64,
) -> Result<ProjectImport, ProjectError> {
    let json = fs::read_to_string(path)?;
    parse_project(&json, zone_count, audio_ms)
}

fn parse_block(entry: &Value) -> Result<GlyphBlock, String> {
    let obj = entry
        .as_object()
        .ok_or_else(|| String::from("expected an object"))?;

    let id = field(obj, "id")?
        .as_str()
        .ok_or_else(|| String::from("`id` must be a string"))?;
    let zone = non_negative(obj, "glyphId")?;
    let start_ms = non_negative(obj, "startTimeMilis")?;
    let duration_ms = non_negative(obj, "durationMilis")?;
    let brightness = non_negative(obj, "startingBrightness")?;
    let selected = field(obj, "isSelected")?
        .as_bool()
        .ok_or_else(|| String::from("`isSelected` must be a boolean"))?;
    let effect_id = non_negative(obj, "effectId")?;
    let effect_data = field(obj, "effectData")?
        .as_array()
        .ok_or_else(|| String::from("`effectData` must be an array"))?
        .iter()
        .map(|v| {
            v.as_f64()
                .filter(|n| *n >= 0.0)
                .map(clamp_brightness)
                .ok_or_else(|| String::from("`effectData` must hold non-negative numbers"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GlyphBlock {
        id: BlockId::from(id),
        zone: zone as usize,
        start_ms,
        duration_ms,
        brightness: clamp_brightness(brightness),
        selected,
        effect: Effect::from(effect_id as u32),
        effect_data,
    })
}

fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Value, String> {
    obj.get(key).ok_or_else(|| format!("missing `{}`", key))
}

fn non_negative(obj: &Map<String, Value>, key: &str) -> Result<f64, String> {
    field(obj, key)?
        .as_f64()
        .filter(|n| *n >= 0.0)
        .ok_or_else(|| format!("`{}` must be a non-negative number", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_json(id: &str, zone: i64, start: f64, duration: f64) -> String {
        format!(
            r#"{{"id":"{}","glyphId":{},"startTimeMilis":{},"durationMilis":{},"startingBrightness":4095,"isSelected":false,"effectId":0,"effectData":[]}}"#,
            id, zone, start, duration
        )
    }

    #[test]
    fn test_loads_valid_project() {
        let json = format!(
            r#"{{"0":[{}],"1":[],"2":[{}]}}"#,
            block_json("a", 0, 0.0, 500.0),
            block_json("b", 2, 100.0, 200.0)
        );
        let import = parse_project(&json, 5, 5000.0).unwrap();
        assert!(import.rejected.is_empty());
        assert_eq!(import.state.zone_count(), 5);
        assert_eq!(import.state.zone(2)[0].id.as_str(), "b");
    }

    #[test]
    fn test_one_malformed_block_aborts() {
        let json = r#"{"0":[{"id":7,"glyphId":0}]}"#;
        let err = parse_project(json, 5, 5000.0).unwrap_err();
        match err {
            ProjectError::InvalidBlock { zone, index, reason } => {
                assert_eq!((zone, index), (0, 0));
                assert!(reason.contains("id"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let negative = format!(r#"{{"0":[{}]}}"#, block_json("a", -1, 0.0, 500.0));
        assert!(matches!(
            parse_project(&negative, 5, 5000.0),
            Err(ProjectError::InvalidBlock { .. })
        ));
    }

    #[test]
    fn test_overlapping_blocks_are_reported() {
        let json = format!(
            r#"{{"0":[{},{}]}}"#,
            block_json("a", 0, 0.0, 500.0),
            block_json("b", 0, 250.0, 500.0)
        );
        let import = parse_project(&json, 5, 5000.0).unwrap();
        assert_eq!(import.state.block_count(), 1);
        assert_eq!(import.rejected.len(), 1);
        assert_eq!(import.rejected[0].block.as_str(), "b");
    }

    #[test]
    fn test_zone_key_out_of_range() {
        assert!(matches!(
            parse_project(r#"{"7":[]}"#, 5, 5000.0),
            Err(ProjectError::ZoneOutOfRange {
                zone: 7,
                zone_count: 5
            })
        ));
        assert!(matches!(
            parse_project(r#"{"x":[]}"#, 5, 5000.0),
            Err(ProjectError::InvalidZoneKey(_))
        ));
        assert!(matches!(
            parse_project("[]", 5, 5000.0),
            Err(ProjectError::NotAnObject)
        ));
    }

    #[test]
    fn test_block_is_rehomed_to_its_bucket() {
        let json = format!(r#"{{"3":[{}]}}"#, block_json("a", 1, 0.0, 500.0));
        let import = parse_project(&json, 5, 5000.0).unwrap();
        assert_eq!(import.state.zone(3)[0].zone, 3);
        assert!(import.state.zone(1).is_empty());
    }
}
