//! The timeline store.
//!
//! Owns the zone → blocks state, selection, clipboard and undo history.
//! Every public mutation reads the current state, computes the new one and
//! records a single history snapshot when block content changed. Selection
//! lives on the blocks but is never part of history, so selecting as a side
//! effect of an edit does not cost an extra undo step.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{BlockEdit, Clipboard, History};
use crate::codec::{
    decode_matrix, encode_matrix, parse_project, project_to_json, BrightnessMatrix, ProjectError,
    Segmentation,
};
use crate::config::{ConfigError, EditorSettings};
use crate::model::{frame_index, BlockId, DeviceModel, GlyphBlock, TimelineState, TIME_STEP_MS};
use crate::placement::{self, PlacementError, Rejection};

/// Outcome of an operation touching several blocks.
///
/// Partial success is expected: each block is validated on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub applied: Vec<BlockId>,
    pub rejected: Vec<Rejection>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }

    fn reject(&mut self, block: &GlyphBlock, error: PlacementError) {
        log::warn!("block {} on zone {} rejected: {}", block.id, block.zone, error);
        self.rejected.push(Rejection {
            block: block.id.clone(),
            zone: block.zone,
            error,
        });
    }
}

pub struct TimelineStore {
    state: TimelineState,
    settings: EditorSettings,
    audio_ms: f64,
    clipboard: Clipboard,
    history: History,
    rng: StdRng,
}

impl TimelineStore {
    /// Empty store for the settings' device, with no audio loaded yet.
    pub fn new(settings: EditorSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            state: TimelineState::with_zones(settings.device.zone_count()),
            history: History::new(settings.history_limit),
            settings,
            audio_ms: 0.0,
            clipboard: Clipboard::default(),
            rng,
        })
    }

    pub fn state(&self) -> &TimelineState {
        &self.state
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Swap settings. A different device resets the timeline.
    pub fn set_settings(&mut self, settings: EditorSettings) -> Result<(), ConfigError> {
        settings.validate()?;
        let device_changed = settings.device != self.settings.device;
        self.history.set_limit(settings.history_limit);
        self.settings = settings;
        if device_changed {
            self.reset();
        }
        Ok(())
    }

    pub fn audio_duration_ms(&self) -> f64 {
        self.audio_ms
    }

    /// Duration of the loaded audio; bounds every placement.
    pub fn set_audio_duration_ms(&mut self, audio_ms: f64) {
        self.audio_ms = audio_ms.max(0.0);
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn zone_count(&self) -> usize {
        self.state.zone_count()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn commit(&mut self, before: TimelineState) {
        if !before.same_content(&self.state) {
            self.history.record(before);
        }
    }

    fn zone_blocks(&mut self, zone: usize) -> Result<&mut Vec<GlyphBlock>, PlacementError> {
        let zone_count = self.state.zone_count();
        self.state
            .zone_mut(zone)
            .ok_or(PlacementError::UnknownZone { zone, zone_count })
    }

    fn select_only(&mut self, id: &BlockId) {
        let multi = self.settings.multi_select;
        for block in self.state.blocks_mut() {
            if &block.id == id {
                block.selected = true;
            } else if !multi {
                block.selected = false;
            }
        }
    }

    /// Create a default block at the cursor on `zone`.
    ///
    /// A rejected position is retried once 200 ms earlier. The new block
    /// becomes the selection.
    pub fn add_item(&mut self, zone: usize, start_ms: f64) -> Result<BlockId, PlacementError> {
        let block = self.default_block(zone, start_ms);
        let id = block.id.clone();
        let before = self.state.without_selection();
        let audio_ms = self.audio_ms;
        placement::place_with_retry(self.zone_blocks(zone)?, block, audio_ms)?;
        log::debug!("added block {} on zone {}", id, zone);
        self.commit(before);
        self.select_only(&id);
        Ok(id)
    }

    fn default_block(&mut self, zone: usize, start_ms: f64) -> GlyphBlock {
        GlyphBlock::new(
            zone,
            start_ms,
            self.settings.default_duration_ms,
            self.settings.default_brightness,
            self.settings.default_effect,
            &mut self.rng,
        )
    }

    /// Insert a fully specified block under a fresh id.
    pub fn add_direct(&mut self, block: GlyphBlock) -> Result<BlockId, PlacementError> {
        let before = self.state.without_selection();
        let id = self.insert_fresh(block)?;
        self.commit(before);
        Ok(id)
    }

    fn insert_fresh(&mut self, block: GlyphBlock) -> Result<BlockId, PlacementError> {
        let mut block = block.duplicate();
        if block.effect_data.len() != block.frame_count() {
            block.resynthesize(&mut self.rng);
        }
        let id = block.id.clone();
        let audio_ms = self.audio_ms;
        placement::place(self.zone_blocks(block.zone)?, block, audio_ms)?;
        Ok(id)
    }

    /// Remove block `id` from `zone`. Returns whether it existed.
    pub fn remove_item(&mut self, id: &BlockId, zone: usize) -> bool {
        let before = self.state.without_selection();
        let removed = match self.state.zone_mut(zone) {
            Some(blocks) => {
                let len = blocks.len();
                blocks.retain(|b| &b.id != id);
                blocks.len() != len
            }
            None => false,
        };
        self.commit(before);
        removed
    }

    /// Remove every selected block. Returns how many were removed.
    pub fn remove_selected(&mut self) -> usize {
        let before = self.state.without_selection();
        let removed = self.drop_selected();
        self.commit(before);
        removed
    }

    fn drop_selected(&mut self) -> usize {
        let mut removed = 0;
        for zone in 0..self.state.zone_count() {
            if let Some(blocks) = self.state.zone_mut(zone) {
                let len = blocks.len();
                blocks.retain(|b| !b.selected);
                removed += len - blocks.len();
            }
        }
        removed
    }

    /// Replace the stored block with the same id by `block`.
    ///
    /// The envelope is always resynthesized. Moving to another zone checks
    /// the destination's full block list. On rejection nothing changes.
    pub fn update_item(&mut self, block: GlyphBlock) -> Result<(), PlacementError> {
        let Some((zone, index)) = self.state.position(&block.id) else {
            return Err(PlacementError::UnknownBlock { id: block.id });
        };
        self.zone_blocks(block.zone)?;
        let before = self.state.without_selection();
        let mut block = block;
        block.resynthesize(&mut self.rng);
        self.apply_update(zone, index, block)?;
        self.commit(before);
        Ok(())
    }

    fn apply_update(
        &mut self,
        zone: usize,
        index: usize,
        block: GlyphBlock,
    ) -> Result<usize, PlacementError> {
        let audio_ms = self.audio_ms;
        let target = block.zone;
        if target == zone {
            return placement::replace_at(self.zone_blocks(zone)?, index, block, audio_ms);
        }

        let new_index = placement::place(self.zone_blocks(target)?, block, audio_ms)?;
        self.zone_blocks(zone)?.remove(index);
        Ok(new_index)
    }

    /// Apply `edit` to every selected block independently.
    ///
    /// Blocks the edit would push out of bounds or onto a neighbour keep their
    /// previous values; the rest are updated.
    pub fn update_selected(&mut self, edit: &BlockEdit) -> BatchReport {
        let mut report = BatchReport::default();
        if edit.is_empty() {
            return report;
        }
        let before = self.state.without_selection();

        let mut targets: Vec<(f64, BlockId)> = self
            .state
            .selected()
            .map(|b| (b.start_ms, b.id.clone()))
            .collect();
        // Move the leading block first so a shifted selection does not
        // collide with its own not-yet-moved members.
        let forward = matches!(edit.start_ms, Some(super::Adjust::Offset(d)) if d > 0.0);
        targets.sort_by(|a, b| a.0.total_cmp(&b.0));
        if forward {
            targets.reverse();
        }

        for (_, id) in targets {
            let Some((zone, index)) = self.state.position(&id) else {
                continue;
            };
            let current = &self.state.zone(zone)[index];
            let mut edited = edit.apply(current);
            if edit.changes_envelope() {
                edited.resynthesize(&mut self.rng);
            }
            match self.apply_update(zone, index, edited.clone()) {
                Ok(_) => report.applied.push(id),
                Err(error) => report.reject(&edited, error),
            }
        }

        self.commit(before);
        report
    }

    /// Select (`Some(true)`), deselect (`Some(false)`) or toggle (`None`) a block.
    ///
    /// Without multi-select, selecting a block deselects every other block.
    pub fn toggle_selection(&mut self, id: &BlockId, select: Option<bool>) -> bool {
        let Some(current) = self.state.block(id).map(|b| b.selected) else {
            return false;
        };
        let target = select.unwrap_or(!current);
        if target {
            self.select_only(id);
        } else if let Some(block) = self.state.blocks_mut().find(|b| &b.id == id) {
            block.selected = false;
        }
        true
    }

    pub fn select_all(&mut self, select: bool) {
        for block in self.state.blocks_mut() {
            block.selected = select;
        }
    }

    /// Copy the selected blocks. Returns how many were captured.
    pub fn copy_items(&mut self) -> usize {
        self.clipboard.capture(self.state.selected(), false);
        self.clipboard.blocks().len()
    }

    /// Copy then remove the selected blocks; the clipboard becomes single-use.
    pub fn cut_items(&mut self) -> usize {
        self.clipboard.capture(self.state.selected(), true);
        let before = self.state.without_selection();
        let removed = self.drop_selected();
        self.commit(before);
        removed
    }

    /// Paste the clipboard with its earliest block starting at `anchor_ms`.
    ///
    /// Relative spacing and zones are preserved. Each block is placed on its
    /// own, so blocks landing on existing ones are rejected individually.
    pub fn paste_items(&mut self, anchor_ms: f64) -> BatchReport {
        let mut report = BatchReport::default();
        let Some(origin) = self.clipboard.anchor_ms() else {
            return report;
        };
        let blocks = self.clipboard.take_for_paste();
        let before = self.state.without_selection();

        for source in blocks {
            let mut pasted = source.clone();
            pasted.start_ms = anchor_ms + (source.start_ms - origin);
            if self.settings.modify_paste_brightness {
                pasted.brightness = self.settings.default_brightness;
                pasted.resynthesize(&mut self.rng);
            }
            match self.insert_fresh(pasted) {
                Ok(id) => report.applied.push(id),
                Err(error) => report.reject(&source, error),
            }
        }

        self.commit(before);
        report
    }

    /// Add one default block per zone in `start_zone..=end_zone` at `start_ms`.
    ///
    /// Recorded as a single undo step.
    pub fn fill_entire_zone(
        &mut self,
        start_zone: usize,
        end_zone: usize,
        start_ms: f64,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let (low, high) = (start_zone.min(end_zone), start_zone.max(end_zone));
        let before = self.state.without_selection();

        let audio_ms = self.audio_ms;
        for zone in low..=high {
            let block = self.default_block(zone, start_ms);
            let id = block.id.clone();
            let placed = self
                .zone_blocks(zone)
                .and_then(|blocks| placement::place(blocks, block.clone(), audio_ms));
            match placed {
                Ok(_) => report.applied.push(id),
                Err(error) => report.reject(&block, error),
            }
        }

        self.commit(before);
        report
    }

    /// Empty every zone, the clipboard and the history.
    pub fn reset(&mut self) {
        self.state = TimelineState::with_zones(self.settings.device.zone_count());
        self.clipboard.clear();
        self.history.clear();
    }

    /// Switch device profile; the timeline starts over with the new zone count.
    pub fn change_device_model(&mut self, device: DeviceModel) {
        self.settings.device = device;
        self.reset();
        log::info!("device changed to {} ({} zones)", device, device.zone_count());
    }

    /// Replace the whole timeline (import). Undoable.
    ///
    /// The caller vouches for the state's invariants; matrix decoding
    /// produces them by construction and project import validates first.
    pub fn replace(&mut self, state: TimelineState) {
        let before = self.state.without_selection();
        self.state = state;
        self.commit(before);
    }

    /// Rebuild the timeline from a brightness matrix. Undoable.
    ///
    /// With no audio loaded the matrix length becomes the audio duration.
    /// Otherwise blocks are cut at the audio end, and blocks with nothing lit
    /// before it are dropped. Columns beyond the device's zones are ignored.
    pub fn import_matrix(&mut self, matrix: &BrightnessMatrix, segmentation: &Segmentation) {
        if self.audio_ms <= 0.0 {
            self.audio_ms = matrix.duration_ms();
        }
        let decoded = decode_matrix(matrix, segmentation);
        let zone_count = self.state.zone_count();
        if decoded.zone_count() > zone_count {
            log::warn!(
                "matrix has {} columns, dropping those beyond zone {}",
                decoded.zone_count(),
                zone_count.saturating_sub(1)
            );
        }

        let mut zones: Vec<Vec<GlyphBlock>> = vec![Vec::new(); zone_count];
        let mut clipped = 0;
        for (zone, blocks) in decoded.zones().take(zone_count) {
            for block in blocks {
                match fit_to_audio(block, self.audio_ms) {
                    Some(fitted) => {
                        if fitted.duration_ms != block.duration_ms {
                            clipped += 1;
                        }
                        zones[zone].push(fitted);
                    }
                    None => clipped += 1,
                }
            }
        }
        if clipped > 0 {
            log::warn!(
                "{} imported blocks cut at the audio end ({:.0} ms)",
                clipped,
                self.audio_ms
            );
        }

        let state = TimelineState::from_zones(zones);
        log::info!(
            "imported {} blocks from a {}x{} matrix",
            state.block_count(),
            matrix.row_count(),
            matrix.columns()
        );
        self.replace(state);
    }

    /// Flatten the timeline into the dense export matrix.
    pub fn export_matrix(&mut self) -> BrightnessMatrix {
        encode_matrix(
            &self.state,
            self.audio_ms,
            self.state.zone_count(),
            &mut self.rng,
        )
    }

    /// Load project JSON in place of the current timeline. Undoable.
    ///
    /// Returns the blocks that were dropped for breaking a placement rule.
    pub fn import_project(&mut self, json: &str) -> Result<Vec<Rejection>, ProjectError> {
        let import = parse_project(json, self.state.zone_count(), self.audio_ms)?;
        self.replace(import.state);
        Ok(import.rejected)
    }

    pub fn project_json(&self) -> Result<String, ProjectError> {
        project_to_json(&self.state)
    }

    /// Step back one mutation. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.state.clone()) {
            Some(previous) => {
                self.state = previous;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.state.clone()) {
            Some(next) => {
                self.state = next;
                true
            }
            None => false,
        }
    }
}

/// `block` cut to end within the audio, or `None` when nothing lit remains.
fn fit_to_audio(block: &GlyphBlock, audio_ms: f64) -> Option<GlyphBlock> {
    if block.end_ms() <= audio_ms {
        return Some(block.clone());
    }
    let mut samples = block.effect_data.clone();
    samples.truncate(frame_index(audio_ms - block.start_ms));
    while !samples.is_empty() && block.start_ms + samples.len() as f64 * TIME_STEP_MS > audio_ms {
        samples.pop();
    }
    while samples.last() == Some(&0) {
        samples.pop();
    }
    if samples.is_empty() {
        return None;
    }
    Some(GlyphBlock {
        duration_ms: samples.len() as f64 * TIME_STEP_MS,
        effect_data: samples,
        ..block.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Effect;
    use crate::timeline::Adjust;

    fn store() -> TimelineStore {
        let settings = EditorSettings {
            seed: Some(11),
            ..Default::default()
        };
        let mut store = TimelineStore::new(settings).unwrap();
        store.set_audio_duration_ms(5000.0);
        store
    }

    #[test]
    fn test_add_item_selects_new_block() {
        let mut store = store();
        let first = store.add_item(0, 0.0).unwrap();
        let second = store.add_item(1, 0.0).unwrap();
        assert!(!store.state().block(&first).unwrap().selected);
        assert!(store.state().block(&second).unwrap().selected);
        assert_eq!(store.state().block(&second).unwrap().effect_data.len(), 30);
    }

    #[test]
    fn test_add_item_retries_earlier() {
        let mut store = store();
        store.add_item(0, 1000.0).unwrap();
        // The default 500 ms block would run into the block at 1000 ms.
        let id = store.add_item(0, 700.0).unwrap();
        assert_eq!(store.state().block(&id).unwrap().start_ms, 500.0);
        assert!(store.add_item(0, 1100.0).is_err());
    }

    #[test]
    fn test_add_item_unknown_zone() {
        let mut store = store();
        assert!(matches!(
            store.add_item(9, 0.0),
            Err(PlacementError::UnknownZone { zone: 9, zone_count: 5 })
        ));
        assert!(!store.can_undo());
    }

    #[test]
    fn test_selection_is_not_history() {
        let mut store = store();
        let id = store.add_item(0, 0.0).unwrap();
        store.toggle_selection(&id, Some(false));
        store.select_all(true);
        assert!(store.undo());
        assert!(store.state().is_empty());
        assert!(!store.can_undo());
    }

    #[test]
    fn test_update_selected_partial_application() {
        let mut store = store();
        store.add_item(0, 0.0).unwrap();
        store.add_item(0, 1000.0).unwrap();
        store.add_item(1, 4400.0).unwrap();
        store.select_all(true);

        let report = store.update_selected(&BlockEdit {
            duration_ms: Some(Adjust::Offset(400.0)),
            ..Default::default()
        });
        assert_eq!(report.applied.len(), 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].zone, 1);
        assert!(matches!(
            report.rejected[0].error,
            PlacementError::OutOfBounds { .. }
        ));
        assert_eq!(store.state().zone(0)[0].duration_ms, 900.0);
        assert_eq!(store.state().zone(0)[0].effect_data.len(), 54);
        assert_eq!(store.state().zone(1)[0].duration_ms, 500.0);
    }

    #[test]
    fn test_moving_selection_forward_keeps_adjacent_blocks() {
        let mut store = store();
        store.add_item(0, 0.0).unwrap();
        store.add_item(0, 500.0).unwrap();
        store.select_all(true);
        let report = store.update_selected(&BlockEdit::moved_by(300.0));
        assert!(report.is_complete());
        let starts: Vec<f64> = store.state().zone(0).iter().map(|b| b.start_ms).collect();
        assert_eq!(starts, vec![300.0, 800.0]);
    }

    #[test]
    fn test_update_item_moves_zone() {
        let mut store = store();
        let id = store.add_item(0, 0.0).unwrap();
        let mut block = store.state().block(&id).unwrap().clone();
        block.zone = 3;
        block.effect = Effect::FadeIn;
        store.update_item(block).unwrap();
        assert!(store.state().zone(0).is_empty());
        let moved = &store.state().zone(3)[0];
        assert_eq!(moved.id, id);
        assert_eq!(moved.effect_data[29], 4095);
        assert!(moved.effect_data[0] < 200);
    }

    #[test]
    fn test_update_item_unknown_block() {
        let mut store = store();
        let mut rng = StdRng::seed_from_u64(1);
        let stray = GlyphBlock::new(0, 0.0, 500.0, 4095, Effect::Constant, &mut rng);
        let err = store.update_item(stray.clone()).unwrap_err();
        assert_eq!(err, PlacementError::UnknownBlock { id: stray.id });
        assert!(store.state().is_empty());
        assert!(!store.can_undo());
    }

    #[test]
    fn test_import_matrix_cuts_blocks_at_audio_end() {
        let mut store = store();
        store.set_audio_duration_ms(1000.0);
        let mut rows = vec![vec![0u16; 5]; 120];
        for row in rows.iter_mut() {
            row[0] = 4095;
        }
        for row in rows.iter_mut().skip(80).take(10) {
            row[1] = 2000;
        }
        let matrix = BrightnessMatrix::from_rows(rows, 5).unwrap();
        store.import_matrix(&matrix, &Segmentation::default());

        let cut = &store.state().zone(0)[0];
        assert_eq!(cut.effect_data.len(), 60);
        assert!(cut.end_ms() <= 1000.0);
        assert!(store.state().zone(1).is_empty());
        assert_eq!(store.audio_duration_ms(), 1000.0);
    }

    #[test]
    fn test_import_matrix_adopts_length_without_audio() {
        let mut store = store();
        store.set_audio_duration_ms(0.0);
        let matrix = BrightnessMatrix::from_rows(vec![vec![0, 0, 7, 0, 0]; 30], 5).unwrap();
        store.import_matrix(&matrix, &Segmentation::default());
        assert!((store.audio_duration_ms() - 30.0 * TIME_STEP_MS).abs() < 1e-9);
        assert_eq!(store.state().zone(2)[0].effect_data.len(), 30);
    }

    #[test]
    fn test_cut_paste_single_use() {
        let mut store = store();
        store.add_item(0, 0.0).unwrap();
        store.select_all(true);
        assert_eq!(store.cut_items(), 1);
        assert!(store.state().is_empty());
        let report = store.paste_items(2000.0);
        assert_eq!(report.applied.len(), 1);
        assert!(store.clipboard().is_empty());
        assert!(store.paste_items(3000.0).applied.is_empty());
    }

    #[test]
    fn test_paste_overrides_brightness_when_enabled() {
        let mut store = store();
        let id = store.add_item(0, 0.0).unwrap();
        let mut block = store.state().block(&id).unwrap().clone();
        block.brightness = 1000;
        store.update_item(block).unwrap();
        store.copy_items();

        let mut settings = store.settings().clone();
        settings.modify_paste_brightness = true;
        settings.default_brightness = 2222;
        store.set_settings(settings).unwrap();

        let report = store.paste_items(1000.0);
        let pasted = store.state().block(&report.applied[0]).unwrap();
        assert_eq!(pasted.brightness, 2222);
        assert!(pasted.effect_data.iter().all(|&v| v == 2222));
    }

    #[test]
    fn test_fill_entire_zone_is_one_undo_step() {
        let mut store = store();
        let report = store.fill_entire_zone(3, 1, 100.0);
        assert_eq!(report.applied.len(), 3);
        assert_eq!(store.state().block_count(), 3);
        assert!(store.undo());
        assert!(store.state().is_empty());
        assert!(store.redo());
        assert_eq!(store.state().block_count(), 3);
    }

    #[test]
    fn test_change_device_resets() {
        let mut store = store();
        store.add_item(0, 0.0).unwrap();
        store.select_all(true);
        store.copy_items();
        store.change_device_model(DeviceModel::Np2);
        assert_eq!(store.zone_count(), 33);
        assert!(store.state().is_empty());
        assert!(store.clipboard().is_empty());
        assert!(!store.can_undo());
    }

    #[test]
    fn test_project_round_trip_through_store() {
        let mut store = store();
        store.add_item(0, 0.0).unwrap();
        store.add_item(4, 1000.0).unwrap();
        let json = store.project_json().unwrap();

        let mut other = self::store();
        let rejected = other.import_project(&json).unwrap();
        assert!(rejected.is_empty());
        assert!(other.state().same_content(store.state()));
        assert!(other.undo());
        assert!(other.state().is_empty());
    }
}
