//! Dense brightness matrix and its conversion to and from blocks.
//!
//! Encoding flattens every block into a frame × zone table. Decoding
//! segments each zone column back into blocks; it is a heuristic, since the
//! table does not record where one block ended and the next began.

use rand::Rng;

use super::CodecError;
use crate::model::{frame_index, GlyphBlock, TimelineState, MAX_BRIGHTNESS, TIME_STEP_MS};

/// Frame × zone brightness table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrightnessMatrix {
    columns: usize,
    rows: Vec<Vec<u16>>,
}

impl BrightnessMatrix {
    /// All-dark matrix.
    pub fn zeros(row_count: usize, columns: usize) -> Self {
        Self {
            columns,
            rows: vec![vec![0; columns]; row_count],
        }
    }

    /// Matrix covering `audio_ms` of audio at one row per time step.
    pub fn for_duration(audio_ms: f64, columns: usize) -> Self {
        Self::zeros(frame_index(audio_ms), columns)
    }

    /// Build from rows that must all be `columns` wide. Values are clamped.
    pub fn from_rows(rows: Vec<Vec<u16>>, columns: usize) -> Result<Self, CodecError> {
        if let Some((line, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns) {
            return Err(CodecError::MalformedRow {
                line: line + 1,
                expected: columns,
                found: row.len(),
            });
        }
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|v| v.min(MAX_BRIGHTNESS)).collect())
            .collect();
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<u16>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &[u16] {
        &self.rows[index]
    }

    pub(crate) fn row_mut(&mut self, index: usize) -> &mut [u16] {
        &mut self.rows[index]
    }

    pub fn get(&self, row: usize, column: usize) -> u16 {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .copied()
            .unwrap_or(0)
    }

    pub fn set(&mut self, row: usize, column: usize, value: u16) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value.min(MAX_BRIGHTNESS);
        }
    }

    pub fn column(&self, column: usize) -> Vec<u16> {
        self.rows
            .iter()
            .map(|r| r.get(column).copied().unwrap_or(0))
            .collect()
    }

    /// Audio time the matrix spans.
    pub fn duration_ms(&self) -> f64 {
        self.rows.len() as f64 * TIME_STEP_MS
    }
}

/// Tuning of column segmentation during decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmentation {
    /// A jump of at least this much between consecutive rows starts a new
    /// block.
    pub change_threshold: u16,
    /// Dark rows tolerated inside one block before it is closed.
    pub look_ahead: usize,
}

impl Default for Segmentation {
    fn default() -> Self {
        Self {
            change_threshold: 3096,
            look_ahead: 3,
        }
    }
}

/// Flatten `state` into a matrix of `floor(audio_ms / step)` rows.
///
/// Each block covers rows `[floor(start / step), floor(end / step))` and its
/// envelope is sampled per row. Blocks on zones beyond `columns` are skipped.
pub fn encode_matrix<R: Rng + ?Sized>(
    state: &TimelineState,
    audio_ms: f64,
    columns: usize,
    rng: &mut R,
) -> BrightnessMatrix {
    let mut matrix = BrightnessMatrix::for_duration(audio_ms, columns);
    let row_count = matrix.row_count();

    for block in state.blocks() {
        if block.zone >= columns {
            log::warn!(
                "block {} on zone {} does not fit a {}-column matrix",
                block.id,
                block.zone,
                columns
            );
            continue;
        }
        let start = frame_index(block.start_ms);
        let end = frame_index(block.end_ms());
        let frames = end.saturating_sub(start);
        for row in start..end.min(row_count) {
            let value = block.brightness_at(row - start, frames, rng);
            matrix.set(row, block.zone, value);
        }
    }

    matrix
}

/// Rebuild blocks from a matrix, one zone per column.
///
/// Every block is an imported block carrying the captured samples.
pub fn decode_matrix(matrix: &BrightnessMatrix, segmentation: &Segmentation) -> TimelineState {
    let zones = (0..matrix.columns())
        .map(|zone| {
            segment_column(&matrix.column(zone), segmentation)
                .into_iter()
                .map(|(row, samples)| GlyphBlock::imported(zone, row as f64 * TIME_STEP_MS, samples))
                .collect()
        })
        .collect();
    TimelineState::from_zones(zones)
}

/// Split one column into `(first_row, samples)` runs.
///
/// A run opens on a lit sample and extends through lit samples whose change
/// from the preceding row stays under the threshold, and through at most
/// `look_ahead` consecutive dark rows. A dark row counts as 0, so a bright
/// sample right after a dip starts a new run. Trailing dark rows are not part
/// of a run.
pub fn segment_column(column: &[u16], segmentation: &Segmentation) -> Vec<(usize, Vec<u16>)> {
    let mut segments = Vec::new();
    let mut row = 0;

    while row < column.len() {
        if column[row] == 0 {
            row += 1;
            continue;
        }

        let start = row;
        let mut last_lit = row;
        let mut previous = column[row];
        let mut dark_run = 0;
        let mut cursor = row + 1;

        while cursor < column.len() {
            let value = column[cursor];
            if value > 0 {
                if value.abs_diff(previous) >= segmentation.change_threshold {
                    break;
                }
                last_lit = cursor;
                dark_run = 0;
            } else {
                dark_run += 1;
                if dark_run > segmentation.look_ahead {
                    break;
                }
            }
            previous = value;
            cursor += 1;
        }

        segments.push((start, column[start..=last_lit].to_vec()));
        row = last_lit + 1;
    }

    segments
}
