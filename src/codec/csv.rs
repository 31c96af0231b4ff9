//! CSV text form of the brightness matrix.
//!
//! One line per frame, comma-separated zone values, lines joined by CRLF and
//! a trailing comma after the last line. Parsing is lenient and reports what
//! it repaired; [`validate_csv`] is the strict check used before export.

use super::{BrightnessMatrix, CodecError};
use crate::model::MAX_BRIGHTNESS;

/// Something the lenient parser had to repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvWarning {
    /// Row had fewer values than the matrix width; padded with zeros.
    ShortRow { line: usize, found: usize },
    /// Row had more values than the matrix width; extra values dropped.
    LongRow { line: usize, found: usize },
    /// Value above full brightness; clamped.
    Clamped { line: usize, value: i64 },
}

/// Parsed matrix plus repairs made along the way.
#[derive(Debug, Clone)]
pub struct CsvImport {
    pub matrix: BrightnessMatrix,
    pub warnings: Vec<CsvWarning>,
}

impl BrightnessMatrix {
    /// Render as the CSV export text.
    pub fn to_csv(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut out = self
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .map(u16::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("\r\n");
        out.push(',');
        out
    }
}

/// Parse CSV text leniently.
///
/// The width is `columns` when given, else the width of the first row.
/// Blank lines are skipped and a trailing comma on a line is ignored.
pub fn parse_csv(text: &str, columns: Option<usize>) -> Result<CsvImport, CodecError> {
    let lines = numbered_rows(text)
        .map(|(line, fields)| parse_fields(line, &fields).map(|values| (line, values)))
        .collect::<Result<Vec<_>, _>>()?;

    let width = match (columns, lines.first()) {
        (Some(columns), _) => columns,
        (None, Some((_, first))) => first.len(),
        (None, None) => return Err(CodecError::Empty),
    };
    if lines.is_empty() {
        return Err(CodecError::Empty);
    }

    let mut warnings = Vec::new();
    let mut rows = Vec::with_capacity(lines.len());
    for (line, values) in lines {
        let found = values.len();
        if found < width {
            warnings.push(CsvWarning::ShortRow { line, found });
        } else if found > width {
            warnings.push(CsvWarning::LongRow { line, found });
        }
        let mut row: Vec<u16> = values
            .into_iter()
            .take(width)
            .map(|value| {
                if value > MAX_BRIGHTNESS as i64 {
                    warnings.push(CsvWarning::Clamped { line, value });
                }
                value.clamp(0, MAX_BRIGHTNESS as i64) as u16
            })
            .collect();
        row.resize(width, 0);
        rows.push(row);
    }

    if !warnings.is_empty() {
        log::warn!("repaired {} issue(s) while parsing CSV", warnings.len());
    }

    Ok(CsvImport {
        matrix: BrightnessMatrix::from_rows(rows, width)?,
        warnings,
    })
}

/// Strict check: every row exactly `columns` wide with values in range.
///
/// Returns the row count.
pub fn validate_csv(text: &str, columns: usize) -> Result<usize, CodecError> {
    let mut count = 0;
    for (line, fields) in numbered_rows(text) {
        if fields.len() != columns {
            return Err(CodecError::MalformedRow {
                line,
                expected: columns,
                found: fields.len(),
            });
        }
        for value in parse_fields(line, &fields)? {
            if value > MAX_BRIGHTNESS as i64 {
                return Err(CodecError::InvalidValue {
                    line,
                    value: value.to_string(),
                });
            }
        }
        count += 1;
    }
    if count == 0 {
        return Err(CodecError::Empty);
    }
    Ok(count)
}

/// Non-blank lines split into trimmed fields, with 1-based line numbers.
fn numbered_rows(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines().enumerate().filter_map(|(i, raw)| {
        let line = raw.trim();
        if line.is_empty() {
            return None;
        }
        let line = line.strip_suffix(',').unwrap_or(line);
        Some((i + 1, line.split(',').map(str::trim).collect()))
    })
}

fn parse_fields(line: usize, fields: &[&str]) -> Result<Vec<i64>, CodecError> {
    fields
        .iter()
        .map(|field| {
            field
                .parse::<i64>()
                .ok()
                .or_else(|| field.parse::<f64>().ok().map(|v| v.round() as i64))
                .filter(|v| *v >= 0)
                .ok_or_else(|| CodecError::InvalidValue {
                    line,
                    value: field.to_string(),
                })
        })
        .collect()
}
