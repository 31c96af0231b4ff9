//! Conversions between the timeline and its external forms.
//!
//! - `matrix`: blocks ⇄ dense frame × zone brightness table
//! - `csv`: the table's text form
//! - `payload`: compressed metadata payload and tags
//! - `project`: editable project JSON

mod csv;
mod matrix;
mod payload;
mod project;

use thiserror::Error;

pub use csv::{parse_csv, validate_csv, CsvImport, CsvWarning};
pub use matrix::{decode_matrix, encode_matrix, segment_column, BrightnessMatrix, Segmentation};
pub use payload::{
    compress_payload, decompress_payload, extract_author, ExportMetadata, DEFAULT_CUSTOM1,
};
pub use project::{
    load_project, parse_project, project_to_json, save_project, ProjectError, ProjectImport,
};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Row {line} has {found} values, expected {expected}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Row {line} holds invalid brightness {value:?}")]
    InvalidValue { line: usize, value: String },

    #[error("Matrix is empty")]
    Empty,

    #[error("No AUTHOR payload found in metadata")]
    MissingAuthor,

    #[error("Payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
