//! Glyph Timeline Core
//!
//! Editing engine for Glyph lighting timelines synchronized to an audio
//! track.
//!
//! # Features
//!
//! - Block model with per-zone ordering and non-overlap placement rules
//! - Effect synthesis (fades, strobe, heartbeat, pulses, seeded chaos)
//! - Timeline store with selection, clipboard and snapshot undo/redo
//! - Dense brightness-matrix codec (blocks ⇄ CSV) with run-length import
//! - Compressed metadata payload and project JSON
//! - Audio-driven auto-generation via RustFFT, decoding via Symphonia

pub mod audio;
pub mod codec;
pub mod config;
pub mod effects;
pub mod generate;
pub mod model;
pub mod pipeline;
pub mod placement;
pub mod timeline;

// Re-export commonly used types
pub use audio::{load_audio, AudioData, AudioError, SpectrumAnalyzer};
pub use codec::{
    decode_matrix, encode_matrix, BrightnessMatrix, CodecError, ExportMetadata, ProjectError,
    Segmentation,
};
pub use config::{ConfigError, EditorSettings};
pub use generate::{generate_matrix, GenerationConfig, GenerationError, LedBands, Strategy};
pub use model::{
    BlockId, DeviceModel, Effect, GlyphBlock, TimelineState, MAX_BRIGHTNESS, TIME_STEP_MS,
};
pub use pipeline::{export_payload, generate_from_file, import_payload, PipelineError};
pub use placement::{PlacementError, Rejection};
pub use timeline::{Adjust, BatchReport, BlockEdit, TimelineStore};
