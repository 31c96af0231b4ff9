//! End-to-end flows combining audio, generation, codec and store.

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::audio::{load_audio, AudioError};
use crate::codec::{
    compress_payload, decompress_payload, extract_author, parse_csv, validate_csv,
    BrightnessMatrix, CodecError, CsvWarning, ExportMetadata, ProjectError, Segmentation,
};
use crate::generate::{generate_matrix, GenerationConfig, GenerationError, LedBands};
use crate::timeline::TimelineStore;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("Project error: {0}")]
    Project(#[from] ProjectError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A generated matrix and the length of the audio it was made from.
#[derive(Debug, Clone)]
pub struct Generated {
    pub matrix: BrightnessMatrix,
    pub audio_ms: f64,
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Generate a matrix from mono samples, seeded from `config.seed`.
pub fn generate_from_samples(
    samples: &[f32],
    sample_rate: u32,
    bands: &LedBands,
    config: &GenerationConfig,
) -> Result<BrightnessMatrix, PipelineError> {
    let mut rng = rng_for(config.seed);
    Ok(generate_matrix(samples, sample_rate, bands, config, &mut rng)?)
}

/// Decode an audio file, downmix it and generate a matrix.
pub fn generate_from_file<P: AsRef<Path>>(
    audio_path: P,
    bands: &LedBands,
    config: &GenerationConfig,
) -> Result<Generated, PipelineError> {
    let audio = load_audio(audio_path.as_ref())?;
    let mono = audio.to_mono();
    let matrix = generate_from_samples(&mono, audio.sample_rate, bands, config)?;
    Ok(Generated {
        matrix,
        audio_ms: audio.duration_ms(),
    })
}

/// Generate for every zone of the store's device and load the result.
///
/// Zones are split evenly into low, mid and high bands. The store's audio
/// duration is set from the samples. Undoable as one step.
pub fn generate_into_store(
    store: &mut TimelineStore,
    samples: &[f32],
    sample_rate: u32,
    config: &GenerationConfig,
    segmentation: &Segmentation,
) -> Result<(), PipelineError> {
    if sample_rate == 0 {
        return Err(GenerationError::SampleRate.into());
    }
    let bands = LedBands::even_split(store.zone_count());
    let matrix = generate_from_samples(samples, sample_rate, &bands, config)?;
    store.set_audio_duration_ms(samples.len() as f64 * 1000.0 / sample_rate as f64);
    store.import_matrix(&matrix, segmentation);
    Ok(())
}

/// Flatten the store into the metadata tags handed to the muxer.
///
/// The CSV is validated strictly before it is compressed.
pub fn export_payload(store: &mut TimelineStore) -> Result<ExportMetadata, PipelineError> {
    let columns = store.zone_count();
    let csv = store.export_matrix().to_csv();
    let rows = validate_csv(&csv, columns)?;
    let author = compress_payload(&csv)?;
    log::info!(
        "exported {} rows x {} columns ({} bytes compressed)",
        rows,
        columns,
        author.len()
    );
    Ok(ExportMetadata::new(columns, author))
}

/// Load a timeline from a metadata dump carrying an AUTHOR payload.
///
/// Returns the repairs made to malformed CSV rows. Undoable as one step.
/// Blocks are fitted to the store's audio as [`TimelineStore::import_matrix`]
/// does.
pub fn import_payload(
    store: &mut TimelineStore,
    metadata: &str,
    segmentation: &Segmentation,
) -> Result<Vec<CsvWarning>, PipelineError> {
    let author = extract_author(metadata).ok_or(CodecError::MissingAuthor)?;
    let csv = decompress_payload(&author)?;
    let import = parse_csv(&csv, Some(store.zone_count()))?;
    store.import_matrix(&import.matrix, segmentation);
    Ok(import.warnings)
}

/// Import a payload read from a metadata file on disk.
pub fn import_payload_file<P: AsRef<Path>>(
    store: &mut TimelineStore,
    metadata_path: P,
    segmentation: &Segmentation,
) -> Result<Vec<CsvWarning>, PipelineError> {
    let metadata = std::fs::read_to_string(metadata_path)?;
    import_payload(store, &metadata, segmentation)
}

/// Write the store's metadata tags as an ffmetadata file.
pub fn export_payload_file<P: AsRef<Path>>(
    store: &mut TimelineStore,
    metadata_path: P,
) -> Result<ExportMetadata, PipelineError> {
    let metadata = export_payload(store)?;
    std::fs::write(metadata_path, metadata.to_ffmetadata())?;
    Ok(metadata)
}
