//! Integration tests for audio-driven generation.


use glyph_timeline::audio::{concat, generate_sine, generate_test_beat};
use glyph_timeline::generate::{SustainDecay, ThresholdOverrides};
use glyph_timeline::model::frame_index;
use glyph_timeline::pipeline::{generate_from_samples, generate_into_store};
use glyph_timeline::{
    generate_matrix, DeviceModel, GenerationConfig, GenerationError, LedBands, PipelineError,
    Segmentation, Strategy, MAX_BRIGHTNESS,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use timeline_fixtures::{init_logging, store_with_audio};

const SAMPLE_RATE: u32 = 44100;

fn seeded(strategy: Strategy, seed: u64) -> GenerationConfig {
    GenerationConfig {
        strategy,
        seed: Some(seed),
        ..Default::default()
    }
}

#[test]
fn test_matrix_covers_track() {
    init_logging();
    let samples = generate_test_beat(120.0, SAMPLE_RATE, 2.0);
    let bands = LedBands::even_split(5);
    let matrix =
        generate_from_samples(&samples, SAMPLE_RATE, &bands, &seeded(Strategy::default(), 1))
            .unwrap();

    assert_eq!(matrix.columns(), 5);
    assert_eq!(matrix.row_count(), frame_index(2000.0));
}

#[test]
fn test_silence_stays_dark() {
    let samples = vec![0.0; SAMPLE_RATE as usize];
    for strategy in [Strategy::default(), Strategy::dynamic()] {
        let matrix = generate_from_samples(
            &samples,
            SAMPLE_RATE,
            &LedBands::even_split(15),
            &seeded(strategy, 3),
        )
        .unwrap();
        assert_eq!(matrix.row_count(), frame_index(1000.0));
        assert!(matrix.rows().iter().flatten().all(|&v| v == 0));
    }
}

#[test]
fn test_kicks_light_the_low_band() {
    init_logging();
    let samples = generate_test_beat(120.0, SAMPLE_RATE, 2.0);
    // even_split(5): low = [0], mid = [1, 2, 3], high = [4].
    let matrix = generate_from_samples(
        &samples,
        SAMPLE_RATE,
        &LedBands::even_split(5),
        &seeded(Strategy::default(), 1),
    )
    .unwrap();

    let low = matrix.column(0);
    assert!(low.iter().any(|&v| v > 0), "low band never lit");
}

#[test]
fn test_sustain_holds_then_decays() {
    let samples = generate_test_beat(120.0, SAMPLE_RATE, 2.0);
    let config = GenerationConfig {
        strategy: Strategy::SustainDecay {
            sustain_frames: 4,
            decay_factor: 0.5,
        },
        seed: Some(2),
        ..Default::default()
    };
    let matrix =
        generate_from_samples(&samples, SAMPLE_RATE, &LedBands::even_split(5), &config).unwrap();

    let low = matrix.column(0);
    let first = low.iter().position(|&v| v > 0).unwrap();
    assert!(low[first..first + 4].iter().all(|&v| v == low[first]));
}

#[test]
fn test_sustain_filter_directly() {
    let mut filter = SustainDecay::new(1, 2, 0.5);
    let levels: Vec<u16> = [800, 0, 0, 0]
        .iter()
        .map(|&t| {
            let mut row = [t];
            filter.apply(&mut row);
            row[0]
        })
        .collect();
    assert_eq!(levels, vec![800, 800, 400, 200]);
}

#[test]
fn test_amplitude_override_silences_everything() {
    let samples = generate_test_beat(120.0, SAMPLE_RATE, 1.0);
    let config = GenerationConfig {
        thresholds: ThresholdOverrides {
            amplitude: Some(f32::MAX),
            ..Default::default()
        },
        ..seeded(Strategy::dynamic(), 4)
    };
    let matrix =
        generate_from_samples(&samples, SAMPLE_RATE, &LedBands::even_split(5), &config).unwrap();
    assert!(matrix.rows().iter().flatten().all(|&v| v == 0));
}

#[test]
fn test_generation_is_reproducible() {
    let samples = concat(&[
        generate_test_beat(140.0, SAMPLE_RATE, 1.5),
        generate_sine(3000.0, SAMPLE_RATE, 0.5, 0.6),
    ]);
    let bands = LedBands::even_split(33);
    let config = seeded(Strategy::dynamic(), 42);

    let a = generate_from_samples(&samples, SAMPLE_RATE, &bands, &config).unwrap();
    let b = generate_from_samples(&samples, SAMPLE_RATE, &bands, &config).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.row_count(), frame_index(2000.0));
    assert!(a.rows().iter().flatten().all(|&v| v <= MAX_BRIGHTNESS));
}

#[test]
fn test_dynamic_with_certain_overlays() {
    let samples = generate_test_beat(180.0, SAMPLE_RATE, 3.0);
    let config = seeded(
        Strategy::Dynamic {
            reshuffle_interval: 30,
            segment_effect_probability: 1.0,
        },
        9,
    );
    let bands = LedBands::even_split(26);
    let mut rng = StdRng::seed_from_u64(9);
    let matrix = generate_matrix(&samples, SAMPLE_RATE, &bands, &config, &mut rng).unwrap();
    assert_eq!(matrix.columns(), 26);
    assert!(matrix.rows().iter().flatten().any(|&v| v > 0));
}

#[test]
fn test_custom_band_layout() {
    let samples = generate_test_beat(120.0, SAMPLE_RATE, 1.0);
    let bands = LedBands::new(5, vec![4, 0], vec![], vec![2]).unwrap();
    let matrix =
        generate_from_samples(&samples, SAMPLE_RATE, &bands, &seeded(Strategy::default(), 5))
            .unwrap();
    // LEDs outside every band stay dark.
    for led in [1, 3] {
        assert!(matrix.column(led).iter().all(|&v| v == 0));
    }
}

#[test]
fn test_invalid_inputs_are_rejected() {
    assert!(matches!(
        LedBands::new(5, vec![0], vec![7], vec![]),
        Err(GenerationError::LedOutOfRange {
            led: 7,
            zone_count: 5
        })
    ));

    let samples = vec![0.0; 4410];
    let bands = LedBands::even_split(5);
    let bad_frame = GenerationConfig {
        frame_size: 1000,
        ..Default::default()
    };
    assert!(matches!(
        generate_from_samples(&samples, SAMPLE_RATE, &bands, &bad_frame),
        Err(PipelineError::Generation(GenerationError::FrameSize(1000)))
    ));
    assert!(matches!(
        generate_from_samples(&samples, 0, &bands, &GenerationConfig::default()),
        Err(PipelineError::Generation(GenerationError::SampleRate))
    ));
}

#[test]
fn test_generate_into_store_is_one_undo_step() {
    init_logging();
    let mut store = store_with_audio(DeviceModel::Np1Fine, 0.0);
    let samples = generate_test_beat(120.0, SAMPLE_RATE, 2.0);
    generate_into_store(
        &mut store,
        &samples,
        SAMPLE_RATE,
        &seeded(Strategy::default(), 8),
        &Segmentation::default(),
    )
    .unwrap();

    assert!((store.audio_duration_ms() - 2000.0).abs() < 1e-9);
    assert!(!store.state().is_empty());
    assert!(store.state().blocks().all(|b| b.end_ms() <= 2000.0));

    assert!(store.undo());
    assert!(store.state().is_empty());
    assert!(!store.can_undo());
}
