mod common;

use common::synthetic_image::{nuclei_tile, uniform_rgba};
use histo_ensemble::algorithms::{extractor_fn, AlgorithmSpec, DEGRADED_CONFIDENCE};
use histo_ensemble::classify::ThresholdTable;
use histo_ensemble::ensemble::ConfidencePolicy;
use histo_ensemble::image::ImageRgba8;
use histo_ensemble::{
    AlgorithmResult, DiagnosticPipeline, ExtractorCatalog, InputValidationError, PipelineConfig,
    StageConfig,
};

fn constant(name: &str, weight: f32, score: f32, confidence: f32) -> AlgorithmSpec {
    AlgorithmSpec::new(
        name,
        weight,
        extractor_fn(move |_, _| AlgorithmResult::new(score, confidence)),
    )
}

#[test]
fn uniform_grey_tile_degrades_gracefully() {
    let _ = env_logger::builder().is_test(true).try_init();
    let buffer = uniform_rgba(4, 4, [128, 128, 128]);
    let pipeline = DiagnosticPipeline::new(PipelineConfig::default()).expect("defaults");

    let result = pipeline.analyze_raw(4, 4, &buffer).expect("4x4 is accepted");

    assert_eq!(result.category, "benign");
    assert_eq!(result.secondary_labels["grade"], "G1");
    assert_eq!(result.secondary_labels["risk_tier"], "low");
    assert!(result.final_score <= 0.1, "score={}", result.final_score);
    assert!(
        result.confidence <= DEGRADED_CONFIDENCE + 1e-6,
        "confidence={}",
        result.confidence
    );
    for (name, r) in result.math.breakdown.iter().chain(result.ai.breakdown.iter()) {
        assert!(r.error.is_some(), "{name} should report insufficient data");
        assert!((0.0..=1.0).contains(&r.score) && (0.0..=1.0).contains(&r.confidence));
    }
    assert_eq!(result.degraded_algorithms().len(), 5);
}

#[test]
fn near_uniform_noise_does_not_read_as_texture() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (w, h) = (64usize, 64usize);
    let mut buffer = Vec::with_capacity(w * h * 4);
    for y in 0..h {
        for x in 0..w {
            let v = 126 + ((x * 7 + y * 13) % 5) as u8;
            buffer.extend_from_slice(&[v, v, v, 255]);
        }
    }
    let pipeline = DiagnosticPipeline::new(PipelineConfig::default()).expect("defaults");

    let result = pipeline.analyze_raw(w, h, &buffer).expect("64x64 is accepted");

    for texture in [
        &result.math.breakdown["chromatin_texture"],
        &result.ai.breakdown["stromal_texture"],
    ] {
        let err = texture.error.as_deref().expect("noise must not pass as texture");
        assert!(err.starts_with("insufficient contrast levels"), "{err}");
        assert_eq!(texture.score, 0.0);
        assert!(texture.confidence <= DEGRADED_CONFIDENCE + 1e-6);
    }
}

#[test]
fn short_buffer_is_rejected() {
    let buffer = uniform_rgba(4, 4, [128, 128, 128]);
    let pipeline = DiagnosticPipeline::new(PipelineConfig::default()).expect("defaults");

    let err = pipeline
        .analyze_raw(4, 4, &buffer[..buffer.len() - 1])
        .unwrap_err();
    assert_eq!(
        err,
        InputValidationError::BufferLength {
            width: 4,
            height: 4,
            expected: 64,
            actual: 63,
        }
    );
    assert!(matches!(
        pipeline.analyze_raw(0, 4, &[]),
        Err(InputValidationError::EmptyDimensions { .. })
    ));
    assert!(matches!(
        pipeline.analyze_raw(3, 4, &buffer[..48]),
        Err(InputValidationError::TooSmall { .. })
    ));
}

#[test]
fn off_nominal_weight_sums_are_normalised() {
    let buffer = uniform_rgba(8, 8, [200, 150, 190]);
    for total in [95.0f32, 105.0] {
        let math = vec![
            constant("a", total * 0.5, 0.9, 0.8),
            constant("b", total * 0.3, 0.5, 0.8),
            constant("c", total * 0.2, 0.1, 0.8),
        ];
        let ai = vec![constant("d", total, 0.6, 0.8)];
        let pipeline =
            DiagnosticPipeline::from_specs(PipelineConfig::default(), math, ai).expect("valid");
        let result = pipeline.analyze_raw(8, 8, &buffer).expect("valid input");

        let expected = 0.5 * 0.9 + 0.3 * 0.5 + 0.2 * 0.1;
        assert!(
            (result.math.overall_score - expected).abs() < 1e-5,
            "total={total} score={}",
            result.math.overall_score
        );
        assert!((result.ai.overall_score - 0.6).abs() < 1e-6);
        assert!((0.0..=1.0).contains(&result.final_score));
    }
}

#[test]
fn confidence_is_capped_by_ceiling() {
    let buffer = uniform_rgba(8, 8, [200, 150, 190]);
    let pipeline = DiagnosticPipeline::from_specs(
        PipelineConfig::default(),
        vec![constant("a", 100.0, 1.0, 1.0)],
        vec![constant("b", 100.0, 1.0, 1.0)],
    )
    .expect("valid");
    let result = pipeline.analyze_raw(8, 8, &buffer).expect("valid input");
    assert_eq!(result.final_score, 1.0);
    assert!((result.confidence - 0.97).abs() < 1e-6);
    assert_eq!(result.category, "malignant");
}

#[test]
fn conservative_policy_reads_top_two_weights() {
    let buffer = uniform_rgba(8, 8, [200, 150, 190]);
    let mut config = PipelineConfig::default();
    config.math = StageConfig::default().with_policy(ConfidencePolicy::Conservative);
    let pipeline = DiagnosticPipeline::from_specs(
        config,
        vec![
            constant("heavy", 50.0, 0.5, 0.9),
            constant("light", 10.0, 0.5, 0.1),
            constant("middle", 40.0, 0.5, 0.6),
        ],
        vec![constant("ai", 100.0, 0.5, 0.95)],
    )
    .expect("valid");
    let result = pipeline.analyze_raw(8, 8, &buffer).expect("valid input");
    assert!((result.math.confidence - 0.6).abs() < 1e-6);
    assert!((result.confidence - 0.6).abs() < 1e-6);
}

#[test]
fn default_category_table_covers_unit_interval() {
    let table = PipelineConfig::default().category;
    table.validate().expect("valid table");
    let labels: Vec<&str> = table.brackets.iter().map(|b| b.label.as_str()).collect();
    for i in 0..=20_000 {
        let score = i as f32 / 20_000.0;
        let idx = table.bracket_index(score);
        assert!(score >= table.brackets[idx].lower_bound, "score={score}");
        if idx > 0 {
            assert!(score < table.brackets[idx - 1].lower_bound, "score={score}");
        }
        assert_eq!(table.classify(score), labels[idx]);
    }
}

#[test]
fn custom_extractor_resolves_by_name() {
    let mut catalog = ExtractorCatalog::with_builtins();
    catalog.register(
        "mean_red",
        extractor_fn(|image, _| {
            let bytes = image.as_bytes();
            let sum: u64 = bytes.chunks_exact(4).map(|px| px[0] as u64).sum();
            let mean = sum as f32 / image.pixel_count() as f32 / 255.0;
            AlgorithmResult::new(mean, 0.9).with_feature("mean_red", mean as f64)
        }),
    );
    let mut config = PipelineConfig::default();
    config.ai = StageConfig::new(&[("mean_red", 100.0)]);
    config.secondary = vec![ThresholdTable::new("flat", [(0.0, "any")]).expect("valid")];

    let pipeline = DiagnosticPipeline::with_catalog(config, &catalog).expect("valid");
    let buffer = nuclei_tile(64, 64, 16, 2, 4, 1);
    let image = ImageRgba8::new(64, 64, &buffer).expect("valid buffer");
    let result = pipeline.analyze(image).expect("valid input");

    let red = &result.ai.breakdown["mean_red"];
    assert!(red.error.is_none());
    assert!(red.score > 0.5 && red.score < 240.0 / 255.0 + 1e-6);
    assert_eq!(result.ai.overall_score, red.score);
    assert_eq!(result.secondary_labels.len(), 1);
    assert_eq!(result.secondary_labels["flat"], "any");
}

#[test]
fn panicking_extractor_is_isolated() {
    let buffer = uniform_rgba(8, 8, [200, 150, 190]);
    let pipeline = DiagnosticPipeline::from_specs(
        PipelineConfig::default(),
        vec![
            constant("steady", 50.0, 0.8, 0.8),
            AlgorithmSpec::new(
                "broken",
                50.0,
                extractor_fn(|_, _| panic!("synthetic failure")),
            ),
        ],
        vec![constant("ai", 100.0, 0.4, 0.8)],
    )
    .expect("valid");
    let result = pipeline.analyze_raw(8, 8, &buffer).expect("valid input");
    let broken = &result.math.breakdown["broken"];
    assert!(broken.error.is_some());
    assert_eq!(broken.score, 0.0);
    assert!((result.math.overall_score - 0.4).abs() < 1e-6);
}
