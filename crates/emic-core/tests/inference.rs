//! End-to-end behavior of the inference entry points.

use std::sync::Arc;

use emic_config::{ConfigSnapshot, InferenceConfig, TestKind, ValidationError};
use emic_core::inference::{ChiSquaredTest, DistinguishabilityTest};
use emic_core::{
    generate, infer, infer_symbols, metrics, CausalStateModel, Cssr, Diagnostic, InferenceError,
    Sequence, SourceParams,
};

fn golden_sequence(len: usize, seed: u64) -> Sequence {
    generate(len, seed, &SourceParams::GoldenMean { p: 0.5 }).unwrap()
}

fn small_config() -> InferenceConfig {
    InferenceConfig::default().with_max_history_length(3)
}

// ============================================================================
// Degenerate input
// ============================================================================

#[test]
fn empty_sequence_is_malformed() {
    let err = infer_symbols(&[], 2, &InferenceConfig::default()).unwrap_err();
    assert!(matches!(err, InferenceError::MalformedInput(_)));
}

#[test]
fn empty_alphabet_is_malformed() {
    let err = infer_symbols(&[0, 0], 0, &InferenceConfig::default()).unwrap_err();
    assert!(matches!(err, InferenceError::MalformedInput(_)));
}

#[test]
fn out_of_range_symbol_is_rejected() {
    let err = infer_symbols(&[0, 1, 3, 0], 2, &InferenceConfig::default()).unwrap_err();
    assert!(matches!(err, InferenceError::Sequence(_)));
}

#[test]
fn invalid_config_is_rejected_before_processing() {
    let seq = golden_sequence(1_000, 1);
    for config in [
        InferenceConfig::default().with_significance_level(1.5),
        InferenceConfig::default().with_min_count(0),
        InferenceConfig::default().with_max_history_length(0),
    ] {
        let err = infer(&seq, &config).unwrap_err();
        assert!(
            matches!(err, InferenceError::Config(ValidationError::InvalidValue { .. })),
            "{err:?}"
        );
    }
}

#[test]
fn constant_sequence_has_one_state() {
    let outcome = infer_symbols(&[1; 500], 2, &InferenceConfig::default()).unwrap();
    let model = &outcome.model;
    assert_eq!(model.num_states(), 1);
    assert_eq!(metrics::entropy_rate(model).unwrap(), 0.0);
    assert_eq!(metrics::statistical_complexity(model).unwrap(), 0.0);
    assert_eq!(model.states()[0].probability(1), 1.0);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn re_inference_is_idempotent() {
    let seq = golden_sequence(20_000, 5);
    let a = infer(&seq, &small_config()).unwrap();
    let b = infer(&seq, &small_config()).unwrap();
    assert!(a.model.structurally_equivalent(&b.model, 1e-12));
    assert_eq!(a.status, b.status);
    assert_eq!(a.diagnostics, b.diagnostics);
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let seq = golden_sequence(30_000, 9);
    let parallel = infer(&seq, &small_config().with_parallel(true)).unwrap();
    let sequential = infer(&seq, &small_config().with_parallel(false)).unwrap();
    assert_eq!(parallel.model, sequential.model);
    assert_eq!(parallel.passes, sequential.passes);
}

#[test]
fn outcome_records_configuration() {
    let config = small_config();
    let outcome = infer(&golden_sequence(5_000, 2), &config).unwrap();
    assert!(outcome.config.same_settings(&ConfigSnapshot::of(&config)));
}

// ============================================================================
// Structure of the result
// ============================================================================

#[test]
fn inferred_transitions_are_deterministic() {
    let outcome = infer(&golden_sequence(20_000, 12), &small_config()).unwrap();
    let model = &outcome.model;
    for state in model.states() {
        let total: f64 = state.distribution().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        for symbol in state.support() {
            let target = model.transition(state.id(), symbol).unwrap();
            assert!(target.index() < model.num_states());
        }
    }
}

#[test]
fn passes_never_shrink_the_state_arena() {
    let outcome = infer(&golden_sequence(10_000, 4), &small_config()).unwrap();
    assert!(!outcome.passes.is_empty());
    for pair in outcome.passes.windows(2) {
        assert!(pair[1].states_allocated >= pair[0].states_allocated);
        assert_eq!(pair[1].history_length, pair[0].history_length + 1);
    }
}

#[test]
fn inferred_model_survives_json_round_trip() {
    let model = infer(&golden_sequence(20_000, 8), &small_config())
        .unwrap()
        .model;
    let back = CausalStateModel::from_json(&model.to_json().unwrap()).unwrap();
    assert_eq!(model, back);
    assert!(model.structurally_equivalent(&back, 0.0));
}

#[test]
fn diagnostics_serialize_with_kind_tag() {
    let outcome = infer(&golden_sequence(200, 3), &InferenceConfig::default()).unwrap();
    for diagnostic in &outcome.diagnostics {
        let json = serde_json::to_value(diagnostic).unwrap();
        assert_eq!(json["kind"], diagnostic.kind());
        let back: Diagnostic = serde_json::from_value(json).unwrap();
        assert_eq!(&back, diagnostic);
    }
}

// ============================================================================
// Distinguishability tests
// ============================================================================

#[test]
fn kolmogorov_smirnov_recovers_golden_mean() {
    let config = small_config()
        .with_test(TestKind::KolmogorovSmirnov)
        .with_significance_level(0.001);
    let outcome = infer(&golden_sequence(100_000, 42), &config).unwrap();
    assert_eq!(outcome.model.num_states(), 2);
    let h = metrics::entropy_rate(&outcome.model).unwrap();
    assert!((h - 2.0 / 3.0).abs() < 0.02);
}

#[test]
fn custom_test_can_be_plugged_in() {
    #[derive(Debug)]
    struct NeverDistinguish;

    impl DistinguishabilityTest for NeverDistinguish {
        fn name(&self) -> &'static str {
            "never"
        }

        fn outcome(&self, _a: &[u64], _b: &[u64]) -> emic_math::TestOutcome {
            emic_math::TestOutcome::NO_EVIDENCE
        }
    }

    let seq = golden_sequence(10_000, 6);
    let merged = Cssr::new(&small_config())
        .unwrap()
        .with_test(Arc::new(NeverDistinguish))
        .run(&seq)
        .unwrap();
    assert_eq!(merged.model.num_states(), 1);

    let standard = Cssr::new(&small_config().with_significance_level(0.001))
        .unwrap()
        .with_test(Arc::new(ChiSquaredTest))
        .run(&seq)
        .unwrap();
    assert_eq!(standard.model.num_states(), 2);
}
