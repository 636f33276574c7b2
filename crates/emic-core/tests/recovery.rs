//! Recovery of known machines from generated data.

use emic_core::inference::test_for;
use emic_core::{
    generate, infer, metrics, Diagnostic, InferenceConfig, MetricsReport, SourceParams,
};

fn golden_config() -> InferenceConfig {
    InferenceConfig::default()
        .with_max_history_length(3)
        .with_min_count(20)
        .with_significance_level(0.05)
}

#[test]
fn golden_mean_is_recovered() {
    let params = SourceParams::GoldenMean { p: 0.5 };
    let seq = generate(100_000, 42, &params).unwrap();
    let outcome = infer(&seq, &golden_config()).unwrap();

    assert_eq!(outcome.model.num_states(), 2);
    assert!(outcome.is_converged(), "status: {:?}", outcome.status);

    let h = metrics::entropy_rate(&outcome.model).unwrap();
    assert!((h - 2.0 / 3.0).abs() < 0.02, "hμ = {h}");
    let c = metrics::statistical_complexity(&outcome.model).unwrap();
    assert!((c - params.exact_statistical_complexity()).abs() < 0.05, "Cμ = {c}");
}

#[test]
fn golden_mean_model_is_unifilar_and_irreducible() {
    let seq = generate(100_000, 42, &SourceParams::GoldenMean { p: 0.5 }).unwrap();
    let model = infer(&seq, &golden_config()).unwrap().model;

    assert!(model.is_irreducible());
    // Exactly one state forbids a 1.
    let forbidding = model
        .states()
        .iter()
        .filter(|s| s.probability(1) == 0.0)
        .count();
    assert_eq!(forbidding, 1);
    for state in model.states() {
        for symbol in state.support() {
            assert!(model.transition(state.id(), symbol).is_ok());
        }
    }
}

fn even_config() -> InferenceConfig {
    InferenceConfig::default()
        .with_max_history_length(4)
        .with_min_count(20)
        .with_significance_level(0.01)
}

#[test]
fn even_process_is_recovered() {
    let params = SourceParams::EvenProcess { p: 0.5 };
    let seq = generate(200_000, 42, &params).unwrap();
    let outcome = infer(&seq, &even_config()).unwrap();
    let model = &outcome.model;

    assert_eq!(model.num_states(), 2, "diagnostics: {:?}", outcome.diagnostics);
    assert!(model.is_irreducible());
    // The state inside an odd run of 1s never emits 0.
    let forced = model
        .states()
        .iter()
        .filter(|s| s.probability(0) == 0.0)
        .count();
    assert_eq!(forced, 1);

    let h = metrics::entropy_rate(model).unwrap();
    assert!((h - 2.0 / 3.0).abs() < 0.02, "hμ = {h}");
    let c = metrics::statistical_complexity(model).unwrap();
    assert!((c - params.exact_statistical_complexity()).abs() < 0.05, "Cμ = {c}");
}

#[test]
fn recovered_states_are_pairwise_distinguishable() {
    let cases = [
        (SourceParams::GoldenMean { p: 0.5 }, golden_config()),
        (SourceParams::EvenProcess { p: 0.5 }, even_config()),
    ];
    for (params, config) in cases {
        let seq = generate(200_000, 7, &params).unwrap();
        let model = infer(&seq, &config).unwrap().model;
        let test = test_for(config.test);
        let states = model.states();
        assert!(states.len() >= 2, "{}", params.name());

        for (i, a) in states.iter().enumerate() {
            for b in &states[i + 1..] {
                let (Some(ca), Some(cb)) = (a.counts(), b.counts()) else {
                    panic!("{}: inferred states carry counts", params.name());
                };
                assert!(
                    test.distinguishable(ca, cb, config.significance_level),
                    "{}: states {} and {} are indistinguishable",
                    params.name(),
                    a.id(),
                    b.id()
                );
            }
        }
    }
}

#[test]
fn periodic_process_is_recovered() {
    let params = SourceParams::Periodic {
        pattern: vec![0, 0, 1],
    };
    let seq = generate(3_000, 1, &params).unwrap();
    let outcome = infer(&seq, &InferenceConfig::default().with_max_history_length(4)).unwrap();

    assert_eq!(outcome.model.num_states(), 3);
    let report = MetricsReport::compute(&outcome.model).unwrap();
    assert!(report.entropy_rate.abs() < 1e-12);
    assert!((report.statistical_complexity - 3f64.log2()).abs() < 1e-9);
}

#[test]
fn biased_coin_collapses_to_one_state() {
    let params = SourceParams::BiasedCoin { p: 0.3 };
    let seq = generate(50_000, 11, &params).unwrap();
    let config = InferenceConfig::default()
        .with_max_history_length(3)
        .with_significance_level(0.001);
    let outcome = infer(&seq, &config).unwrap();

    assert_eq!(outcome.model.num_states(), 1);
    let h = metrics::entropy_rate(&outcome.model).unwrap();
    assert!((h - params.exact_entropy_rate()).abs() < 0.01);
    assert_eq!(metrics::statistical_complexity(&outcome.model).unwrap(), 0.0);
}

#[test]
fn short_data_limits_history_depth() {
    let seq = generate(60, 3, &SourceParams::GoldenMean { p: 0.5 }).unwrap();
    let config = InferenceConfig::default().with_max_history_length(6);
    let outcome = infer(&seq, &config).unwrap();

    let limited: Vec<_> = outcome.diagnostics_of_kind("depth_limited").collect();
    assert_eq!(limited.len(), 1);
    match limited[0] {
        Diagnostic::DepthLimited { requested, usable } => {
            assert_eq!(*requested, 6);
            assert!(*usable < 6);
        }
        other => panic!("unexpected diagnostic {other:?}"),
    }
    assert!(outcome.status.history_length() <= 6);
    assert_eq!(outcome.model.alphabet().size(), 2);
}
