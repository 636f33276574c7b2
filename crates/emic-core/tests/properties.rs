//! Property-based tests for sources, trees, models and inference.
//!
//! The number of cases follows `EMIC_PROPTEST_PROFILE`:
//! - `ci`: thorough
//! - `dev` (default): quick local iteration
//! - `debug`: a handful of cases with verbose failure output

use emic_core::model::CausalStateModelBuilder;
use emic_core::{
    generate, infer_symbols, CausalStateModel, HistoryTree, InferenceConfig, MachineSource,
    Sequence, SourceParams, StateId,
};
use proptest::prelude::*;

fn cases(ci: u32, dev: u32) -> u32 {
    match std::env::var("EMIC_PROPTEST_PROFILE").as_deref() {
        Ok("ci") => ci,
        Ok("debug") => 4,
        _ => dev,
    }
}

fn config(ci: u32, dev: u32) -> ProptestConfig {
    let mut config = ProptestConfig::with_cases(cases(ci, dev));
    if std::env::var("EMIC_PROPTEST_PROFILE").as_deref() == Ok("debug") {
        config.verbose = 2;
    }
    config
}

fn params_strategy() -> impl Strategy<Value = SourceParams> {
    prop_oneof![
        (0.05..0.95f64).prop_map(|p| SourceParams::GoldenMean { p }),
        (0.05..0.95f64).prop_map(|p| SourceParams::EvenProcess { p }),
        (0.05..0.95f64).prop_map(|p| SourceParams::BiasedCoin { p }),
        Just(SourceParams::Periodic {
            pattern: vec![0, 1, 1]
        }),
        Just(SourceParams::Periodic {
            pattern: vec![2, 0, 1, 0]
        }),
    ]
}

/// A random unifilar machine where every state emits every symbol.
fn machine_strategy() -> impl Strategy<Value = CausalStateModel> {
    (1usize..5, 2usize..4).prop_flat_map(|(states, symbols)| {
        (
            prop::collection::vec(prop::collection::vec(1u32..100, symbols), states),
            prop::collection::vec(prop::collection::vec(0..states, symbols), states),
        )
            .prop_map(move |(weights, targets)| {
                let mut b = CausalStateModelBuilder::new(symbols).unwrap();
                let ids: Vec<StateId> = (0..states).map(|_| b.add_state()).collect();
                for (i, row) in weights.iter().enumerate() {
                    let total: u32 = row.iter().sum();
                    let mut remaining = 1.0;
                    for (s, w) in row.iter().enumerate() {
                        // last entry absorbs rounding so rows sum to exactly 1
                        let p = if s + 1 == row.len() {
                            remaining
                        } else {
                            f64::from(*w) / f64::from(total)
                        };
                        remaining -= p;
                        b.emit(ids[i], s as u8, p, ids[targets[i][s]]);
                    }
                }
                b.start(ids[0]);
                b.build().unwrap()
            })
    })
}

proptest! {
    #![proptest_config(config(256, 32))]

    /// Identical (length, seed, params) always give the same sequence.
    #[test]
    fn source_is_deterministic(
        params in params_strategy(),
        seed in any::<u64>(),
        len in 1usize..2_000,
    ) {
        let a = generate(len, seed, &params).unwrap();
        let b = generate(len, seed, &params).unwrap();
        prop_assert_eq!(a.len(), len);
        prop_assert_eq!(a, b);
    }

    /// Every prefix of a generated sequence is the shorter sequence.
    #[test]
    fn source_prefixes_agree(
        params in params_strategy(),
        seed in any::<u64>(),
        len in 2usize..1_000,
    ) {
        let long = generate(len, seed, &params).unwrap();
        let short = generate(len / 2, seed, &params).unwrap();
        prop_assert_eq!(&long.symbols()[..len / 2], short.symbols());
    }

    /// occurrences(h) = Σ_c occurrences(c·h) + [h is a prefix of the sequence].
    #[test]
    fn tree_conserves_mass(symbols in prop::collection::vec(0u8..3, 1..300), depth in 1usize..5) {
        let seq = Sequence::from_symbols(symbols.clone(), 3).unwrap();
        let tree = HistoryTree::build(&seq, depth, 1);
        for len in 0..depth {
            for h in tree.histories_of_length(len) {
                let children: u64 = tree
                    .children(&h)
                    .iter()
                    .map(|c| tree.occurrences(c.as_slice()))
                    .sum();
                let is_prefix = u64::from(symbols.starts_with(h.as_slice()));
                prop_assert_eq!(
                    tree.occurrences(h.as_slice()),
                    children + is_prefix,
                    "history {}",
                    h
                );
            }
        }
        prop_assert_eq!(tree.occurrences(&[]), symbols.len() as u64 + 1);
    }

    /// Continuation counts never exceed occurrences.
    #[test]
    fn tree_counts_are_bounded(
        symbols in prop::collection::vec(0u8..2, 1..300),
        depth in 1usize..6,
    ) {
        let seq = Sequence::from_symbols(symbols, 2).unwrap();
        let tree = HistoryTree::build(&seq, depth, 1);
        for len in 0..=depth {
            for h in tree.histories_of_length(len) {
                let counts = tree.counts(h.as_slice()).unwrap();
                prop_assert_eq!(counts.counts().iter().sum::<u64>(), counts.total());
                prop_assert!(counts.total() <= tree.occurrences(h.as_slice()));
            }
        }
    }
}

proptest! {
    #![proptest_config(config(128, 16))]

    /// The stationary distribution is normalized and invariant.
    #[test]
    fn stationary_is_normalized(model in machine_strategy()) {
        prop_assume!(model.is_irreducible());
        let pi = model.stationary_distribution().unwrap();
        let total: f64 = pi.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9, "sum = {}", total);
        prop_assert!(pi.iter().all(|&p| p >= 0.0));

        let t = model.transition_matrix();
        for j in 0..pi.len() {
            let flowed: f64 = (0..pi.len()).map(|i| pi[i] * t[i][j]).sum();
            prop_assert!((flowed - pi[j]).abs() < 1e-9);
        }
    }

    /// Sampling any machine only ever emits symbols with a transition.
    #[test]
    fn machine_samples_follow_transitions(model in machine_strategy(), seed in any::<u64>()) {
        let seq = MachineSource::new(&model).generate(500, seed).unwrap();
        prop_assert_eq!(seq.alphabet(), model.alphabet());
        prop_assert_eq!(seq.len(), 500);
    }

    /// JSON encoding preserves the model exactly.
    #[test]
    fn model_json_preserves_structure(model in machine_strategy()) {
        let back = CausalStateModel::from_json(&model.to_json().unwrap()).unwrap();
        prop_assert!(model.structurally_equivalent(&back, 0.0));
        prop_assert_eq!(model, back);
    }
}

proptest! {
    #![proptest_config(config(48, 8))]

    /// Every inferred (state, symbol) with positive probability resolves to
    /// exactly one state, and the state arena never shrinks across passes.
    #[test]
    fn inference_is_deterministic_and_monotone(
        params in params_strategy(),
        seed in any::<u64>(),
        len in 500usize..5_000,
    ) {
        let seq = generate(len, seed, &params).unwrap();
        let config = InferenceConfig::default().with_max_history_length(3);
        let outcome = infer_symbols(seq.symbols(), seq.alphabet().size(), &config).unwrap();
        let model = &outcome.model;

        for state in model.states() {
            let total: f64 = state.distribution().iter().sum();
            prop_assert!((total - 1.0).abs() < 1e-9);
            for symbol in model.alphabet().symbols() {
                let defined = model.transition(state.id(), symbol).is_ok();
                prop_assert_eq!(defined, state.probability(symbol) > 0.0);
            }
        }
        for pair in outcome.passes.windows(2) {
            prop_assert!(pair[1].states_allocated >= pair[0].states_allocated);
        }
    }
}
