//! Property-based tests for maintenance-ml
//!
//! Pattern:
//! - Test mathematical invariants
//! - Test data integrity properties
//! - Run with ProptestConfig::with_cases(100) (fewer for forest fits)

use maintenance_ml::dataset::split::split_indices;
use maintenance_ml::dataset::FeatureMatrix;
use maintenance_ml::experiment::ModelUri;
use maintenance_ml::metrics::{mae, rmse};
use maintenance_ml::model::{ForestParams, RandomForestRegressor, Regressor};
use maintenance_ml::monitoring::{DriftTest, KolmogorovSmirnov, PopulationStability, Wasserstein};
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Paired actual/predicted vectors of equal length
fn arb_pairs() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (1usize..200).prop_flat_map(|n| {
        (
            proptest::collection::vec(-1000.0f64..1000.0, n),
            proptest::collection::vec(-1000.0f64..1000.0, n),
        )
    })
}

/// Small regression problem: rows of 3 features plus a target
fn arb_regression() -> impl Strategy<Value = (Vec<Vec<f64>>, Vec<f64>)> {
    (4usize..40).prop_flat_map(|n| {
        (
            proptest::collection::vec(proptest::collection::vec(0.0f64..100.0, 3), n),
            proptest::collection::vec(0.0f64..500.0, n),
        )
    })
}

fn arb_sample() -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(-50.0f64..50.0, 1..300)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Split Properties
    // ========================================================================

    /// Property: partitions are disjoint, cover every row, validation = ceil(20%)
    #[test]
    fn prop_split_partitions_rows(n in 5usize..500, seed in any::<u64>()) {
        let (train, validation) = split_indices(n, 0.2, seed).unwrap();

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let expected_validation = (n as f64 * 0.2).ceil() as usize;
        prop_assert_eq!(validation.len(), expected_validation);
        prop_assert_eq!(train.len() + validation.len(), n);

        let all: HashSet<usize> = train.iter().chain(&validation).copied().collect();
        prop_assert_eq!(all.len(), n);
        prop_assert!(all.iter().all(|&i| i < n));
    }

    /// Property: same seed, same split
    #[test]
    fn prop_split_is_deterministic(n in 2usize..300, seed in any::<u64>()) {
        prop_assert_eq!(split_indices(n, 0.2, seed).unwrap(), split_indices(n, 0.2, seed).unwrap());
    }

    // ========================================================================
    // Metric Properties
    // ========================================================================

    /// Property: RMSE is non-negative and bounded below by MAE
    #[test]
    fn prop_rmse_nonnegative_and_dominates_mae((actual, predicted) in arb_pairs()) {
        let r = rmse(&actual, &predicted).unwrap();
        let m = mae(&actual, &predicted).unwrap();
        prop_assert!(r >= 0.0);
        prop_assert!(r + 1e-9 >= m, "rmse {} < mae {}", r, m);
    }

    /// Property: perfect predictions have zero RMSE
    #[test]
    fn prop_rmse_of_identity_is_zero((actual, _) in arb_pairs()) {
        prop_assert_eq!(rmse(&actual, &actual).unwrap(), 0.0);
    }

    // ========================================================================
    // Drift Test Properties
    // ========================================================================

    /// Property: KS p-value is a probability, and 1 for identical samples
    #[test]
    fn prop_ks_p_value_bounds(a in arb_sample(), b in arb_sample()) {
        let ks = KolmogorovSmirnov::default();
        let p = ks.score(&a, &b).unwrap();
        prop_assert!((0.0..=1.0).contains(&p));
        prop_assert!((ks.score(&a, &a).unwrap() - 1.0).abs() < 1e-12);
    }

    /// Property: Wasserstein distance is symmetric and zero on identical samples
    #[test]
    fn prop_wasserstein_symmetric(a in arb_sample(), b in arb_sample()) {
        let ab = Wasserstein::distance(&a, &b);
        let ba = Wasserstein::distance(&b, &a);
        prop_assert!(ab >= 0.0);
        prop_assert!((ab - ba).abs() < 1e-9);
        prop_assert!(Wasserstein::distance(&a, &a).abs() < 1e-12);
    }

    /// Property: PSI is non-negative
    #[test]
    fn prop_psi_nonnegative(a in arb_sample(), b in arb_sample()) {
        let psi = PopulationStability::default().score(&a, &b).unwrap();
        prop_assert!(psi >= -1e-12);
    }

    // ========================================================================
    // URI Properties
    // ========================================================================

    /// Property: run URIs survive Display → parse
    #[test]
    fn prop_run_uri_roundtrip(run_id in "[a-f0-9]{32}", key in "[a-z]{1,12}") {
        let uri = ModelUri::for_run(run_id, key);
        prop_assert_eq!(ModelUri::parse(&uri.to_string()), uri);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // ========================================================================
    // Forest Properties
    // ========================================================================

    /// Property: predictions stay within the observed target range
    #[test]
    fn prop_forest_predictions_within_target_range((rows, target) in arb_regression()) {
        let features = FeatureMatrix::new(vec!["a".into(), "b".into(), "c".into()], rows.clone()).unwrap();
        let params = ForestParams { n_estimators: 8, ..ForestParams::default() };
        let forest = RandomForestRegressor::fit(params, &features, &target).unwrap();

        let lo = target.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = target.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for prediction in forest.predict(&rows).unwrap() {
            prop_assert!(prediction >= lo - 1e-9 && prediction <= hi + 1e-9);
        }
    }

    /// Property: refitting with the same seed gives identical predictions
    #[test]
    fn prop_forest_fit_is_deterministic((rows, target) in arb_regression()) {
        let features = FeatureMatrix::new(vec!["a".into(), "b".into(), "c".into()], rows.clone()).unwrap();
        let params = ForestParams { n_estimators: 5, ..ForestParams::default() };
        let first = RandomForestRegressor::fit(params, &features, &target).unwrap();
        let second = RandomForestRegressor::fit(params, &features, &target).unwrap();
        prop_assert_eq!(first.predict(&rows).unwrap(), second.predict(&rows).unwrap());
    }
}
