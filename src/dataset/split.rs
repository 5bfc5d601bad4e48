//! Seeded train/validation partitioning

use super::FeatureMatrix;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Disjoint train/validation partition of a feature matrix and its target
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Training features
    pub train_features: FeatureMatrix,
    /// Validation features
    pub validation_features: FeatureMatrix,
    /// Training targets (aligned with `train_features`)
    pub train_target: Vec<f64>,
    /// Validation targets (aligned with `validation_features`)
    pub validation_target: Vec<f64>,
}

impl Split {
    /// Rows in the training partition
    #[must_use]
    pub fn train_rows(&self) -> usize {
        self.train_target.len()
    }

    /// Rows in the validation partition
    #[must_use]
    pub fn validation_rows(&self) -> usize {
        self.validation_target.len()
    }
}

/// Row indices for a seeded partition of `n` rows
///
/// Returns `(train, validation)`. The validation partition holds
/// `ceil(n * validation_fraction)` rows; both partitions must be non-empty.
///
/// # Errors
/// Returns [`Error::InsufficientRows`] if either partition would be empty,
/// or [`Error::InputSchema`] if the fraction is outside `(0, 1)`
pub fn split_indices(
    n: usize,
    validation_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(validation_fraction > 0.0 && validation_fraction < 1.0) {
        return Err(Error::InputSchema(format!(
            "validation fraction must be in (0, 1), got {validation_fraction}"
        )));
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let n_validation = (n as f64 * validation_fraction).ceil() as usize;
    let n_train = n.saturating_sub(n_validation);
    if n_validation == 0 || n_train == 0 {
        return Err(Error::InsufficientRows { rows: n, required: 2 });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_validation);
    Ok((train, indices))
}

/// Partition `features`/`target` into train and validation sets
///
/// Deterministic for a given `seed` and input order.
///
/// # Errors
/// Returns [`Error::InputSchema`] if `features` and `target` disagree on
/// row count, or any error from [`split_indices`]
pub fn train_validation_split(
    features: &FeatureMatrix,
    target: &[f64],
    validation_fraction: f64,
    seed: u64,
) -> Result<Split> {
    if features.num_rows() != target.len() {
        return Err(Error::InputSchema(format!(
            "feature matrix has {} rows but target has {}",
            features.num_rows(),
            target.len()
        )));
    }

    let (train, validation) = split_indices(target.len(), validation_fraction, seed)?;

    Ok(Split {
        train_features: features.take(&train),
        validation_features: features.take(&validation),
        train_target: train.iter().map(|&i| target[i]).collect(),
        validation_target: validation.iter().map(|&i| target[i]).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_split_100_rows_is_80_20() {
        let (train, validation) = split_indices(100, 0.2, 42).unwrap();
        assert_eq!(train.len(), 80);
        assert_eq!(validation.len(), 20);
    }

    #[test]
    fn test_split_rounds_validation_up() {
        let (train, validation) = split_indices(11, 0.2, 42).unwrap();
        assert_eq!(validation.len(), 3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn test_split_is_disjoint_and_complete() {
        let (train, validation) = split_indices(57, 0.2, 7).unwrap();
        let train_set: HashSet<_> = train.iter().copied().collect();
        let validation_set: HashSet<_> = validation.iter().copied().collect();

        assert!(train_set.is_disjoint(&validation_set));
        assert_eq!(train_set.len() + validation_set.len(), 57);
    }

    #[test]
    fn test_split_is_reproducible() {
        assert_eq!(split_indices(40, 0.2, 42).unwrap(), split_indices(40, 0.2, 42).unwrap());
        assert_ne!(split_indices(40, 0.2, 42).unwrap(), split_indices(40, 0.2, 43).unwrap());
    }

    #[test]
    fn test_split_too_few_rows() {
        assert!(matches!(
            split_indices(1, 0.2, 42),
            Err(Error::InsufficientRows { rows: 1, .. })
        ));
        assert!(matches!(
            split_indices(0, 0.2, 42),
            Err(Error::InsufficientRows { rows: 0, .. })
        ));
        assert!(split_indices(2, 0.2, 42).is_ok());
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        assert!(matches!(split_indices(10, 1.0, 42), Err(Error::InputSchema(_))));
        assert!(matches!(split_indices(10, 0.0, 42), Err(Error::InputSchema(_))));
    }

    #[test]
    fn test_train_validation_split_keeps_rows_aligned() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![f64::from(i)]).collect();
        let target: Vec<f64> = (0..10).map(|i| f64::from(i) * 10.0).collect();
        let features = FeatureMatrix::new(vec!["x".into()], rows).unwrap();

        let split = train_validation_split(&features, &target, 0.2, 42).unwrap();
        assert_eq!(split.train_rows(), 8);
        assert_eq!(split.validation_rows(), 2);
        for (row, y) in split.train_features.rows().iter().zip(&split.train_target) {
            assert!((row[0] * 10.0 - y).abs() < f64::EPSILON);
        }
    }
}
