//! Per-column drift tests
//!
//! References:
//! - Press et al., Numerical Recipes (3rd ed.), §14.3.3: asymptotic
//!   Kolmogorov-Smirnov distribution
//! - Siddiqi (2006): Population Stability Index thresholds

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A statistical test comparing one column's reference and current values
///
/// Implementations receive finite, non-empty samples.
pub trait DriftTest: Send + Sync + fmt::Debug {
    /// Short name reported per column (e.g. `ks`)
    fn name(&self) -> &'static str;

    /// Decision threshold
    fn threshold(&self) -> f64;

    /// Test score for the two samples
    ///
    /// # Errors
    /// Returns [`Error::Computation`] if the score cannot be computed
    fn score(&self, reference: &[f64], current: &[f64]) -> Result<f64>;

    /// Whether `score` indicates drift
    fn is_drift(&self, score: f64) -> bool;
}

/// Two-sample Kolmogorov-Smirnov test; the score is the p-value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KolmogorovSmirnov {
    /// Significance level; drift when `p < alpha`
    pub alpha: f64,
}

impl Default for KolmogorovSmirnov {
    fn default() -> Self {
        Self { alpha: 0.05 }
    }
}

impl KolmogorovSmirnov {
    /// Maximum distance between the two empirical CDFs
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn statistic(reference: &[f64], current: &[f64]) -> f64 {
        let a = sorted(reference);
        let b = sorted(current);
        let (n, m) = (a.len() as f64, b.len() as f64);

        let (mut i, mut j, mut d) = (0usize, 0usize, 0.0_f64);
        while i < a.len() && j < b.len() {
            let x = a[i].min(b[j]);
            while i < a.len() && a[i] <= x {
                i += 1;
            }
            while j < b.len() && b[j] <= x {
                j += 1;
            }
            d = d.max((i as f64 / n - j as f64 / m).abs());
        }
        d
    }

    /// Asymptotic p-value for statistic `d` with sample sizes `n`, `m`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn p_value(d: f64, n: usize, m: usize) -> f64 {
        let (n, m) = (n as f64, m as f64);
        let en = (n * m / (n + m)).sqrt();
        kolmogorov_q((en + 0.12 + 0.11 / en) * d)
    }
}

/// Survival function of the Kolmogorov distribution, `Q_KS(lambda)`
fn kolmogorov_q(lambda: f64) -> f64 {
    const EPS1: f64 = 1e-3;
    const EPS2: f64 = 1e-8;

    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut previous = 0.0;
    for j in 1..=100 {
        let j = f64::from(j);
        let term = fac * (a2 * j * j).exp();
        sum += term;
        if term.abs() <= EPS1 * previous || term.abs() <= EPS2 * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        previous = term.abs();
    }
    // Series fails to converge only for lambda -> 0, where Q -> 1
    1.0
}

impl DriftTest for KolmogorovSmirnov {
    fn name(&self) -> &'static str {
        "ks"
    }

    fn threshold(&self) -> f64 {
        self.alpha
    }

    fn score(&self, reference: &[f64], current: &[f64]) -> Result<f64> {
        let d = Self::statistic(reference, current);
        Ok(Self::p_value(d, reference.len(), current.len()))
    }

    fn is_drift(&self, score: f64) -> bool {
        score < self.alpha
    }
}

/// Wasserstein-1 distance normalised by the reference standard deviation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wasserstein {
    /// Drift when the normed distance is at least this value
    pub threshold: f64,
}

impl Default for Wasserstein {
    fn default() -> Self {
        Self { threshold: 0.1 }
    }
}

impl Wasserstein {
    /// Earth mover's distance between the two empirical distributions
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn distance(reference: &[f64], current: &[f64]) -> f64 {
        let a = sorted(reference);
        let b = sorted(current);
        let mut all: Vec<f64> = a.iter().chain(&b).copied().collect();
        all.sort_by(f64::total_cmp);

        let (n, m) = (a.len() as f64, b.len() as f64);
        let (mut i, mut j) = (0usize, 0usize);
        let mut total = 0.0;
        for window in all.windows(2) {
            let x = window[0];
            while i < a.len() && a[i] <= x {
                i += 1;
            }
            while j < b.len() && b[j] <= x {
                j += 1;
            }
            total += (i as f64 / n - j as f64 / m).abs() * (window[1] - x);
        }
        total
    }
}

impl DriftTest for Wasserstein {
    fn name(&self) -> &'static str {
        "wasserstein"
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn score(&self, reference: &[f64], current: &[f64]) -> Result<f64> {
        let std = std_dev(reference).max(f64::EPSILON);
        Ok(Self::distance(reference, current) / std)
    }

    fn is_drift(&self, score: f64) -> bool {
        score >= self.threshold
    }
}

/// Population Stability Index over reference-quantile bins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationStability {
    /// Number of bins
    pub bins: usize,
    /// Drift when PSI is at least this value
    pub threshold: f64,
}

impl Default for PopulationStability {
    fn default() -> Self {
        Self {
            bins: 10,
            threshold: 0.1,
        }
    }
}

/// Floor for empty bin shares, keeps the log term finite
const PSI_EPSILON: f64 = 1e-4;

impl PopulationStability {
    /// Interior bin edges at the reference quantiles, duplicates removed
    #[must_use]
    pub fn edges(&self, reference: &[f64]) -> Vec<f64> {
        let values = sorted(reference);
        let n = values.len();
        let mut edges: Vec<f64> = (1..self.bins)
            .map(|i| values[(i * n / self.bins).min(n - 1)])
            .collect();
        edges.dedup();
        edges
    }

    #[allow(clippy::cast_precision_loss)]
    fn shares(values: &[f64], edges: &[f64]) -> Vec<f64> {
        let mut counts = vec![0usize; edges.len() + 1];
        for &v in values {
            counts[edges.partition_point(|&e| e <= v)] += 1;
        }
        counts
            .into_iter()
            .map(|c| (c as f64 / values.len() as f64).max(PSI_EPSILON))
            .collect()
    }
}

impl DriftTest for PopulationStability {
    fn name(&self) -> &'static str {
        "psi"
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn score(&self, reference: &[f64], current: &[f64]) -> Result<f64> {
        if self.bins == 0 {
            return Err(Error::Computation("PSI needs at least one bin".into()));
        }
        let edges = self.edges(reference);
        let expected = Self::shares(reference, &edges);
        let actual = Self::shares(current, &edges);
        Ok(expected
            .iter()
            .zip(&actual)
            .map(|(e, a)| (e - a) * (e / a).ln())
            .sum())
    }

    fn is_drift(&self, score: f64) -> bool {
        score >= self.threshold
    }
}

/// Built-in choice of drift test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriftMethod {
    /// KS for reference samples of at most 1000 rows, Wasserstein above
    #[default]
    Auto,
    /// Always Kolmogorov-Smirnov
    KolmogorovSmirnov,
    /// Always normed Wasserstein distance
    Wasserstein,
    /// Always Population Stability Index
    PopulationStability,
}

/// Largest reference sample the `Auto` method tests with KS
pub const AUTO_KS_MAX_ROWS: usize = 1000;

impl DriftMethod {
    /// Concrete test for a column whose reference has `reference_rows` values
    #[must_use]
    pub fn test_for(self, reference_rows: usize) -> Arc<dyn DriftTest> {
        match self {
            Self::Auto if reference_rows <= AUTO_KS_MAX_ROWS => {
                Arc::new(KolmogorovSmirnov::default())
            }
            Self::Auto | Self::Wasserstein => Arc::new(Wasserstein::default()),
            Self::KolmogorovSmirnov => Arc::new(KolmogorovSmirnov::default()),
            Self::PopulationStability => Arc::new(PopulationStability::default()),
        }
    }
}

impl FromStr for DriftMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "ks" | "kolmogorov_smirnov" => Ok(Self::KolmogorovSmirnov),
            "wasserstein" => Ok(Self::Wasserstein),
            "psi" => Ok(Self::PopulationStability),
            other => Err(Error::InputSchema(format!(
                "unknown drift method '{other}' (expected auto, ks, wasserstein or psi)"
            ))),
        }
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

#[allow(clippy::cast_precision_loss)]
fn std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: u32, offset: f64) -> Vec<f64> {
        (0..n).map(|i| f64::from(i) + offset).collect()
    }

    #[test]
    fn test_ks_identical_samples() {
        let a = ramp(50, 0.0);
        assert!(KolmogorovSmirnov::statistic(&a, &a).abs() < f64::EPSILON);
        let p = KolmogorovSmirnov::default().score(&a, &a).unwrap();
        assert!((p - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ks_disjoint_samples() {
        let a = ramp(50, 0.0);
        let b = ramp(50, 1000.0);
        assert!((KolmogorovSmirnov::statistic(&a, &b) - 1.0).abs() < f64::EPSILON);
        let test = KolmogorovSmirnov::default();
        let p = test.score(&a, &b).unwrap();
        assert!(p < 1e-6);
        assert!(test.is_drift(p));
    }

    #[test]
    fn test_ks_p_value_reference_point() {
        // Q_KS(1.36) ~= 0.049 (the classic 5% critical value)
        let q = kolmogorov_q(1.36);
        assert!((q - 0.049).abs() < 0.002, "q = {q}");
    }

    #[test]
    fn test_wasserstein_shift() {
        let a = ramp(100, 0.0);
        let b = ramp(100, 5.0);
        assert!((Wasserstein::distance(&a, &b) - 5.0).abs() < 1e-9);
        assert!(Wasserstein::distance(&a, &a).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wasserstein_constant_reference() {
        let test = Wasserstein::default();
        assert!(test.score(&[3.0, 3.0], &[3.0, 3.0]).unwrap().abs() < f64::EPSILON);
        assert!(test.is_drift(test.score(&[3.0, 3.0], &[4.0, 4.0]).unwrap()));
    }

    #[test]
    fn test_psi_identical_is_zero() {
        let a = ramp(100, 0.0);
        let psi = PopulationStability::default().score(&a, &a).unwrap();
        assert!(psi.abs() < 1e-12);
    }

    #[test]
    fn test_psi_edges_follow_reference_quantiles() {
        let edges = PopulationStability::default().edges(&ramp(100, 0.0));
        assert_eq!(edges.len(), 9);
        assert!((edges[0] - 10.0).abs() < f64::EPSILON);
        assert!(PopulationStability::default().edges(&[1.0; 20]).len() == 1);
    }

    #[test]
    fn test_psi_shifted_is_drift() {
        let test = PopulationStability::default();
        let psi = test.score(&ramp(100, 0.0), &ramp(100, 60.0)).unwrap();
        assert!(test.is_drift(psi), "psi = {psi}");
    }

    #[test]
    fn test_method_parse_and_auto_selection() {
        assert_eq!("KS".parse::<DriftMethod>().unwrap(), DriftMethod::KolmogorovSmirnov);
        assert!("chi2".parse::<DriftMethod>().is_err());
        assert_eq!(DriftMethod::Auto.test_for(1000).name(), "ks");
        assert_eq!(DriftMethod::Auto.test_for(1001).name(), "wasserstein");
    }
}
