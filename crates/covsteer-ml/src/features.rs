//! Feature extraction for the scoring model
//!
//! Two fixed-width vectors feed the model: per-test features describing a
//! test specification, and coverage features describing the current state
//! of the snapshot. Prediction concatenates the two.

use covsteer_coverage::{CoverageStore, GapAnalyzer, TestSpec};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{MlError, MlResult};

/// Width of the per-test feature vector
pub const TEST_FEATURES: usize = 6;

/// Stable numeric code for a test type tag: the leading bytes of its
/// SHA-256 digest, reduced mod 1000. Stable across processes, unlike the
/// standard library's hasher.
fn type_code(tag: &str) -> f64 {
    let digest = Sha256::digest(tag.as_bytes());
    let code = digest
        .iter()
        .take(8)
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
    (code % 1000) as f64
}

/// Extract the per-test feature vector:
/// [type code, complexity, operation count, memory access count,
/// tensor op count, duration].
pub fn test_features(spec: &TestSpec) -> [f64; TEST_FEATURES] {
    [
        type_code(spec.type_tag()),
        f64::from(spec.complexity()),
        spec.operation_count() as f64,
        spec.memory_access_count() as f64,
        spec.tensor_op_count() as f64,
        spec.duration().unwrap_or(0.0),
    ]
}

/// Extract the coverage feature vector: the overall percentage followed by
/// one percentage per configured domain, in configuration order.
pub fn coverage_features(store: &CoverageStore) -> Vec<f64> {
    let analyzer = GapAnalyzer::new(store.config().clone());
    let mut features = Vec::with_capacity(1 + store.config().len());
    features.push(analyzer.overall_coverage(store));
    for domain in store.config().iter() {
        features.push(analyzer.domain_coverage(store, &domain.name));
    }
    features
}

/// Standardizing feature scaler: shifts each column to zero mean and unit
/// variance, fitted once on the training rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl FeatureScaler {
    /// Fit column means and deviations on the training rows. Columns with
    /// zero variance scale by 1 so transform stays defined.
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let count = rows.len().max(1) as f64;

        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, value) in mean.iter_mut().zip(row) {
                *m += value;
            }
        }
        for m in &mut mean {
            *m /= count;
        }

        let mut scale = vec![0.0; width];
        for row in rows {
            for ((s, m), value) in scale.iter_mut().zip(&mean).zip(row) {
                *s += (value - m).powi(2);
            }
        }
        for s in &mut scale {
            *s = (*s / count).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Self { mean, scale }
    }

    /// Number of columns the scaler was fitted on
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Standardize one row. Fails when the row width does not match the
    /// fitted width.
    pub fn transform(&self, row: &[f64]) -> MlResult<Vec<f64>> {
        if row.len() != self.width() {
            return Err(MlError::FeatureWidthMismatch {
                fitted: self.width(),
                got: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(value, (mean, scale))| (value - mean) / scale)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covsteer_coverage::DomainConfig;
    use std::sync::Arc;

    #[test]
    fn test_type_code_is_stable_and_bounded() {
        let code = type_code("instruction_test");
        assert_eq!(code, type_code("instruction_test"));
        assert!((0.0..1000.0).contains(&code));
        assert_ne!(code, type_code("memory_test"));
    }

    #[test]
    fn test_test_features_shape_and_defaults() {
        let spec = TestSpec::instruction("ADD");
        let features = test_features(&spec);

        assert_eq!(features.len(), TEST_FEATURES);
        assert_eq!(features[1], 1.0); // instruction complexity
        assert_eq!(features[2], 1.0); // one operation descriptor
        assert_eq!(features[3], 0.0);
        assert_eq!(features[4], 0.0);
        assert_eq!(features[5], 0.0); // duration defaults to 0

        let spec = TestSpec::tensor("MATMUL");
        let features = test_features(&spec);
        assert_eq!(features[1], 3.0);
        assert_eq!(features[4], 1.0);
    }

    #[test]
    fn test_coverage_features_track_configured_domains() {
        let config = Arc::new(DomainConfig::default());
        let store = CoverageStore::from_values(
            config,
            [
                ("instruction.ADD".to_string(), 1.0),
                ("instruction.SUB".to_string(), 0.0),
            ],
        );

        let features = coverage_features(&store);
        assert_eq!(features.len(), 5);
        assert_eq!(features[0], 50.0); // overall
        assert_eq!(features[1], 50.0); // instruction
        assert_eq!(features[2], 0.0); // memory has no points
    }

    #[test]
    fn test_scaler_standardizes_columns() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = FeatureScaler::fit(&rows);

        let scaled = scaler.transform(&[1.0, 10.0]).unwrap();
        assert!((scaled[0] + 1.0).abs() < 1e-9);
        // Constant column stays finite
        assert_eq!(scaled[1], 0.0);
    }

    #[test]
    fn test_scaler_rejects_mismatched_width() {
        let scaler = FeatureScaler::fit(&[vec![1.0, 2.0, 3.0]]);
        let err = scaler.transform(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            MlError::FeatureWidthMismatch { fitted: 3, got: 2 }
        ));
    }
}
