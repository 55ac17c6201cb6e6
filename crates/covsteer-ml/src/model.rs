//! Trainable scoring model for candidate ranking
//!
//! A linear regressor over scaled features predicts the total coverage
//! increase a test will produce. The model is an explicit state machine:
//! it starts `Untrained`, and only a successful [`ScoringModel::train`]
//! (or loading persisted artifacts) moves it to `Trained`, where
//! prediction becomes available. Failed training leaves the prior state
//! untouched.

use covsteer_coverage::{CoverageStore, TestHistory, TestSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::features::{coverage_features, test_features, FeatureScaler};
use crate::{MlError, MlResult};

/// Minimum history length before training is attempted
pub const MIN_TRAINING_RECORDS: usize = 10;

/// Linear model fitted by batch gradient descent on standardized features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressor {
    weights: Vec<f64>,
    bias: f64,
    learning_rate: f64,
    epochs: usize,
}

impl LinearRegressor {
    pub fn new(width: usize) -> Self {
        Self {
            weights: vec![0.0; width],
            bias: 0.0,
            learning_rate: 0.05,
            epochs: 500,
        }
    }

    /// Number of input features the regressor expects
    pub fn width(&self) -> usize {
        self.weights.len()
    }

    /// Fit weights on (row, target) pairs. Deterministic: zero
    /// initialization and full-batch updates.
    pub fn fit(&mut self, rows: &[Vec<f64>], targets: &[f64]) {
        let count = rows.len().min(targets.len());
        if count == 0 {
            return;
        }
        let n = count as f64;

        for _ in 0..self.epochs {
            let mut grad_w = vec![0.0; self.weights.len()];
            let mut grad_b = 0.0;

            for (row, target) in rows.iter().zip(targets).take(count) {
                let err = self.predict(row) - target;
                for (g, value) in grad_w.iter_mut().zip(row) {
                    *g += err * value;
                }
                grad_b += err;
            }

            for (w, g) in self.weights.iter_mut().zip(&grad_w) {
                *w -= self.learning_rate * g / n;
            }
            self.bias -= self.learning_rate * grad_b / n;
        }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.bias
            + self
                .weights
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    /// Coefficient of determination over (rows, targets)
    pub fn score(&self, rows: &[Vec<f64>], targets: &[f64]) -> f64 {
        if targets.is_empty() {
            return 0.0;
        }
        let mean = targets.iter().sum::<f64>() / targets.len() as f64;
        let ss_tot: f64 = targets.iter().map(|t| (t - mean).powi(2)).sum();
        let ss_res: f64 = rows
            .iter()
            .zip(targets)
            .map(|(row, t)| (t - self.predict(row)).powi(2))
            .sum();
        if ss_tot == 0.0 {
            return 0.0;
        }
        1.0 - ss_res / ss_tot
    }
}

#[derive(Debug, Clone, Default)]
enum ModelState {
    #[default]
    Untrained,
    Trained {
        scaler: FeatureScaler,
        regressor: LinearRegressor,
    },
}

/// Scoring model with an explicit untrained/trained lifecycle
#[derive(Debug, Clone, Default)]
pub struct ScoringModel {
    state: ModelState,
}

impl ScoringModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.state, ModelState::Trained { .. })
    }

    /// Fit scaler and regressor directly on prepared rows, replacing the
    /// current state.
    pub(crate) fn fit(&mut self, rows: &[Vec<f64>], targets: &[f64]) {
        let scaler = FeatureScaler::fit(rows);
        let scaled: Vec<Vec<f64>> = rows
            .iter()
            .filter_map(|row| scaler.transform(row).ok())
            .collect();

        let mut regressor = LinearRegressor::new(scaler.width());
        regressor.fit(&scaled, targets);

        self.state = ModelState::Trained { scaler, regressor };
    }

    /// Train from the test history: one row of test features per record,
    /// targeting the record's total coverage increase. Fails without
    /// touching the current state when the history is too short.
    pub fn train(&mut self, history: &TestHistory) -> MlResult<()> {
        if history.len() < MIN_TRAINING_RECORDS {
            return Err(MlError::InsufficientData {
                got: history.len(),
                need: MIN_TRAINING_RECORDS,
            });
        }

        let rows: Vec<Vec<f64>> = history
            .iter()
            .map(|record| test_features(&record.test).to_vec())
            .collect();
        let targets: Vec<f64> = history.iter().map(|record| record.total_increase()).collect();

        self.fit(&rows, &targets);

        if let ModelState::Trained { scaler, regressor } = &self.state {
            let scaled: Vec<Vec<f64>> = rows
                .iter()
                .filter_map(|row| scaler.transform(row).ok())
                .collect();
            info!(
                "model trained on {} records with score {:.4}",
                rows.len(),
                regressor.score(&scaled, &targets)
            );
        }
        Ok(())
    }

    /// Predict the coverage increase for a candidate against the current
    /// snapshot. Only callable once trained; rejects feature vectors whose
    /// width differs from the fitted width.
    pub fn predict(&self, spec: &TestSpec, store: &CoverageStore) -> MlResult<f64> {
        let ModelState::Trained { scaler, regressor } = &self.state else {
            return Err(MlError::NotTrained);
        };

        let mut row = test_features(spec).to_vec();
        row.extend(coverage_features(store));

        let scaled = scaler.transform(&row)?;
        Ok(regressor.predict(&scaled))
    }

    /// Persist the regressor and scaler as separate JSON artifacts
    pub fn save(&self, model_path: &Path, scaler_path: &Path) -> MlResult<()> {
        let ModelState::Trained { scaler, regressor } = &self.state else {
            return Err(MlError::NotTrained);
        };
        std::fs::write(model_path, serde_json::to_string_pretty(regressor)?)?;
        std::fs::write(scaler_path, serde_json::to_string_pretty(scaler)?)?;
        info!("model saved to {}", model_path.display());
        Ok(())
    }

    /// Load a trained model from its persisted artifacts
    pub fn load(model_path: &Path, scaler_path: &Path) -> MlResult<Self> {
        let regressor: LinearRegressor =
            serde_json::from_str(&std::fs::read_to_string(model_path)?)?;
        let scaler: FeatureScaler = serde_json::from_str(&std::fs::read_to_string(scaler_path)?)?;
        Ok(Self {
            state: ModelState::Trained { scaler, regressor },
        })
    }
}
