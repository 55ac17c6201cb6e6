//! Learned test ranking for coverage-driven verification
//!
//! This crate sits on top of `covsteer-coverage` and decides which test to
//! run next:
//!
//! - **Feature extraction**: fixed-width numeric vectors from test specs
//!   and coverage snapshots, plus the feature scaler
//! - **Scoring model**: a trainable linear regressor predicting the
//!   coverage increase a test will buy, with an explicit
//!   untrained/trained state machine and JSON persistence
//! - **Candidate generation**: gap-targeted test specs plus a few
//!   exploratory random ones, from an injectable RNG
//! - **Test optimizer**: owns the store, history and model, and wires
//!   training, ranking and suggestion together

pub mod candidates;
pub mod features;
pub mod model;
pub mod optimizer;

pub use candidates::{CandidateGenerator, GeneratorConfig};
pub use features::{coverage_features, test_features, FeatureScaler, TEST_FEATURES};
pub use model::{LinearRegressor, ScoringModel, MIN_TRAINING_RECORDS};
pub use optimizer::TestOptimizer;

use thiserror::Error;

/// Errors that can occur in scoring-model operations
#[derive(Error, Debug)]
pub enum MlError {
    #[error("model not trained")]
    NotTrained,

    #[error("insufficient training data: {got} records, need at least {need}")]
    InsufficientData { got: usize, need: usize },

    #[error("feature width mismatch: model fitted for {fitted}, got {got}")]
    FeatureWidthMismatch { fitted: usize, got: usize },

    #[error("failed to persist model artifact: {0}")]
    Persist(#[from] std::io::Error),

    #[error("malformed model artifact: {0}")]
    Artifact(#[from] serde_json::Error),
}

/// Result type for scoring-model operations
pub type MlResult<T> = Result<T, MlError>;
