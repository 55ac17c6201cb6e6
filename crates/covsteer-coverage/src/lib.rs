//! Coverage data model and gap analysis for covsteer
//!
//! This crate owns the verification coverage data model and the read-only
//! analyses over it:
//!
//! - **Coverage store**: snapshot of coverage points and their hit values,
//!   loaded from and saved to a JSON file
//! - **Test history**: append-only log of executed tests and the coverage
//!   delta each produced
//! - **Gap analyzer**: per-domain and overall coverage percentages plus the
//!   set of uncovered points
//! - **Trend tracker**: cumulative coverage curves replayed from history
//! - **Effectiveness report**: per-test summary of newly covered points
//!
//! Test synthesis and learned ranking live in `covsteer-ml` on top of this
//! crate.

pub mod domain;
pub mod effectiveness;
pub mod gaps;
pub mod history;
pub mod store;
pub mod trend;

pub use domain::{DomainConfig, DomainSpec};
pub use effectiveness::{analyze_effectiveness, TestEffectiveness};
pub use gaps::{CoverageSummary, GapAnalyzer, GapMap};
pub use history::{
    EdgeOperation, MemoryAccess, Operation, TensorOp, TestHistory, TestKind, TestRecord, TestSpec,
};
pub use store::{artifact_path, CoverageStore};
pub use trend::{TrendSeries, TrendTracker};

use thiserror::Error;

/// Errors that can occur while loading or saving coverage data
#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed coverage data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for coverage data operations
pub type CoverageResult<T> = Result<T, CoverageError>;
