//! Test optimizer: the facade wiring coverage analysis, candidate
//! generation and the scoring model together
//!
//! Owns one snapshot/history pair and the scoring model persisted next to
//! them. All operations are synchronous and run to completion; callers
//! serialize writes externally.

use covsteer_coverage::{
    analyze_effectiveness, artifact_path, CoverageResult, CoverageStore, CoverageSummary,
    DomainConfig, GapAnalyzer, GapMap, TestEffectiveness, TestHistory, TestRecord, TestSpec,
    TrendSeries, TrendTracker,
};
use indexmap::IndexMap;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::candidates::{CandidateGenerator, GeneratorConfig};
use crate::model::ScoringModel;
use crate::MlResult;

/// Coverage-driven test selection over one snapshot/history pair
pub struct TestOptimizer {
    snapshot_path: PathBuf,
    store: CoverageStore,
    history: TestHistory,
    model: ScoringModel,
    analyzer: GapAnalyzer,
    tracker: TrendTracker,
    generator: CandidateGenerator,
}

impl TestOptimizer {
    /// Open the optimizer for a snapshot file: loads the snapshot, its
    /// derived history file and, when present, the persisted model
    /// artifacts. Missing or malformed files degrade to empty state.
    pub fn open(snapshot_path: impl Into<PathBuf>, config: Arc<DomainConfig>) -> Self {
        let snapshot_path = snapshot_path.into();
        let store = CoverageStore::load_or_empty(&snapshot_path, config.clone());
        let history = TestHistory::load_or_empty(&artifact_path(&snapshot_path, "history"));

        let model_path = artifact_path(&snapshot_path, "model");
        let scaler_path = artifact_path(&snapshot_path, "scaler");
        let model = if model_path.exists() && scaler_path.exists() {
            match ScoringModel::load(&model_path, &scaler_path) {
                Ok(model) => {
                    info!("loaded trained model from {}", model_path.display());
                    model
                }
                Err(err) => {
                    warn!("error loading model artifacts: {err}");
                    ScoringModel::new()
                }
            }
        } else {
            ScoringModel::new()
        };

        Self {
            store,
            history,
            model,
            analyzer: GapAnalyzer::new(config.clone()),
            tracker: TrendTracker::new(config.clone()),
            generator: CandidateGenerator::new(config, GeneratorConfig::default()),
            snapshot_path,
        }
    }

    pub fn store(&self) -> &CoverageStore {
        &self.store
    }

    pub fn history(&self) -> &TestHistory {
        &self.history
    }

    pub fn model(&self) -> &ScoringModel {
        &self.model
    }

    #[cfg(test)]
    pub(crate) fn model_mut(&mut self) -> &mut ScoringModel {
        &mut self.model
    }

    /// Uncovered points grouped by domain
    pub fn identify_gaps(&self) -> GapMap {
        self.analyzer.identify_gaps(&self.store)
    }

    /// Overall and per-domain coverage percentages
    pub fn coverage_summary(&self) -> CoverageSummary {
        self.analyzer.summary(&self.store)
    }

    /// Cumulative coverage curves, or `None` without history
    pub fn analyze_trend(&self) -> Option<TrendSeries> {
        self.tracker.analyze(&self.history, &self.store)
    }

    /// Per-test effectiveness report, or `None` without history
    pub fn analyze_effectiveness(&self) -> Option<Vec<TestEffectiveness>> {
        analyze_effectiveness(&self.history, self.store.config())
    }

    /// Static gap-targeted suggestions, no ranking involved
    pub fn suggest_for_gaps(&self) -> Vec<TestSpec> {
        self.generator.generate_for_gaps(&self.identify_gaps())
    }

    /// Record an executed test and the coverage delta it produced
    pub fn add_test_result(&mut self, test: TestSpec, coverage_increase: IndexMap<String, f64>) {
        self.history.push(TestRecord::new(test, coverage_increase));
    }

    /// Train the scoring model from the history and persist its artifacts
    pub fn train(&mut self) -> MlResult<()> {
        self.model.train(&self.history)?;
        self.model.save(
            &artifact_path(&self.snapshot_path, "model"),
            &artifact_path(&self.snapshot_path, "scaler"),
        )
    }

    /// Suggest the next test: generate candidates, score each with the
    /// model, and return the highest-scoring one annotated with its
    /// predicted coverage increase. Candidates the model cannot score are
    /// skipped; when every candidate fails, the first generated candidate
    /// is returned unranked. `None` only when no candidates exist at all.
    pub fn suggest_next(&self, rng: &mut impl Rng) -> Option<TestSpec> {
        let gaps = self.identify_gaps();
        let mut candidates = self.generator.generate(&gaps, rng);
        if candidates.is_empty() {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, candidate) in candidates.iter().enumerate() {
            match self.model.predict(candidate, &self.store) {
                Ok(score) => {
                    if best.map_or(true, |(_, top)| score > top) {
                        best = Some((index, score));
                    }
                }
                Err(err) => {
                    debug!("skipping candidate {index}: {err}");
                }
            }
        }

        match best {
            Some((index, score)) => {
                let mut winner = candidates.swap_remove(index);
                winner.set_predicted_increase(score);
                Some(winner)
            }
            None => {
                warn!("no candidate could be scored, falling back to the first");
                Some(candidates.swap_remove(0))
            }
        }
    }

    /// Save the snapshot and history back to their files
    pub fn save(&self) -> CoverageResult<()> {
        self.store.save(&self.snapshot_path)?;
        self.history
            .save(&artifact_path(&self.snapshot_path, "history"))
    }

    /// Path of the backing snapshot file
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }
}
