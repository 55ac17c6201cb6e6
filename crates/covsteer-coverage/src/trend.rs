//! Cumulative coverage trend over the test history
//!
//! Replays the history in order, accumulating each record's coverage
//! increases, and reports the coverage percentage after every test. The
//! denominator is always the *current* snapshot's point universe (with the
//! configured expectation count as fallback for domains the snapshot does
//! not know), so historical points are re-normalized to today's universe.

use crate::domain::DomainConfig;
use crate::history::TestHistory;
use crate::store::CoverageStore;
use indexmap::IndexMap;
use std::sync::Arc;

/// Fallback denominator for the overall series when the snapshot is empty
const EMPTY_SNAPSHOT_TOTAL: usize = 100;

/// Per-test cumulative coverage percentages: one `overall` series plus one
/// series per configured domain, each with one entry per replayed record.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    pub overall: Vec<f64>,
    pub domains: IndexMap<String, Vec<f64>>,
}

impl TrendSeries {
    /// Number of replayed records
    pub fn len(&self) -> usize {
        self.overall.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overall.is_empty()
    }
}

/// Replays the test history into cumulative coverage curves
pub struct TrendTracker {
    config: Arc<DomainConfig>,
}

impl TrendTracker {
    pub fn new(config: Arc<DomainConfig>) -> Self {
        Self { config }
    }

    /// Compute the trend, or `None` when there is no history to replay
    pub fn analyze(&self, history: &TestHistory, store: &CoverageStore) -> Option<TrendSeries> {
        if history.is_empty() {
            return None;
        }

        let mut overall = Vec::with_capacity(history.len());
        let mut domains: IndexMap<String, Vec<f64>> = self
            .config
            .iter()
            .map(|d| (d.name.clone(), Vec::with_capacity(history.len())))
            .collect();

        // Cumulative increase per point, tagged with its domain on first sight
        let mut cumulative: IndexMap<String, (f64, Option<usize>)> = IndexMap::new();

        for record in history.iter() {
            for (point, increase) in &record.coverage_increase {
                let entry = cumulative
                    .entry(point.clone())
                    .or_insert_with(|| (0.0, self.config.classify(point)));
                entry.0 += increase;
            }

            let covered = cumulative.values().filter(|(v, _)| *v > 0.0).count();
            let total = if store.is_empty() {
                EMPTY_SNAPSHOT_TOTAL
            } else {
                store.len()
            };
            overall.push(covered as f64 / total as f64 * 100.0);

            for (index, domain) in self.config.iter().enumerate() {
                let covered = cumulative
                    .values()
                    .filter(|(v, d)| *d == Some(index) && *v > 0.0)
                    .count();
                let total = match store.domain_total(index) {
                    0 => domain.expected_points,
                    n => n,
                };
                domains[&domain.name].push(covered as f64 / total as f64 * 100.0);
            }
        }

        Some(TrendSeries { overall, domains })
    }
}
