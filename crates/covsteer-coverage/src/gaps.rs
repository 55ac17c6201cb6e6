//! Coverage gap identification and percentage summaries

use crate::domain::DomainConfig;
use crate::store::CoverageStore;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Domain name -> uncovered point names, in domain configuration order.
/// Domains with no gaps carry no key.
pub type GapMap = IndexMap<String, Vec<String>>;

/// Coverage percentages by domain, plus the overall percentage computed
/// over the full snapshot (not an average of the per-domain values).
#[derive(Debug, Clone, Serialize)]
pub struct CoverageSummary {
    pub overall: f64,
    pub domains: IndexMap<String, f64>,
}

impl fmt::Display for CoverageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Coverage Summary")?;
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "  Overall:    {:6.2}%", self.overall)?;
        for (domain, pct) in &self.domains {
            writeln!(f, "  {:<11} {:6.2}%", format!("{domain}:"), pct)?;
        }
        Ok(())
    }
}

/// Pure queries over a coverage snapshot: uncovered points and coverage
/// percentages, per domain and overall.
pub struct GapAnalyzer {
    config: Arc<DomainConfig>,
}

impl GapAnalyzer {
    pub fn new(config: Arc<DomainConfig>) -> Self {
        Self { config }
    }

    /// Uncovered point names grouped by domain. A domain with no gaps is
    /// omitted entirely rather than mapped to an empty list.
    pub fn identify_gaps(&self, store: &CoverageStore) -> GapMap {
        let mut gaps = GapMap::new();

        for (index, domain) in self.config.iter().enumerate() {
            let uncovered: Vec<String> = store
                .domain_points(index)
                .filter(|(_, value)| *value <= 0.0)
                .map(|(name, _)| name.to_string())
                .collect();
            if !uncovered.is_empty() {
                gaps.insert(domain.name.clone(), uncovered);
            }
        }

        gaps
    }

    /// Coverage percentage for one domain. Returns 0.0 when the domain has
    /// no points in the snapshot.
    pub fn domain_coverage(&self, store: &CoverageStore, domain: &str) -> f64 {
        let Some(index) = self.config.index_of(domain) else {
            return 0.0;
        };
        let total = store.domain_total(index);
        if total == 0 {
            return 0.0;
        }
        store.domain_covered(index) as f64 / total as f64 * 100.0
    }

    /// Coverage percentage over the entire snapshot. Returns 0.0 for an
    /// empty snapshot.
    pub fn overall_coverage(&self, store: &CoverageStore) -> f64 {
        if store.is_empty() {
            return 0.0;
        }
        store.covered_count() as f64 / store.len() as f64 * 100.0
    }

    /// Overall plus every configured domain
    pub fn summary(&self, store: &CoverageStore) -> CoverageSummary {
        let domains = self
            .config
            .iter()
            .map(|d| (d.name.clone(), self.domain_coverage(store, &d.name)))
            .collect();
        CoverageSummary {
            overall: self.overall_coverage(store),
            domains,
        }
    }
}
