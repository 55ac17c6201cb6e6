//! Per-test effectiveness summarization
//!
//! A read-only view over the history: how much coverage each executed test
//! bought, and in which domains. No new state is derived.

use crate::domain::DomainConfig;
use crate::history::TestHistory;
use indexmap::IndexMap;

/// Effectiveness of one historical test
#[derive(Debug, Clone)]
pub struct TestEffectiveness {
    /// Display label for the record (`Test #3`)
    pub name: String,

    /// Serialized test type tag
    pub kind: &'static str,

    /// Sum of all increase amounts the test produced
    pub total_increase: f64,

    /// Number of points with a positive increase
    pub new_points: usize,

    /// Newly covered point count per domain; domains that gained nothing
    /// carry no key
    pub domains_covered: IndexMap<String, usize>,
}

/// Summarize every record in history order. Returns `None` when there is
/// no history to analyze.
pub fn analyze_effectiveness(
    history: &TestHistory,
    config: &DomainConfig,
) -> Option<Vec<TestEffectiveness>> {
    if history.is_empty() {
        return None;
    }

    let report = history
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let mut domains_covered: IndexMap<String, usize> = IndexMap::new();
            let mut new_points = 0;

            for (point, increase) in &record.coverage_increase {
                if *increase > 0.0 {
                    new_points += 1;
                    if let Some(domain) = config.classify(point) {
                        *domains_covered
                            .entry(config.name(domain).to_string())
                            .or_insert(0) += 1;
                    }
                }
            }

            TestEffectiveness {
                name: format!("Test #{}", index + 1),
                kind: record.test.type_tag(),
                total_increase: record.total_increase(),
                new_points,
                domains_covered,
            }
        })
        .collect();

    Some(report)
}
