//! In-memory coverage snapshot, backed by a JSON file
//!
//! The store maps coverage point names to hit values. A point is covered
//! iff its value is greater than zero; JSON booleans load as 0/1. Each
//! point's domain is classified once at insertion and cached next to the
//! value, so gap and percentage queries stay linear over the snapshot.

use crate::domain::DomainConfig;
use crate::{CoverageError, CoverageResult};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Derive a sibling artifact path from the snapshot file name:
/// `cov.json` + `history` -> `cov_history.json`.
pub fn artifact_path(snapshot: &Path, suffix: &str) -> PathBuf {
    let stem = snapshot
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("coverage");
    snapshot.with_file_name(format!("{stem}_{suffix}.json"))
}

#[derive(Debug, Clone, Copy)]
struct PointState {
    value: f64,
    /// Cached domain index into the store's `DomainConfig`
    domain: Option<usize>,
}

/// Snapshot of coverage points and their hit values.
///
/// Replaced wholesale on load; the analysis engine never increments it
/// (hit counting happens externally, in the simulator).
#[derive(Debug, Clone)]
pub struct CoverageStore {
    config: Arc<DomainConfig>,
    points: IndexMap<String, PointState>,
}

impl CoverageStore {
    pub fn new(config: Arc<DomainConfig>) -> Self {
        Self {
            config,
            points: IndexMap::new(),
        }
    }

    /// Build a store from (name, value) pairs
    pub fn from_values<I, S>(config: Arc<DomainConfig>, values: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut store = Self::new(config);
        for (name, value) in values {
            store.set(name, value);
        }
        store
    }

    pub fn config(&self) -> &Arc<DomainConfig> {
        &self.config
    }

    /// Insert or replace a coverage point, classifying its domain once
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        let domain = self.config.classify(&name);
        self.points.insert(name, PointState { value, domain });
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.points.get(name).map(|p| p.value)
    }

    pub fn is_covered(&self, name: &str) -> bool {
        self.value(name).is_some_and(|v| v > 0.0)
    }

    /// Total number of coverage points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of covered points over the whole snapshot
    pub fn covered_count(&self) -> usize {
        self.points.values().filter(|p| p.value > 0.0).count()
    }

    /// Iterate (name, value) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.points.iter().map(|(name, p)| (name.as_str(), p.value))
    }

    /// Iterate points tagged with the given domain index
    pub fn domain_points(&self, domain: usize) -> impl Iterator<Item = (&str, f64)> {
        self.points
            .iter()
            .filter(move |(_, p)| p.domain == Some(domain))
            .map(|(name, p)| (name.as_str(), p.value))
    }

    /// Point count for one domain
    pub fn domain_total(&self, domain: usize) -> usize {
        self.domain_points(domain).count()
    }

    /// Covered point count for one domain
    pub fn domain_covered(&self, domain: usize) -> usize {
        self.domain_points(domain).filter(|(_, v)| *v > 0.0).count()
    }

    /// Load a snapshot file: a JSON object mapping point names to values.
    /// Numbers keep their value, `true`/`false` become 1/0, anything else
    /// is treated as uncovered.
    pub fn load(path: &Path, config: Arc<DomainConfig>) -> CoverageResult<Self> {
        let text = std::fs::read_to_string(path).map_err(CoverageError::Io)?;
        let raw: IndexMap<String, Value> = serde_json::from_str(&text)?;

        let mut store = Self::new(config);
        for (name, value) in raw {
            let value = match value {
                Value::Bool(b) => {
                    if b {
                        1.0
                    } else {
                        0.0
                    }
                }
                Value::Number(n) => n.as_f64().unwrap_or(0.0),
                _ => 0.0,
            };
            store.set(name, value);
        }

        info!("loaded coverage data for {} coverage points", store.len());
        Ok(store)
    }

    /// Load a snapshot, substituting an empty store when the file is
    /// missing or malformed.
    pub fn load_or_empty(path: &Path, config: Arc<DomainConfig>) -> Self {
        match Self::load(path, config.clone()) {
            Ok(store) => store,
            Err(err) => {
                warn!("error loading coverage data from {}: {err}", path.display());
                Self::new(config)
            }
        }
    }

    /// Save the snapshot wholesale as pretty-printed JSON
    pub fn save(&self, path: &Path) -> CoverageResult<()> {
        let map: IndexMap<&str, f64> = self.iter().collect();
        let json = serde_json::to_string_pretty(&map)?;
        std::fs::write(path, json).map_err(CoverageError::Io)?;
        info!("saved coverage data for {} coverage points", self.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Arc<DomainConfig> {
        Arc::new(DomainConfig::default())
    }

    #[test]
    fn test_domain_tags_cached_on_insert() {
        let store = CoverageStore::from_values(
            config(),
            [
                ("instruction.ADD".to_string(), 1.0),
                ("instruction.SUB".to_string(), 0.0),
                ("memory.sequential".to_string(), 3.0),
                ("scheduler.warp0".to_string(), 1.0),
            ],
        );

        assert_eq!(store.len(), 4);
        assert_eq!(store.domain_total(0), 2);
        assert_eq!(store.domain_covered(0), 1);
        assert_eq!(store.domain_total(1), 1);
        // Unclassified points still count toward the overall totals
        assert_eq!(store.covered_count(), 3);
    }

    #[test]
    fn test_load_interprets_truthy_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coverage.json");
        std::fs::write(
            &path,
            r#"{"instruction.ADD": true, "instruction.SUB": false, "memory.seq": 2, "tensor.MATMUL": null}"#,
        )
        .unwrap();

        let store = CoverageStore::load(&path, config()).unwrap();
        assert!(store.is_covered("instruction.ADD"));
        assert!(!store.is_covered("instruction.SUB"));
        assert_eq!(store.value("memory.seq"), Some(2.0));
        assert!(!store.is_covered("tensor.MATMUL"));
    }

    #[test]
    fn test_load_or_empty_recovers_from_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coverage.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let store = CoverageStore::load_or_empty(&path, config());
        assert!(store.is_empty());

        let missing = CoverageStore::load_or_empty(&dir.path().join("absent.json"), config());
        assert!(missing.is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coverage.json");

        let store = CoverageStore::from_values(
            config(),
            [("instruction.ADD".to_string(), 2.0), ("memory.seq".to_string(), 0.0)],
        );
        store.save(&path).unwrap();

        let reloaded = CoverageStore::load(&path, config()).unwrap();
        assert_eq!(reloaded.value("instruction.ADD"), Some(2.0));
        assert!(!reloaded.is_covered("memory.seq"));
    }

    #[test]
    fn test_artifact_path_derivation() {
        let base = Path::new("/data/gpu_coverage.json");
        assert_eq!(
            artifact_path(base, "history"),
            PathBuf::from("/data/gpu_coverage_history.json")
        );
        assert_eq!(
            artifact_path(base, "model"),
            PathBuf::from("/data/gpu_coverage_model.json")
        );
    }
}
