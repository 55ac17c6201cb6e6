//! Candidate test generation
//!
//! Candidates come in two batches, in order: one gap-targeted test per
//! uncovered point (deterministic given the gaps), then a fixed number of
//! exploratory tests with randomly drawn types and targets. The random
//! source is injected so callers can seed it for reproducible generation.

use covsteer_coverage::{DomainConfig, GapMap, TestKind, TestSpec};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// Exploration vocabularies and sizing for candidate generation
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of exploratory candidates appended after the gap-targeted ones
    pub exploration_count: usize,

    /// Target vocabulary per test type
    pub opcodes: Vec<String>,
    pub patterns: Vec<String>,
    pub tensor_ops: Vec<String>,
    pub edge_cases: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            exploration_count: 5,
            opcodes: strings(&[
                "ADD", "SUB", "MUL", "DIV", "AND", "OR", "XOR", "NOT", "SHL", "SHR",
            ]),
            patterns: strings(&[
                "sequential",
                "random",
                "strided",
                "matrix_transpose",
                "kv_cache",
            ]),
            tensor_ops: strings(&["MATMUL", "CONV2D", "ATTENTION", "LAYER_NORM", "SOFTMAX"]),
            edge_cases: strings(&[
                "boundary_values",
                "overflow",
                "underflow",
                "denormal",
                "nan_inf",
            ]),
        }
    }
}

impl GeneratorConfig {
    fn vocabulary(&self, kind: TestKind) -> &[String] {
        match kind {
            TestKind::Instruction => &self.opcodes,
            TestKind::Memory => &self.patterns,
            TestKind::Tensor => &self.tensor_ops,
            TestKind::EdgeCase => &self.edge_cases,
        }
    }
}

/// Synthesizes candidate tests from coverage gaps
pub struct CandidateGenerator {
    domains: Arc<DomainConfig>,
    config: GeneratorConfig,
}

impl CandidateGenerator {
    pub fn new(domains: Arc<DomainConfig>, config: GeneratorConfig) -> Self {
        Self { domains, config }
    }

    /// One gap-targeted candidate per (domain, item) pair, in gap order.
    /// Deterministic given the gaps.
    pub fn generate_for_gaps(&self, gaps: &GapMap) -> Vec<TestSpec> {
        let mut candidates = Vec::new();
        for (domain, items) in gaps {
            let Some(kind) = self.domains.kind_of(domain) else {
                continue;
            };
            for item in items {
                candidates.push(TestSpec::for_gap(kind, item));
            }
        }
        candidates
    }

    /// One exploratory candidate of uniformly random type, its target drawn
    /// uniformly from that type's vocabulary
    fn random_candidate(&self, rng: &mut impl Rng) -> Option<TestSpec> {
        let kind = *TestKind::ALL.choose(rng)?;
        let target = self.config.vocabulary(kind).choose(rng)?;
        Some(match kind {
            TestKind::Instruction => TestSpec::instruction(target),
            TestKind::Memory => TestSpec::memory(target),
            TestKind::Tensor => TestSpec::tensor(target),
            TestKind::EdgeCase => TestSpec::edge_case(target),
        })
    }

    /// Gap-targeted candidates followed by the configured number of
    /// exploratory ones
    pub fn generate(&self, gaps: &GapMap, rng: &mut impl Rng) -> Vec<TestSpec> {
        let mut candidates = self.generate_for_gaps(gaps);
        for _ in 0..self.config.exploration_count {
            if let Some(candidate) = self.random_candidate(rng) {
                candidates.push(candidate);
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generator() -> CandidateGenerator {
        CandidateGenerator::new(
            Arc::new(DomainConfig::default()),
            GeneratorConfig::default(),
        )
    }

    fn gaps(entries: &[(&str, &[&str])]) -> GapMap {
        let mut gaps = IndexMap::new();
        for (domain, items) in entries {
            gaps.insert(
                domain.to_string(),
                items.iter().map(|s| s.to_string()).collect(),
            );
        }
        gaps
    }

    #[test]
    fn test_gap_candidates_come_first_in_gap_order() {
        let gaps = gaps(&[
            ("instruction", &["instruction.SUB", "instruction.XOR"]),
            ("tensor", &["tensor.SOFTMAX"]),
        ]);

        let mut rng = StdRng::seed_from_u64(7);
        let candidates = generator().generate(&gaps, &mut rng);

        assert_eq!(candidates.len(), 3 + 5);
        assert_eq!(candidates[0].target(), "SUB");
        assert_eq!(candidates[0].kind(), TestKind::Instruction);
        assert_eq!(candidates[1].target(), "XOR");
        assert_eq!(candidates[2].target(), "SOFTMAX");
        assert_eq!(candidates[2].kind(), TestKind::Tensor);
    }

    #[test]
    fn test_empty_gaps_still_explore() {
        let mut rng = StdRng::seed_from_u64(7);
        let candidates = generator().generate(&GapMap::new(), &mut rng);
        assert_eq!(candidates.len(), 5);
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let gaps = gaps(&[("memory", &["memory.kv_cache"])]);
        let generator = generator();

        let first = generator.generate(&gaps, &mut StdRng::seed_from_u64(42));
        let second = generator.generate(&gaps, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_exploratory_targets_come_from_vocabulary() {
        let config = GeneratorConfig::default();
        let generator = generator();
        let mut rng = StdRng::seed_from_u64(3);

        for candidate in generator.generate(&GapMap::new(), &mut rng) {
            let vocabulary = config.vocabulary(candidate.kind());
            assert!(vocabulary.iter().any(|t| t == candidate.target()));
        }
    }

    #[test]
    fn test_unknown_gap_domains_are_skipped() {
        let gaps = gaps(&[("scheduler", &["scheduler.warp0"])]);
        let candidates = generator().generate_for_gaps(&gaps);
        assert!(candidates.is_empty());
    }
}
