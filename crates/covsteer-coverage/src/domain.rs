//! Coverage domain configuration and point classification
//!
//! A coverage point's domain is determined by the first segment of its
//! dotted name (`instruction.ADD` belongs to `instruction`). The domain set
//! is explicit configuration injected at construction so independent
//! verification projects can run side by side with different domain tables.

use crate::history::TestKind;

/// One coverage domain: its name prefix, the test type that targets it, and
/// the expected number of coverage points used as a fallback denominator
/// when the current snapshot has no points for the domain.
#[derive(Debug, Clone)]
pub struct DomainSpec {
    /// Domain name, matched against the first dotted segment of point names
    pub name: String,

    /// Test type synthesized to fill gaps in this domain
    pub kind: TestKind,

    /// Expected point count, used only when the snapshot knows no points
    pub expected_points: usize,
}

impl DomainSpec {
    pub fn new(name: impl Into<String>, kind: TestKind, expected_points: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            expected_points,
        }
    }
}

/// Ordered table of coverage domains for one verification project
#[derive(Debug, Clone)]
pub struct DomainConfig {
    domains: Vec<DomainSpec>,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self::new(vec![
            DomainSpec::new("instruction", TestKind::Instruction, 40),
            DomainSpec::new("memory", TestKind::Memory, 30),
            DomainSpec::new("tensor", TestKind::Tensor, 35),
            DomainSpec::new("edge_case", TestKind::EdgeCase, 20),
        ])
    }
}

impl DomainConfig {
    pub fn new(domains: Vec<DomainSpec>) -> Self {
        Self { domains }
    }

    /// Number of configured domains
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Iterate domains in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &DomainSpec> {
        self.domains.iter()
    }

    /// Domain name for an index
    pub fn name(&self, index: usize) -> &str {
        &self.domains[index].name
    }

    /// Expected point count for an index
    pub fn expected_points(&self, index: usize) -> usize {
        self.domains[index].expected_points
    }

    /// Look up a domain index by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.domains.iter().position(|d| d.name == name)
    }

    /// Test type targeting the named domain
    pub fn kind_of(&self, name: &str) -> Option<TestKind> {
        self.index_of(name).map(|i| self.domains[i].kind)
    }

    /// Classify a coverage point by the first segment of its dotted name.
    /// Returns the domain index, or `None` for points outside every
    /// configured domain (those still count toward overall coverage).
    pub fn classify(&self, point: &str) -> Option<usize> {
        let segment = point.split('.').next().unwrap_or(point);
        self.domains.iter().position(|d| d.name == segment)
    }
}
