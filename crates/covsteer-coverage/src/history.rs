//! Test specifications and the executed-test history log
//!
//! `TestSpec` is a tagged variant type: one variant per test type, each
//! carrying its target identifier and descriptor list, so feature
//! extraction downstream never needs defensive field lookups. The history
//! is an append-only ordered sequence of records; order is significant
//! because the trend tracker replays it sequentially.

use crate::{CoverageError, CoverageResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// The four test types the verification flow can synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestKind {
    Instruction,
    Memory,
    Tensor,
    EdgeCase,
}

impl TestKind {
    /// All test types, in complexity order
    pub const ALL: [TestKind; 4] = [
        TestKind::Instruction,
        TestKind::Memory,
        TestKind::Tensor,
        TestKind::EdgeCase,
    ];

    /// Serialized type tag
    pub fn type_tag(&self) -> &'static str {
        match self {
            TestKind::Instruction => "instruction_test",
            TestKind::Memory => "memory_test",
            TestKind::Tensor => "tensor_test",
            TestKind::EdgeCase => "edge_case_test",
        }
    }

    /// Fixed complexity constant for the type, used only as a feature
    pub fn complexity(&self) -> u32 {
        match self {
            TestKind::Instruction => 1,
            TestKind::Memory => 2,
            TestKind::Tensor => 3,
            TestKind::EdgeCase => 4,
        }
    }
}

/// One instruction operation in a test body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub opcode: String,
    pub iterations: u32,
}

/// One memory access descriptor in a test body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryAccess {
    pub pattern: String,
    pub size: u32,
}

/// One tensor operation descriptor in a test body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorOp {
    pub operation: String,
    pub dimensions: Vec<u32>,
}

/// One edge-case operation descriptor in a test body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeOperation {
    pub case: String,
}

/// A concrete test specification, tagged by test type.
///
/// Constructed through [`TestSpec::instruction`] and friends, which fill the
/// minimal descriptor and the type's complexity constant. `duration` and
/// `predicted_coverage_increase` are optional annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TestSpec {
    #[serde(rename = "instruction_test")]
    Instruction {
        opcode: String,
        #[serde(default)]
        operations: Vec<Operation>,
        #[serde(default)]
        complexity: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        predicted_coverage_increase: Option<f64>,
    },
    #[serde(rename = "memory_test")]
    Memory {
        pattern: String,
        #[serde(default)]
        memory_accesses: Vec<MemoryAccess>,
        #[serde(default)]
        complexity: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        predicted_coverage_increase: Option<f64>,
    },
    #[serde(rename = "tensor_test")]
    Tensor {
        operation: String,
        #[serde(default)]
        tensor_ops: Vec<TensorOp>,
        #[serde(default)]
        complexity: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        predicted_coverage_increase: Option<f64>,
    },
    #[serde(rename = "edge_case_test")]
    EdgeCase {
        case: String,
        #[serde(default)]
        operations: Vec<EdgeOperation>,
        #[serde(default)]
        complexity: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        predicted_coverage_increase: Option<f64>,
    },
}

impl TestSpec {
    /// Instruction test exercising a single opcode
    pub fn instruction(opcode: impl Into<String>) -> Self {
        let opcode = opcode.into();
        TestSpec::Instruction {
            operations: vec![Operation {
                opcode: opcode.clone(),
                iterations: 10,
            }],
            opcode,
            complexity: TestKind::Instruction.complexity(),
            duration: None,
            predicted_coverage_increase: None,
        }
    }

    /// Memory test exercising a single access pattern
    pub fn memory(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        TestSpec::Memory {
            memory_accesses: vec![MemoryAccess {
                pattern: pattern.clone(),
                size: 1024,
            }],
            pattern,
            complexity: TestKind::Memory.complexity(),
            duration: None,
            predicted_coverage_increase: None,
        }
    }

    /// Tensor test exercising a single tensor operation
    pub fn tensor(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        TestSpec::Tensor {
            tensor_ops: vec![TensorOp {
                operation: operation.clone(),
                dimensions: vec![16, 16],
            }],
            operation,
            complexity: TestKind::Tensor.complexity(),
            duration: None,
            predicted_coverage_increase: None,
        }
    }

    /// Edge-case test exercising a single boundary condition
    pub fn edge_case(case: impl Into<String>) -> Self {
        let case = case.into();
        TestSpec::EdgeCase {
            operations: vec![EdgeOperation { case: case.clone() }],
            case,
            complexity: TestKind::EdgeCase.complexity(),
            duration: None,
            predicted_coverage_increase: None,
        }
    }

    /// Build the gap-filling test for a domain's test type. The target is
    /// the final dotted segment of the uncovered point name.
    pub fn for_gap(kind: TestKind, point: &str) -> Self {
        let target = point.rsplit('.').next().unwrap_or(point);
        match kind {
            TestKind::Instruction => TestSpec::instruction(target),
            TestKind::Memory => TestSpec::memory(target),
            TestKind::Tensor => TestSpec::tensor(target),
            TestKind::EdgeCase => TestSpec::edge_case(target),
        }
    }

    pub fn kind(&self) -> TestKind {
        match self {
            TestSpec::Instruction { .. } => TestKind::Instruction,
            TestSpec::Memory { .. } => TestKind::Memory,
            TestSpec::Tensor { .. } => TestKind::Tensor,
            TestSpec::EdgeCase { .. } => TestKind::EdgeCase,
        }
    }

    /// Serialized type tag (`instruction_test`, ...)
    pub fn type_tag(&self) -> &'static str {
        self.kind().type_tag()
    }

    /// The target identifier: opcode, pattern, operation or case
    pub fn target(&self) -> &str {
        match self {
            TestSpec::Instruction { opcode, .. } => opcode,
            TestSpec::Memory { pattern, .. } => pattern,
            TestSpec::Tensor { operation, .. } => operation,
            TestSpec::EdgeCase { case, .. } => case,
        }
    }

    pub fn complexity(&self) -> u32 {
        match self {
            TestSpec::Instruction { complexity, .. }
            | TestSpec::Memory { complexity, .. }
            | TestSpec::Tensor { complexity, .. }
            | TestSpec::EdgeCase { complexity, .. } => *complexity,
        }
    }

    pub fn duration(&self) -> Option<f64> {
        match self {
            TestSpec::Instruction { duration, .. }
            | TestSpec::Memory { duration, .. }
            | TestSpec::Tensor { duration, .. }
            | TestSpec::EdgeCase { duration, .. } => *duration,
        }
    }

    /// Number of instruction operations in the test body
    pub fn operation_count(&self) -> usize {
        match self {
            TestSpec::Instruction { operations, .. } => operations.len(),
            TestSpec::EdgeCase { operations, .. } => operations.len(),
            _ => 0,
        }
    }

    /// Number of memory accesses in the test body
    pub fn memory_access_count(&self) -> usize {
        match self {
            TestSpec::Memory {
                memory_accesses, ..
            } => memory_accesses.len(),
            _ => 0,
        }
    }

    /// Number of tensor operations in the test body
    pub fn tensor_op_count(&self) -> usize {
        match self {
            TestSpec::Tensor { tensor_ops, .. } => tensor_ops.len(),
            _ => 0,
        }
    }

    pub fn predicted_increase(&self) -> Option<f64> {
        match self {
            TestSpec::Instruction {
                predicted_coverage_increase,
                ..
            }
            | TestSpec::Memory {
                predicted_coverage_increase,
                ..
            }
            | TestSpec::Tensor {
                predicted_coverage_increase,
                ..
            }
            | TestSpec::EdgeCase {
                predicted_coverage_increase,
                ..
            } => *predicted_coverage_increase,
        }
    }

    /// Annotate the spec with the score the model predicted for it
    pub fn set_predicted_increase(&mut self, value: f64) {
        match self {
            TestSpec::Instruction {
                predicted_coverage_increase,
                ..
            }
            | TestSpec::Memory {
                predicted_coverage_increase,
                ..
            }
            | TestSpec::Tensor {
                predicted_coverage_increase,
                ..
            }
            | TestSpec::EdgeCase {
                predicted_coverage_increase,
                ..
            } => *predicted_coverage_increase = Some(value),
        }
    }
}

/// One executed test paired with the coverage delta it produced.
/// Immutable once appended to the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub test: TestSpec,
    /// Coverage point name -> increase amount
    pub coverage_increase: IndexMap<String, f64>,
}

impl TestRecord {
    pub fn new(test: TestSpec, coverage_increase: IndexMap<String, f64>) -> Self {
        Self {
            test,
            coverage_increase,
        }
    }

    /// Sum of all increase amounts in this record
    pub fn total_increase(&self) -> f64 {
        self.coverage_increase.values().sum()
    }
}

/// Append-only ordered log of executed tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestHistory {
    records: Vec<TestRecord>,
}

impl TestHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record. Records are never removed or reordered.
    pub fn push(&mut self, record: TestRecord) {
        self.records.push(record);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestRecord> {
        self.records.iter()
    }

    /// Load a history file. The file holds a JSON array of records.
    pub fn load(path: &Path) -> CoverageResult<Self> {
        let text = std::fs::read_to_string(path).map_err(CoverageError::Io)?;
        let history: TestHistory = serde_json::from_str(&text)?;
        info!("loaded test history with {} entries", history.len());
        Ok(history)
    }

    /// Load a history file, substituting an empty history when the file is
    /// missing or malformed.
    pub fn load_or_empty(path: &Path) -> Self {
        if !path.exists() {
            return Self::new();
        }
        match Self::load(path) {
            Ok(history) => history,
            Err(err) => {
                warn!("error loading test history from {}: {err}", path.display());
                Self::new()
            }
        }
    }

    /// Save the history as a pretty-printed JSON array
    pub fn save(&self, path: &Path) -> CoverageResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(CoverageError::Io)?;
        info!("saved test history with {} entries", self.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_constructors_fill_descriptors() {
        let spec = TestSpec::for_gap(TestKind::Instruction, "instruction.alu.ADD");
        assert_eq!(spec.target(), "ADD");
        assert_eq!(spec.complexity(), 1);
        assert_eq!(spec.operation_count(), 1);
        assert_eq!(spec.memory_access_count(), 0);

        let spec = TestSpec::for_gap(TestKind::Tensor, "tensor.MATMUL");
        assert_eq!(spec.target(), "MATMUL");
        assert_eq!(spec.complexity(), 3);
        assert_eq!(spec.tensor_op_count(), 1);
    }

    #[test]
    fn test_spec_serialization_tags() {
        let spec = TestSpec::memory("strided");
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"type\":\"memory_test\""));
        assert!(json.contains("\"pattern\":\"strided\""));
        // Unset annotations are omitted entirely
        assert!(!json.contains("predicted_coverage_increase"));
    }

    #[test]
    fn test_spec_deserializes_with_missing_optionals() {
        let json = r#"{"type": "instruction_test", "opcode": "XOR"}"#;
        let spec: TestSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.kind(), TestKind::Instruction);
        assert_eq!(spec.target(), "XOR");
        assert_eq!(spec.complexity(), 0);
        assert_eq!(spec.operation_count(), 0);
        assert_eq!(spec.duration(), None);
    }

    #[test]
    fn test_history_is_append_only_and_ordered() {
        let mut history = TestHistory::new();
        assert!(history.is_empty());

        for opcode in ["ADD", "SUB", "MUL"] {
            let mut increase = IndexMap::new();
            increase.insert(format!("instruction.{opcode}"), 1.0);
            history.push(TestRecord::new(TestSpec::instruction(opcode), increase));
        }

        assert_eq!(history.len(), 3);
        let targets: Vec<&str> = history.iter().map(|r| r.test.target()).collect();
        assert_eq!(targets, vec!["ADD", "SUB", "MUL"]);
    }

    #[test]
    fn test_history_load_or_empty_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope_history.json");
        assert!(TestHistory::load_or_empty(&missing).is_empty());

        let malformed = dir.path().join("bad_history.json");
        std::fs::write(&malformed, "{not json").unwrap();
        assert!(TestHistory::load_or_empty(&malformed).is_empty());
    }
}
