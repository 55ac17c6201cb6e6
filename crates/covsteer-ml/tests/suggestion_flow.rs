//! End-to-end flow: load coverage data, record tests, train, suggest

use covsteer_coverage::{artifact_path, DomainConfig, TestSpec};
use covsteer_ml::TestOptimizer;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

fn write_snapshot(path: &std::path::Path) {
    std::fs::write(
        path,
        r#"{
  "instruction.ADD": 1,
  "instruction.SUB": 0,
  "instruction.XOR": 0,
  "memory.sequential": true,
  "memory.strided": false,
  "tensor.MATMUL": 0,
  "edge_case.overflow": 0
}"#,
    )
    .unwrap();
}

#[test]
fn full_cycle_train_and_suggest() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("gpu_coverage.json");
    write_snapshot(&snapshot);

    let config = Arc::new(DomainConfig::default());
    let mut optimizer = TestOptimizer::open(&snapshot, config.clone());

    assert_eq!(optimizer.store().len(), 7);
    let summary = optimizer.coverage_summary();
    assert!((summary.overall - 2.0 / 7.0 * 100.0).abs() < 1e-9);

    let gaps = optimizer.identify_gaps();
    assert_eq!(gaps["instruction"].len(), 2);
    assert_eq!(gaps["memory"].len(), 1);

    // Too little history: training fails, optimizer keeps working
    assert!(optimizer.train().is_err());

    for i in 0..12 {
        let opcode = format!("OP{i}");
        let mut increase = IndexMap::new();
        increase.insert(format!("instruction.{opcode}"), 1.0);
        optimizer.add_test_result(TestSpec::instruction(&opcode), increase);
    }
    optimizer.train().unwrap();
    assert!(optimizer.model().is_trained());
    assert!(artifact_path(&snapshot, "model").exists());
    assert!(artifact_path(&snapshot, "scaler").exists());

    // Suggestion stays available: gap-targeted candidates come first and
    // the fallback keeps the suggestion deterministic even when the model
    // rejects every candidate
    let mut rng = StdRng::seed_from_u64(11);
    let suggestion = optimizer.suggest_next(&mut rng).unwrap();
    assert_eq!(suggestion.target(), "SUB");

    optimizer.save().unwrap();
    assert!(artifact_path(&snapshot, "history").exists());

    // Reopening restores history and the trained model from disk
    let reopened = TestOptimizer::open(&snapshot, config);
    assert_eq!(reopened.history().len(), 12);
    assert!(reopened.model().is_trained());

    let trend = reopened.analyze_trend().unwrap();
    assert_eq!(trend.len(), 12);

    let report = reopened.analyze_effectiveness().unwrap();
    assert_eq!(report.len(), 12);
    assert!(report.iter().all(|t| t.new_points == 1));
}
