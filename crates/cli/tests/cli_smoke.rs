//! Binary smoke test: compile a scenario, reconstruct, inspect the output.

use assert_cmd::Command;

const SCENARIO: &str = r#"{
    "entities": {
        "net1": {"kind": "model", "name": "Net", "version": "1.0.0"},
        "net2": {"kind": "model", "name": "Net", "version": "1.1.0"},
        "numpy": {"kind": "library", "name": "numpy", "version": "1.26"}
    },
    "relationships": [
        {"type": "model_lineage", "parent": "net1", "child": "net2"},
        {"type": "depends_on", "owner": "net1", "target": "numpy"},
        {"type": "depends_on", "owner": "net2", "target": "numpy"}
    ]
}"#;

#[test]
fn compile_then_reconstruct_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = dir.path().join("scenario.json");
    std::fs::write(&scenario, SCENARIO).unwrap();
    let docs = dir.path().join("docs");

    Command::cargo_bin("bomref")
        .unwrap()
        .args(["compile", "--scenario"])
        .arg(&scenario)
        .arg("--out")
        .arg(&docs)
        .assert()
        .success();

    let written: Vec<_> = std::fs::read_dir(&docs)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".bom.json"))
        .collect();
    assert_eq!(written.len(), 2);

    let output = Command::cargo_bin("bomref")
        .unwrap()
        .args(["reconstruct", "--docs"])
        .arg(&docs)
        .output()
        .unwrap();
    assert!(output.status.success());

    let snapshot: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(snapshot["nodes"].as_object().unwrap().len(), 3);
    assert_eq!(snapshot["edges"].as_array().unwrap().len(), 3);
}

#[test]
fn unknown_context_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = dir.path().join("scenario.json");
    std::fs::write(&scenario, SCENARIO).unwrap();

    Command::cargo_bin("bomref")
        .unwrap()
        .args(["compile", "--scenario"])
        .arg(&scenario)
        .args(["--context", "no-such-pipeline"])
        .arg("--out")
        .arg(dir.path().join("docs"))
        .assert()
        .failure();
}
