use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn backends_lists_compiled_backends() {
    let mut cmd = Command::cargo_bin("blockcov").expect("binary");
    cmd.arg("backends")
        .assert()
        .success()
        .stdout(predicate::str::contains("capstone").and(predicate::str::contains("radare2")));
}

#[test]
fn backends_json_output_is_parseable() {
    let output = Command::cargo_bin("blockcov")
        .expect("binary")
        .args(["backends", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json stdout");
    let entries = entries.as_array().expect("array");
    assert!(entries.iter().any(|e| e["name"] == "capstone"));
    assert!(entries.iter().all(|e| e["description"].is_string()));
}
