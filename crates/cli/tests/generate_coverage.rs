use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

/// Project root populated with a module, fake radare2 JSON output, and an
/// aggregated trace file. The fake env hooks let the radare2 backend run
/// without radare2 installed.
fn setup_project() -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("mod.so"), b"bin").unwrap();
    fs::write(root.path().join("ij.json"), r#"{"core":{"size":4096},"bin":{"baddr":4194304}}"#)
        .unwrap();
    fs::write(
        root.path().join("aflj.json"),
        r#"[{"offset":4194304,"name":"main","size":32},{"offset":4194368,"name":"helper","size":16}]"#,
    )
    .unwrap();
    fs::write(
        root.path().join("agfj.json"),
        r#"[{"name":"main","blocks":[{"offset":4194304,"size":16},{"offset":4194320,"size":16}]},{"name":"helper","blocks":[{"offset":4194368,"size":16}]}]"#,
    )
    .unwrap();
    // State 0 starts inside main's first block; state 1 starts inside
    // helper's only block.
    fs::write(
        root.path().join("trace.json"),
        r#"{"mod.so":{"0":[[4194304,4194312,8]],"1":[[4194368,4194372,4]]}}"#,
    )
    .unwrap();
    root
}

fn blockcov(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("blockcov").expect("binary");
    cmd.env("BC_R2_FAKE_INFO", root.join("ij.json"))
        .env("BC_R2_FAKE_FUNCTIONS", root.join("aflj.json"))
        .env("BC_R2_FAKE_GRAPH", root.join("agfj.json"))
        .env("BC_R2_FAKE_VERSION", "radare2 5.0-fake");
    cmd
}

#[test]
fn generate_writes_json_report_and_disas_cache() {
    let root = setup_project();

    blockcov(root.path())
        .args(["generate", "--trace", "trace.json", "--backend", "radare2", "--root"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Basic block coverage saved to")
                .and(predicate::str::contains("Total basic blocks: 3"))
                .and(predicate::str::contains("Covered basic blocks: 2 (66.7%)")),
        );

    let report_path = root.path().join("s2e-last").join("mod.so_coverage.json");
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).expect("report file"))
            .expect("report json");
    assert_eq!(report["stats"]["total_basic_blocks"], 3);
    assert_eq!(report["stats"]["covered_basic_blocks"], 2);
    assert_eq!(report["coverage"].as_array().expect("coverage").len(), 2);

    assert!(root.path().join("mod.so.disas").is_file());
}

#[test]
fn generate_drcov_writes_per_state_files_and_refuses_rerun() {
    let root = setup_project();

    blockcov(root.path())
        .args(["generate", "--trace", "trace.json", "--backend", "radare2", "--drcov", "--root"])
        .arg(root.path())
        .assert()
        .success();

    let drcov_dir = root.path().join("s2e-last").join("drcov");
    assert!(drcov_dir.join("mod.so_coverage_0.drcov").is_file());
    assert!(drcov_dir.join("mod.so_coverage_1.drcov").is_file());

    blockcov(root.path())
        .args(["generate", "--trace", "trace.json", "--backend", "radare2", "--drcov", "--root"])
        .arg(root.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already generated"));
}

#[test]
fn config_file_supplies_the_default_backend() {
    let root = setup_project();
    fs::write(root.path().join("blockcov.yaml"), "default_backend: radare2\n").unwrap();

    blockcov(root.path())
        .args(["generate", "--trace", "trace.json", "--root"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Covered basic blocks: 2"));
}
