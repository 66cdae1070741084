use std::path::Path;

use blockcov::{canonicalize_or_current, resolve_against_root};

#[test]
fn canonicalize_or_current_passes_existing_paths_through() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let result = canonicalize_or_current(tmp.path().to_str().expect("utf8 path"))
        .expect("canonicalize");
    assert_eq!(result, tmp.path().canonicalize().expect("canon tmp"));
}

#[test]
fn canonicalize_or_current_joins_missing_paths_with_cwd() {
    let result = canonicalize_or_current("does/not/exist/yet").expect("canonicalize");
    assert!(result.is_absolute());
    assert!(result.ends_with("does/not/exist/yet"));
}

#[test]
fn resolve_against_root_keeps_absolute_paths() {
    let root = Path::new("/project");
    assert_eq!(resolve_against_root(root, "/opt/mod.so"), Path::new("/opt/mod.so"));
}

#[test]
fn resolve_against_root_joins_relative_paths() {
    let root = Path::new("/project");
    assert_eq!(resolve_against_root(root, "traces/trace.json"),
        Path::new("/project/traces/trace.json"));
}
