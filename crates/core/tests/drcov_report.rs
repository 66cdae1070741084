use std::fs;
use std::path::Path;

use blockcov_core::event::NullLog;
use blockcov_core::layout::ProjectLayout;
use blockcov_core::model::{BasicBlock, CoverageResult};
use blockcov_core::report::{write_drcov_reports, ReportError};

fn layout(temp: &tempfile::TempDir) -> ProjectLayout {
    let layout = ProjectLayout::new(temp.path());
    fs::create_dir_all(&layout.results_dir).unwrap();
    layout
}

fn two_block_coverage() -> CoverageResult {
    let mut coverage = CoverageResult::new();
    coverage.insert(0, BasicBlock::new(0x1000, 0x1010, "f"));
    coverage.insert(0, BasicBlock::new(0x1020, 0x1030, "f"));
    coverage
}

#[test]
fn two_block_report_is_bit_exact() {
    let temp = tempfile::tempdir().unwrap();
    let layout = layout(&temp);

    let dir = write_drcov_reports(
        &layout,
        Path::new("/opt/target/mod.so"),
        0x1000,
        0x2000,
        &two_block_coverage(),
        &NullLog,
    )
    .expect("write");
    assert_eq!(dir, layout.drcov_dir());

    let body = fs::read(dir.join("mod.so_coverage_0.drcov")).expect("state 0 file");
    let text_len = body.len() - 16;
    let text = std::str::from_utf8(&body[..text_len]).expect("ascii prologue");

    assert_eq!(
        text,
        "DRCOV VERSION: 2\n\
         DRCOV FLAVOR: S2E\n\
         Module Table: version 2, count 1\n\
         Columns: id, base, end, entry, checksum, timestamp, path\n\
         \x20\x200, 0x00000000001000, 0x00000000002000, 0x00000000000000, 0x000000, 0x000000, /opt/target/mod.so\n\
         BB Table: 2 bbs\n"
    );

    // Two packed records: u32 LE offset from base, u16 LE size, u16 LE
    // module id.
    assert_eq!(
        &body[text_len..],
        &[
            0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, //
            0x20, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00,
        ]
    );
}

#[test]
fn one_file_is_written_per_state() {
    let temp = tempfile::tempdir().unwrap();
    let layout = layout(&temp);

    let mut coverage = CoverageResult::new();
    coverage.insert(0, BasicBlock::new(0x1000, 0x100f, "f"));
    coverage.insert(3, BasicBlock::new(0x1010, 0x101f, "f"));

    let dir = write_drcov_reports(
        &layout,
        Path::new("/opt/target/mod.so"),
        0x1000,
        0x2000,
        &coverage,
        &NullLog,
    )
    .expect("write");

    assert!(dir.join("mod.so_coverage_0.drcov").is_file());
    assert!(dir.join("mod.so_coverage_3.drcov").is_file());
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 2);
}

#[test]
fn existing_directory_fails_and_preserves_first_run() {
    let temp = tempfile::tempdir().unwrap();
    let layout = layout(&temp);
    let module = Path::new("/opt/target/mod.so");

    let dir =
        write_drcov_reports(&layout, module, 0x1000, 0x2000, &two_block_coverage(), &NullLog)
            .expect("first write");
    let original = fs::read(dir.join("mod.so_coverage_0.drcov")).unwrap();

    let mut other = CoverageResult::new();
    other.insert(0, BasicBlock::new(0x1040, 0x104f, "g"));
    let err = write_drcov_reports(&layout, module, 0x1000, 0x2000, &other, &NullLog).unwrap_err();
    assert!(matches!(err, ReportError::AlreadyExists(_)));

    let after = fs::read(dir.join("mod.so_coverage_0.drcov")).unwrap();
    assert_eq!(original, after);
}

#[test]
fn record_offsets_are_relative_to_the_module_base() {
    let temp = tempfile::tempdir().unwrap();
    let layout = layout(&temp);

    let mut coverage = CoverageResult::new();
    coverage.insert(5, BasicBlock::new(0x40_1234, 0x40_1243, "f"));

    let dir = write_drcov_reports(
        &layout,
        Path::new("/opt/target/prog"),
        0x40_0000,
        0x41_0000,
        &coverage,
        &NullLog,
    )
    .expect("write");

    let body = fs::read(dir.join("prog_coverage_5.drcov")).unwrap();
    let record = &body[body.len() - 8..];
    assert_eq!(u32::from_le_bytes(record[0..4].try_into().unwrap()), 0x1234);
    assert_eq!(u16::from_le_bytes(record[4..6].try_into().unwrap()), 0x0f);
    assert_eq!(u16::from_le_bytes(record[6..8].try_into().unwrap()), 0);
}
