//! Aggregate JSON coverage report.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use crate::event::EventLog;
use crate::layout::ProjectLayout;
use crate::model::{BasicBlock, CoverageResult};

use super::ReportResult;

#[derive(Debug, Serialize)]
struct ReportStats {
    total_basic_blocks: usize,
    covered_basic_blocks: usize,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    stats: ReportStats,
    coverage: Vec<&'a BasicBlock>,
}

/// Write the basic block coverage information to a single JSON file
/// holding the aggregate across **all** states.
///
/// The `coverage` array is the flattened concatenation of every state's
/// covered set; per-state separation is not preserved in this format, so a
/// block covered by two states appears twice. Addresses are emitted as
/// JSON integers. States and blocks are emitted in sorted order so the
/// output is deterministic.
///
/// Returns the path of the JSON file.
pub fn write_json_report(
    layout: &ProjectLayout,
    module_name: &str,
    coverage: &CoverageResult,
    total_bbs: usize,
    covered_bbs: usize,
    log: &dyn EventLog,
) -> ReportResult<PathBuf> {
    let report_path = layout.json_report_path(module_name);

    log.info(&format!("Saving basic block coverage to {}", report_path.display()));

    let mut flattened: Vec<&BasicBlock> = Vec::new();
    for state in coverage.states() {
        if let Some(blocks) = coverage.blocks_for(state) {
            let mut blocks: Vec<&BasicBlock> = blocks.iter().collect();
            blocks.sort();
            flattened.extend(blocks);
        }
    }

    let report = JsonReport {
        stats: ReportStats {
            total_basic_blocks: total_bbs,
            covered_basic_blocks: covered_bbs,
        },
        coverage: flattened,
    };

    fs::write(&report_path, serde_json::to_string(&report)?)?;

    Ok(report_path)
}
