//! Per-state drcov report writer.
//!
//! The drcov format is based off that used by the Lighthouse plugin for
//! IDA Pro (https://github.com/gaasedelen/lighthouse). One file is written
//! per state, and each file tracks a single module, so the module table
//! has exactly one row with id 0.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::event::EventLog;
use crate::layout::ProjectLayout;
use crate::model::{BasicBlock, CoverageResult};

use super::{ReportError, ReportResult};

const DRCOV_HEADER: &str = "DRCOV VERSION: 2\n\
                            DRCOV FLAVOR: S2E\n\
                            Module Table: version 2, count 1\n\
                            Columns: id, base, end, entry, checksum, timestamp, path\n";

/// Size of one packed basic block record: u32 offset, u16 size, u16
/// module id, all little-endian.
///
/// Mirrors the C structure used by drcov:
///
/// ```c
/// typedef struct _bb_entry_t {
///     uint start;   /* offset of bb start from the image base. */
///     ushort size;
///     ushort mod_id;
/// } bb_entry_t;
/// ```
const BB_RECORD_SIZE: usize = 8;

/// Write the basic block coverage information to multiple drcov files,
/// one per state, under `<results>/drcov/`.
///
/// The output directory must not exist yet; a previously generated report
/// is never overwritten or merged into. Creating the directory doubles as
/// the collision check, so two concurrent invocations cannot corrupt each
/// other.
///
/// Returns the path to the directory storing the drcov files.
pub fn write_drcov_reports(
    layout: &ProjectLayout,
    module_path: &Path,
    base_addr: u64,
    end_addr: u64,
    coverage: &CoverageResult,
    log: &dyn EventLog,
) -> ReportResult<PathBuf> {
    let drcov_dir = layout.drcov_dir();
    fs::create_dir(&drcov_dir).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => ReportError::AlreadyExists(drcov_dir.clone()),
        _ => ReportError::Io(e),
    })?;

    let module_name = module_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| module_path.display().to_string());

    for state in coverage.states() {
        let Some(blocks) = coverage.blocks_for(state) else { continue };
        let drcov_path = layout.drcov_path(&module_name, state);

        log.info(&format!("Saving drcov coverage for state {state} to {}", drcov_path.display()));

        let mut blocks: Vec<&BasicBlock> = blocks.iter().collect();
        blocks.sort();

        let mut body =
            Vec::with_capacity(DRCOV_HEADER.len() + blocks.len() * BB_RECORD_SIZE + 128);
        body.extend_from_slice(DRCOV_HEADER.as_bytes());

        // Single module row: id, base, end, entry, checksum, timestamp,
        // path. Entry, checksum and timestamp are fixed at zero.
        body.extend_from_slice(
            format!(
                "{:3}, {:#016x}, {:#016x}, {:#016x}, {:#08x}, {:#08x}, {}\n",
                0,
                base_addr,
                end_addr,
                0,
                0,
                0,
                module_path.display()
            )
            .as_bytes(),
        );

        body.extend_from_slice(format!("BB Table: {} bbs\n", blocks.len()).as_bytes());

        // Packed records: offset from the image base, block size, module
        // id (always 0 since only one module is tracked per report).
        for bb in blocks {
            let offset = (bb.start_addr() - base_addr) as u32;
            let size = (bb.end_addr() - bb.start_addr()) as u16;
            body.extend_from_slice(&offset.to_le_bytes());
            body.extend_from_slice(&size.to_le_bytes());
            body.extend_from_slice(&0u16.to_le_bytes());
        }

        fs::write(&drcov_path, body)?;
    }

    Ok(drcov_dir)
}
