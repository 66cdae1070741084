//! Basic block coverage engine.
//!
//! Matches dynamically recorded translation block intervals against the
//! static, address-sorted basic block list and accumulates the covered
//! blocks per state.

use crate::event::EventLog;
use crate::model::{BasicBlock, CoverageResult, StateIntervals};

/// Find the index at which the scan for `tb_start_addr` should begin.
///
/// The block list is sorted ascending by start address. Intervals rarely
/// start exactly on a block boundary, so an equality search is not enough:
/// when no block starts at `tb_start_addr`, the insertion point is
/// returned so the caller still scans the blocks the interval may reach
/// into. `bbs.len()` means no block can overlap the interval.
fn locate_start(tb_start_addr: u64, bbs: &[BasicBlock]) -> usize {
    let num_bbs = bbs.len();
    if num_bbs == 0 {
        return 0;
    }

    if tb_start_addr <= bbs[0].end_addr() {
        return 0;
    }
    if tb_start_addr > bbs[num_bbs - 1].end_addr() {
        return num_bbs;
    }

    bbs.partition_point(|bb| bb.start_addr() < tb_start_addr)
}

/// Calculate the basic block coverage for each state.
///
/// `bbs` must be sorted ascending by start address; [`DisassemblyInfo`]
/// guarantees this at construction time, so callers that obtained the
/// blocks from a disassembly result can pass them straight through.
///
/// A block is covered when an interval's start or end address falls
/// inside it; the rest of the interval may extend past the block on
/// either side. States whose intervals match nothing get no entry.
///
/// [`DisassemblyInfo`]: crate::model::DisassemblyInfo
pub fn compute_coverage(
    tb_coverage: &StateIntervals,
    bbs: &[BasicBlock],
    log: &dyn EventLog,
) -> CoverageResult {
    let mut covered = CoverageResult::new();
    let num_bbs = bbs.len();

    for (&state, intervals) in tb_coverage {
        log.info(&format!("Calculating basic block coverage for state {state}"));

        for interval in intervals {
            let start_idx = locate_start(interval.start_addr, bbs);
            for bb in &bbs[start_idx..num_bbs] {
                // The translation block falls within the basic block OR
                // the basic block falls within the translation block.
                if (bb.end_addr() >= interval.start_addr && interval.start_addr >= bb.start_addr())
                    || (bb.start_addr() <= interval.end_addr && interval.end_addr <= bb.end_addr())
                {
                    covered.insert(state, bb.clone());
                }

                // Blocks past the interval's end can never match.
                if bb.start_addr() > interval.end_addr {
                    break;
                }
            }
        }
    }

    covered
}
