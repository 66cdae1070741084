//! Core data model for basic block coverage.
//!
//! This module contains:
//! - `BasicBlock`: the static basic block value type
//! - `ExecutionInterval`: one dynamically recorded translation block
//! - `DisassemblyInfo`: sorted block list plus module bounds
//! - `CoverageResult`: per-state sets of covered blocks

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier for one independent execution trace (e.g., one symbolic
/// execution path).
pub type StateId = u32;

/// Execution intervals recorded for each state of one module.
pub type StateIntervals = HashMap<StateId, Vec<ExecutionInterval>>;

/// Per-module execution intervals, keyed by the module path as recorded
/// in the trace data.
pub type ModuleIntervals = HashMap<String, StateIntervals>;

/// Immutable basic block representation.
///
/// Equality and hashing are structural over all three fields; the derived
/// order compares `start_addr` first, which is the key the coverage engine
/// searches on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BasicBlock {
    start_addr: u64,
    end_addr: u64,
    function: String,
}

impl BasicBlock {
    /// Create a basic block covering `[start_addr, end_addr]` owned by
    /// `function` (may be empty for symbol-less blocks).
    ///
    /// Callers must not pass `end_addr < start_addr`; the constructor does
    /// not check.
    pub fn new(start_addr: u64, end_addr: u64, function: impl Into<String>) -> Self {
        Self { start_addr, end_addr, function: function.into() }
    }

    pub fn start_addr(&self) -> u64 {
        self.start_addr
    }

    pub fn end_addr(&self) -> u64 {
        self.end_addr
    }

    pub fn function(&self) -> &str {
        &self.function
    }
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BB(start=0x{:x}, end=0x{:x}, function={})",
            self.start_addr, self.end_addr, self.function
        )
    }
}

/// One executed translation block within one state.
///
/// Trace data may carry extra per-interval metadata (e.g., a size field);
/// adapters discard it before constructing intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionInterval {
    pub start_addr: u64,
    pub end_addr: u64,
}

impl ExecutionInterval {
    pub fn new(start_addr: u64, end_addr: u64) -> Self {
        Self { start_addr, end_addr }
    }
}

impl From<(u64, u64)> for ExecutionInterval {
    fn from((start_addr, end_addr): (u64, u64)) -> Self {
        Self { start_addr, end_addr }
    }
}

/// Static disassembly result for one module: basic blocks plus module
/// bounds.
///
/// This is also the on-disk schema of the `.disas` cache artifact, so the
/// field names are part of the compatibility contract.
///
/// The block list is sorted ascending by start address on every
/// construction path; the coverage engine relies on that invariant and
/// never re-checks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisassemblyInfo {
    bbs: Vec<BasicBlock>,
    base_addr: u64,
    end_addr: u64,
}

impl DisassemblyInfo {
    /// Assemble a disassembly result, sorting the blocks by start address.
    pub fn new(mut bbs: Vec<BasicBlock>, base_addr: u64, end_addr: u64) -> Self {
        bbs.sort();
        Self { bbs, base_addr, end_addr }
    }

    /// Blocks sorted ascending by start address.
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.bbs
    }

    pub fn base_addr(&self) -> u64 {
        self.base_addr
    }

    pub fn end_addr(&self) -> u64 {
        self.end_addr
    }

    /// Re-establish the sort invariant after deserialization.
    pub(crate) fn into_sorted(self) -> Self {
        Self::new(self.bbs, self.base_addr, self.end_addr)
    }
}

/// Basic blocks covered per state.
///
/// Only states with at least one covered block have an entry; a state
/// whose intervals matched nothing is absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageResult {
    per_state: HashMap<StateId, HashSet<BasicBlock>>,
}

impl CoverageResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `block` as covered by `state`. Re-inserting an already covered
    /// block is a no-op.
    pub fn insert(&mut self, state: StateId, block: BasicBlock) {
        self.per_state.entry(state).or_default().insert(block);
    }

    pub fn is_empty(&self) -> bool {
        self.per_state.is_empty()
    }

    /// State ids in ascending order, for deterministic report output.
    pub fn states(&self) -> Vec<StateId> {
        let mut states: Vec<StateId> = self.per_state.keys().copied().collect();
        states.sort_unstable();
        states
    }

    pub fn blocks_for(&self, state: StateId) -> Option<&HashSet<BasicBlock>> {
        self.per_state.get(&state)
    }

    /// Number of distinct blocks covered across all states.
    pub fn unique_covered(&self) -> usize {
        let mut all: HashSet<&BasicBlock> = HashSet::new();
        for blocks in self.per_state.values() {
            all.extend(blocks.iter());
        }
        all.len()
    }
}
