//! Trace source boundary.
//!
//! Discovering and parsing raw per-state trace files is outside this
//! crate; whatever does it hands the engine execution intervals grouped by
//! module and state through the [`TraceSource`] capability.

use thiserror::Error;

use crate::model::ModuleIntervals;

/// Error type for trace sources.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("I/O error reading trace data: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse trace data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("malformed state id '{0}' in trace data")]
    BadStateId(String),
}

/// Produces the per-module, per-state execution intervals recorded during
/// one run of the target program.
pub trait TraceSource {
    fn execution_intervals(&self) -> Result<ModuleIntervals, TraceError>;
}
