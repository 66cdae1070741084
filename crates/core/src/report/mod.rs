//! Coverage report writers.
//!
//! Two independent serializers consume a [`CoverageResult`]:
//! - [`json::write_json_report`]: one aggregate JSON file per module.
//! - [`drcov::write_drcov_reports`]: one drcov file per state, compatible
//!   with third-party coverage viewers such as Lighthouse.
//!
//! [`CoverageResult`]: crate::model::CoverageResult

use std::path::PathBuf;

use thiserror::Error;

pub mod drcov;
pub mod json;

pub use drcov::write_drcov_reports;
pub use json::write_json_report;

/// Error type for report serialization.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The drcov output directory already exists; reports for this target
    /// were generated previously and nothing is overwritten.
    #[error("drcov directory {0} already exists")]
    AlreadyExists(PathBuf),

    #[error("I/O error writing report: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize report JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;
