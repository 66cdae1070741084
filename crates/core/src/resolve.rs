//! Module path resolution.
//!
//! Trace data records module paths as seen by the analyzed guest; the
//! actual binaries live somewhere on the analysis host. A
//! [`ModuleResolver`] maps a recorded module path to a file on disk.

use std::path::{Path, PathBuf};

use crate::runner::CoverageError;

/// Maps a module path recorded in trace data to a file on disk.
pub trait ModuleResolver: Send + Sync {
    fn resolve(&self, module: &str) -> Result<PathBuf, CoverageError>;
}

/// Resolver that looks the module's file name up in an ordered list of
/// search paths. Absolute paths that already exist pass through unchanged.
#[derive(Debug, Clone)]
pub struct SearchPathResolver {
    search_paths: Vec<PathBuf>,
}

impl SearchPathResolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }
}

impl ModuleResolver for SearchPathResolver {
    fn resolve(&self, module: &str) -> Result<PathBuf, CoverageError> {
        let recorded = Path::new(module);
        if recorded.is_absolute() && recorded.is_file() {
            return Ok(recorded.to_path_buf());
        }

        let file_name = recorded
            .file_name()
            .ok_or_else(|| CoverageError::ModuleResolutionFailed { module: module.to_string() })?;
        for search_path in &self.search_paths {
            let candidate = search_path.join(file_name);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        Err(CoverageError::ModuleResolutionFailed { module: module.to_string() })
    }
}
