//! Disassembly cache.
//!
//! Disassembling a large binary can take a long time, so the sorted basic
//! block list and module bounds are persisted to a `.disas` artifact (a
//! JSON dump of [`DisassemblyInfo`]) next to the project metadata and
//! reused on later runs.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::event::EventLog;
use crate::model::DisassemblyInfo;

/// Error type for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed .disas artifact at {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Load the cached disassembly information for `module_path`, if a usable
/// artifact exists at `disas_path`.
///
/// Returns `None` when no artifact exists, or when the module file has
/// been modified more recently than the artifact (the artifact is then
/// stale and a fresh disassembly is required).
pub fn load(
    disas_path: &Path,
    module_path: &Path,
    log: &dyn EventLog,
) -> CacheResult<Option<DisassemblyInfo>> {
    log.info("Checking for existing .disas file");

    if !disas_path.is_file() {
        log.info("No .disas file found");
        return Ok(None);
    }

    let disas_mtime = modified(disas_path)?;
    let target_mtime = modified(module_path)?;

    if disas_mtime < target_mtime {
        log.info(&format!(
            "{} is out of date. A new .disas file will be generated",
            disas_path.display()
        ));
        return Ok(None);
    }

    log.info(&format!("{} found. Returning cached basic blocks", disas_path.display()));

    let body = fs::read_to_string(disas_path).map_err(|source| CacheError::Io {
        path: disas_path.display().to_string(),
        source,
    })?;
    let info: DisassemblyInfo =
        serde_json::from_str(&body).map_err(|source| CacheError::Malformed {
            path: disas_path.display().to_string(),
            source,
        })?;

    Ok(Some(info.into_sorted()))
}

/// Save disassembly information to a `.disas` artifact at `disas_path`.
pub fn store(disas_path: &Path, info: &DisassemblyInfo, log: &dyn EventLog) -> CacheResult<()> {
    log.info(&format!("Saving disassembly information to {}", disas_path.display()));

    let body = serde_json::to_string(info).map_err(|source| CacheError::Malformed {
        path: disas_path.display().to_string(),
        source,
    })?;
    fs::write(disas_path, body).map_err(|source| CacheError::Io {
        path: disas_path.display().to_string(),
        source,
    })
}

fn modified(path: &Path) -> CacheResult<std::time::SystemTime> {
    let meta = fs::metadata(path).map_err(|source| CacheError::Io {
        path: path.display().to_string(),
        source,
    })?;
    meta.modified().map_err(|source| CacheError::Io { path: path.display().to_string(), source })
}
