//! Shared wiring for the CLI commands: project config, trace input, and
//! backend selection.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use blockcov_core::disas::{BackendRegistry, DisassemblyBackend};
use blockcov_core::model::{ExecutionInterval, ModuleIntervals, StateIntervals};
use blockcov_core::trace::{TraceError, TraceSource};

/// Backend used when neither the command line nor the config names one.
pub const DEFAULT_BACKEND_NAME: &str = "capstone";

/// Name of the optional project config file under the project root.
pub const CONFIG_FILE_NAME: &str = "blockcov.yaml";

/// Serializable project configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ProjectConfig {
    /// Disassembler backend to use when the command line does not name
    /// one.
    #[serde(default)]
    pub default_backend: Option<String>,
    /// Directories searched when resolving module paths recorded in
    /// traces.
    #[serde(default)]
    pub search_paths: Vec<String>,
    /// Directory coverage reports are written into, relative to the
    /// project root unless absolute.
    #[serde(default)]
    pub results_dir: Option<String>,
}

/// Load the project config from an explicit path, from
/// `<root>/blockcov.yaml` if present, or fall back to the defaults.
pub fn load_config(root: &Path, explicit: Option<&str>) -> Result<ProjectConfig> {
    let path = match explicit {
        Some(p) => PathBuf::from(p),
        None => {
            let default = root.join(CONFIG_FILE_NAME);
            if !default.is_file() {
                return Ok(ProjectConfig::default());
            }
            default
        }
    };

    let body = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    serde_yaml::from_str(&body).context("Failed to parse config YAML")
}

/// Select the backend by precedence: CLI override > config > default.
pub fn select_backend<'r>(
    registry: &'r BackendRegistry,
    cli_override: Option<&str>,
    config: &ProjectConfig,
) -> Result<&'r dyn DisassemblyBackend> {
    let name = cli_override
        .map(|s| s.to_string())
        .or_else(|| config.default_backend.clone())
        .unwrap_or_else(|| DEFAULT_BACKEND_NAME.to_string());

    registry.get(&name).ok_or_else(|| {
        anyhow!("Unknown backend '{}' (available: {})", name, registry.names().join(", "))
    })
}

/// Trace source reading one aggregated JSON file of the shape
/// `{module: {state: [[start_addr, end_addr, size], ...]}}`.
///
/// The per-interval size element is recorded by the tracer but not used
/// here; entries may also be plain `[start_addr, end_addr]` pairs.
pub struct JsonTraceSource {
    path: PathBuf,
}

impl JsonTraceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInterval {
    Triple(u64, u64, u64),
    Pair(u64, u64),
}

impl From<RawInterval> for ExecutionInterval {
    fn from(raw: RawInterval) -> Self {
        match raw {
            RawInterval::Triple(start, end, _size) => ExecutionInterval::new(start, end),
            RawInterval::Pair(start, end) => ExecutionInterval::new(start, end),
        }
    }
}

impl TraceSource for JsonTraceSource {
    fn execution_intervals(&self) -> Result<ModuleIntervals, TraceError> {
        let body = fs::read_to_string(&self.path)?;
        let raw: HashMap<String, HashMap<String, Vec<RawInterval>>> =
            serde_json::from_str(&body)?;

        let mut modules = ModuleIntervals::new();
        for (module, states) in raw {
            let mut intervals = StateIntervals::new();
            for (state_key, entries) in states {
                let state = state_key
                    .parse()
                    .map_err(|_| TraceError::BadStateId(state_key.clone()))?;
                intervals.insert(state, entries.into_iter().map(Into::into).collect());
            }
            modules.insert(module, intervals);
        }
        Ok(modules)
    }
}
