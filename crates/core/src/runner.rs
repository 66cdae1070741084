//! Per-module coverage generation loop.
//!
//! [`CoverageRunner`] ties the injected capabilities together: resolve the
//! module on disk, obtain its disassembly (cache first), match the
//! recorded intervals against the basic blocks, and persist the chosen
//! report format.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::cache::{self, CacheError};
use crate::coverage::compute_coverage;
use crate::disas::{DisassemblyBackend, DisassemblyError};
use crate::event::EventLog;
use crate::layout::ProjectLayout;
use crate::model::{DisassemblyInfo, ModuleIntervals, StateIntervals};
use crate::report::{write_drcov_reports, write_json_report, ReportError};
use crate::resolve::ModuleResolver;

/// Error type for coverage generation.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// No static basic block information could be produced or loaded for
    /// the module; its report cannot be generated.
    #[error("No disassembly information found for {module}")]
    DisassemblyUnavailable {
        module: String,
        #[source]
        source: DisassemblyError,
    },

    /// The recorded intervals matched nothing, so a report would be
    /// meaningless.
    #[error("No basic block coverage information found for {module}")]
    NoCoverageData { module: String },

    /// The drcov output directory already exists from a previous run.
    #[error("Coverage report already generated at {0}")]
    ReportAlreadyExists(PathBuf),

    /// The module referenced by the trace data could not be located on
    /// disk. The generation loop logs this and continues with the next
    /// module.
    #[error("{module} could not be resolved in any search path")]
    ModuleResolutionFailed { module: String },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Failed to write coverage report: {0}")]
    Report(ReportError),
}

impl CoverageError {
    fn from_report(err: ReportError) -> Self {
        match err {
            ReportError::AlreadyExists(dir) => CoverageError::ReportAlreadyExists(dir),
            other => CoverageError::Report(other),
        }
    }
}

/// Convenience result type for coverage generation. Named to avoid
/// clashing with the model's [`CoverageResult`] data type.
///
/// [`CoverageResult`]: crate::model::CoverageResult
pub type RunnerResult<T> = Result<T, CoverageError>;

/// Outcome of one module's report generation, for frontends to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub module: String,
    /// JSON file or drcov directory the coverage was written to.
    pub location: PathBuf,
    pub total_bbs: usize,
    pub covered_bbs: usize,
}

/// Coordinator that generates coverage reports for every module in a
/// trace.
///
/// All collaborators are borrowed for the duration of one invocation;
/// the runner holds no state of its own and can be rebuilt freely.
pub struct CoverageRunner<'a> {
    pub layout: &'a ProjectLayout,
    pub backend: &'a dyn DisassemblyBackend,
    pub resolver: &'a dyn ModuleResolver,
    pub log: &'a dyn EventLog,
}

impl CoverageRunner<'_> {
    /// Generate a report for every module in `coverage`, in sorted module
    /// order.
    ///
    /// A module that cannot be resolved on disk is logged and skipped;
    /// the remaining modules are still processed. Any other failure aborts
    /// the run, since it makes the affected report meaningless.
    pub fn run(
        &self,
        coverage: &ModuleIntervals,
        drcov_format: bool,
    ) -> RunnerResult<Vec<ReportSummary>> {
        let mut modules: Vec<&String> = coverage.keys().collect();
        modules.sort();

        let mut summaries = Vec::new();
        for module in modules {
            let module_path = match self.resolver.resolve(module) {
                Ok(path) => path,
                Err(err) => {
                    self.log.error(&err.to_string());
                    continue;
                }
            };

            summaries.push(self.save_coverage(&module_path, &coverage[module], drcov_format)?);
        }

        Ok(summaries)
    }

    /// Generate the report for one resolved module.
    pub fn save_coverage(
        &self,
        module_path: &Path,
        tb_coverage: &StateIntervals,
        drcov_format: bool,
    ) -> RunnerResult<ReportSummary> {
        let module_name = module_file_name(module_path);

        let disas_info = self.disas_info(&module_name, module_path)?;
        let bbs = disas_info.blocks();

        let bb_coverage = compute_coverage(tb_coverage, bbs, self.log);
        if bb_coverage.is_empty() {
            return Err(CoverageError::NoCoverageData { module: module_name });
        }

        let total_bbs = bbs.len();
        let covered_bbs = bb_coverage.unique_covered();

        let location = if drcov_format {
            write_drcov_reports(
                self.layout,
                module_path,
                disas_info.base_addr(),
                disas_info.end_addr(),
                &bb_coverage,
                self.log,
            )
            .map_err(CoverageError::from_report)?
        } else {
            write_json_report(
                self.layout,
                &module_name,
                &bb_coverage,
                total_bbs,
                covered_bbs,
                self.log,
            )
            .map_err(CoverageError::from_report)?
        };

        self.log.info(&format!("Basic block coverage saved to {}", location.display()));

        Ok(ReportSummary { module: module_name, location, total_bbs, covered_bbs })
    }

    /// Obtain the sorted disassembly information for a module, from the
    /// cache when a fresh artifact exists, otherwise from the backend
    /// (caching the result for subsequent runs).
    pub fn disas_info(
        &self,
        module_name: &str,
        module_path: &Path,
    ) -> RunnerResult<DisassemblyInfo> {
        let disas_path = self.layout.disas_path(module_name);

        if let Some(info) = cache::load(&disas_path, module_path, self.log)? {
            return Ok(info);
        }

        let info = self.backend.disassemble(module_path).map_err(|source| {
            CoverageError::DisassemblyUnavailable { module: module_name.to_string(), source }
        })?;

        cache::store(&disas_path, &info, self.log)?;

        Ok(info)
    }
}

fn module_file_name(module_path: &Path) -> String {
    module_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| module_path.display().to_string())
}
