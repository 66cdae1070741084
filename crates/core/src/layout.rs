//! Project layout: where cache and report artifacts live on disk.

use std::path::{Path, PathBuf};

/// Logical layout of a coverage project on disk.
///
/// This is derived from a chosen root path. It does not perform any IO
/// itself; the CLI and the report writers are responsible for creating
/// files based on this layout.
///
/// The artifact names (`<module>.disas`, `<module>_coverage.json`,
/// `drcov/<module>_coverage_<state>.drcov`) are consumed by downstream
/// tooling and must not change.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    /// Root directory of the project. Disassembly cache artifacts live
    /// here.
    pub root: PathBuf,
    /// Directory the coverage reports are written into. Defaults to the
    /// latest-results directory under the root.
    pub results_dir: PathBuf,
}

impl ProjectLayout {
    /// Compute the default layout for a project rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let results_dir = root.join("s2e-last");
        Self { root, results_dir }
    }

    /// Override the results directory (e.g., when the trace data lives
    /// outside the default location).
    pub fn with_results_dir(mut self, results_dir: impl AsRef<Path>) -> Self {
        self.results_dir = results_dir.as_ref().to_path_buf();
        self
    }

    /// Path of the disassembly cache artifact for `module_name`.
    pub fn disas_path(&self, module_name: &str) -> PathBuf {
        self.root.join(format!("{module_name}.disas"))
    }

    /// Path of the aggregate JSON coverage report for `module_name`.
    pub fn json_report_path(&self, module_name: &str) -> PathBuf {
        self.results_dir.join(format!("{module_name}_coverage.json"))
    }

    /// Directory holding the per-state drcov files.
    pub fn drcov_dir(&self) -> PathBuf {
        self.results_dir.join("drcov")
    }

    /// Path of the drcov file for one state of `module_name`.
    pub fn drcov_path(&self, module_name: &str, state: crate::model::StateId) -> PathBuf {
        self.drcov_dir().join(format!("{module_name}_coverage_{state}.drcov"))
    }
}
