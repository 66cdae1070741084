use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use blockcov_core::disas::default_backend_registry;
use blockcov_core::event::StdLog;
use blockcov_core::layout::ProjectLayout;
use blockcov_core::resolve::SearchPathResolver;
use blockcov_core::runner::CoverageRunner;
use blockcov_core::trace::TraceSource;

use crate::commands::util::{load_config, select_backend, JsonTraceSource};
use crate::{canonicalize_or_current, resolve_against_root};

/// Default name of the aggregated trace file under the results directory.
pub const DEFAULT_TRACE_FILE: &str = "tbcoverage.json";

/// Generate basic block coverage reports for every module recorded in the
/// trace data.
pub fn generate_command(
    root: &str,
    trace: Option<&str>,
    drcov: bool,
    backend_override: Option<&str>,
    search_paths: &[String],
    results_dir: Option<&str>,
    config_path: Option<&str>,
) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let config = load_config(&root_path, config_path)?;

    let mut layout = ProjectLayout::new(&root_path);
    if let Some(dir) = results_dir.map(str::to_string).or_else(|| config.results_dir.clone()) {
        layout = layout.with_results_dir(resolve_against_root(&root_path, &dir));
    }
    fs::create_dir_all(&layout.results_dir).with_context(|| {
        format!("Failed to create results dir: {}", layout.results_dir.display())
    })?;

    let trace_path = match trace {
        Some(t) => resolve_against_root(&root_path, t),
        None => layout.results_dir.join(DEFAULT_TRACE_FILE),
    };

    let source = JsonTraceSource::new(&trace_path);
    let coverage = source.execution_intervals().with_context(|| {
        format!("Failed to load translation block coverage from {}", trace_path.display())
    })?;
    if coverage.is_empty() {
        return Err(anyhow!(
            "No translation block coverage information found in {}",
            trace_path.display()
        ));
    }

    // Module paths recorded in the trace are looked up in the explicit
    // search paths first, then any configured ones, then the project root.
    let mut paths: Vec<PathBuf> =
        search_paths.iter().map(|p| resolve_against_root(&root_path, p)).collect();
    paths.extend(config.search_paths.iter().map(|p| resolve_against_root(&root_path, p)));
    paths.push(root_path.clone());
    let resolver = SearchPathResolver::new(paths);

    let registry = default_backend_registry();
    let backend = select_backend(&registry, backend_override, &config)?;

    let log = StdLog;
    let runner = CoverageRunner { layout: &layout, backend, resolver: &resolver, log: &log };
    let summaries = runner.run(&coverage, drcov).context("Coverage generation failed")?;

    if summaries.is_empty() {
        println!("No coverage reports were generated (no module could be resolved).");
        return Ok(());
    }

    for summary in summaries {
        let percent = if summary.total_bbs == 0 {
            0.0
        } else {
            summary.covered_bbs as f64 / summary.total_bbs as f64 * 100.0
        };

        println!("Basic block coverage saved to {}", summary.location.display());
        println!();
        println!("Statistics");
        println!("==========");
        println!();
        println!("Total basic blocks: {}", summary.total_bbs);
        println!("Covered basic blocks: {} ({:.1}%)", summary.covered_bbs, percent);
        println!();
    }

    Ok(())
}
