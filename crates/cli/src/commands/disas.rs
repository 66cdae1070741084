use anyhow::{anyhow, Context, Result};

use blockcov_core::disas::default_backend_registry;
use blockcov_core::event::StdLog;
use blockcov_core::layout::ProjectLayout;
use blockcov_core::resolve::SearchPathResolver;
use blockcov_core::runner::CoverageRunner;

use crate::commands::util::{load_config, select_backend};
use crate::{canonicalize_or_current, resolve_against_root};

/// Disassemble one module, refreshing its `.disas` cache artifact.
///
/// Useful to pay the disassembly cost up front, or to force a fresh
/// artifact after replacing a binary.
pub fn disas_command(
    root: &str,
    module: &str,
    backend_override: Option<&str>,
    config_path: Option<&str>,
) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let config = load_config(&root_path, config_path)?;

    let module_path = resolve_against_root(&root_path, module);
    if !module_path.is_file() {
        return Err(anyhow!("Module file does not exist: {}", module_path.display()));
    }
    let module_name = module_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| module.to_string());

    let layout = ProjectLayout::new(&root_path);
    let registry = default_backend_registry();
    let backend = select_backend(&registry, backend_override, &config)?;
    let resolver = SearchPathResolver::new(vec![root_path.clone()]);

    let log = StdLog;
    let runner = CoverageRunner { layout: &layout, backend, resolver: &resolver, log: &log };
    let info = runner
        .disas_info(&module_name, &module_path)
        .with_context(|| format!("Failed to disassemble {}", module_path.display()))?;

    println!("Disassembly for {}:", module_name);
    println!("  Backend: {}", backend.name());
    println!("  Basic blocks: {}", info.blocks().len());
    println!("  Module bounds: {:#x}..{:#x}", info.base_addr(), info.end_addr());
    println!("  Cache: {}", layout.disas_path(&module_name).display());

    Ok(())
}
