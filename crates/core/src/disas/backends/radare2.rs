use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use crate::disas::{DisassemblyBackend, DisassemblyError};
use crate::model::{BasicBlock, DisassemblyInfo};

/// Radare2-backed disassembler that shells out to radare2 with analysis
/// commands and parses the JSON output.
pub struct Radare2Backend;

impl DisassemblyBackend for Radare2Backend {
    fn disassemble(&self, module_path: &Path) -> Result<DisassemblyInfo, DisassemblyError> {
        if !module_path.is_file() {
            return Err(DisassemblyError::MissingModule(module_path.to_path_buf()));
        }

        let r2_path = resolve_radare2_path();
        let _version = version_string(&r2_path).map_err(DisassemblyError::Backend)?;

        // Allow tests to feed synthetic JSON via env to avoid needing
        // radare2 installed.
        let (base_addr, end_addr) = if let Some(fake_info) = std::env::var_os("BC_R2_FAKE_INFO") {
            let body = fs::read_to_string(fake_info).map_err(|e| {
                DisassemblyError::Backend(format!("failed to read BC_R2_FAKE_INFO: {e}"))
            })?;
            parse_module_bounds(&body)?
        } else {
            let json = run_r2_json(&r2_path, module_path, "ij")?;
            parse_module_bounds(&json)?
        };

        let functions = if let Some(fake_functions) = std::env::var_os("BC_R2_FAKE_FUNCTIONS") {
            let body = fs::read_to_string(fake_functions).map_err(|e| {
                DisassemblyError::Backend(format!("failed to read BC_R2_FAKE_FUNCTIONS: {e}"))
            })?;
            parse_functions(&body)?
        } else {
            let json = run_r2_json(&r2_path, module_path, "aaa;aflj")?;
            parse_functions(&json)?
        };

        let bbs = if let Some(fake_graph) = std::env::var_os("BC_R2_FAKE_GRAPH") {
            let body = fs::read_to_string(fake_graph).map_err(|e| {
                DisassemblyError::Backend(format!("failed to read BC_R2_FAKE_GRAPH: {e}"))
            })?;
            parse_basic_blocks(&body, &functions)?
        } else {
            let json = run_r2_json(&r2_path, module_path, "aaa;agfj")?;
            parse_basic_blocks(&json, &functions)?
        };

        if bbs.is_empty() {
            return Err(DisassemblyError::NoDisassembly(module_path.display().to_string()));
        }

        Ok(DisassemblyInfo::new(bbs, base_addr, end_addr))
    }

    fn name(&self) -> &'static str {
        "radare2"
    }
}

fn resolve_radare2_path() -> PathBuf {
    std::env::var_os("RADARE2_BIN").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("radare2"))
}

fn run_r2_json(r2_bin: &Path, module: &Path, command: &str) -> Result<String, DisassemblyError> {
    let output = Command::new(r2_bin)
        .args(["-2", "-q", "-c", command])
        .arg(module)
        .output()
        .map_err(|e| DisassemblyError::Backend(format!("failed to spawn radare2: {e}")))?;
    if !output.status.success() {
        return Err(DisassemblyError::Backend(format!("radare2 exited with {}", output.status)));
    }
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    Ok(stdout)
}

fn version_string(r2_bin: &Path) -> Result<String, String> {
    if let Some(fake) = std::env::var_os("BC_R2_FAKE_VERSION") {
        return Ok(fake.to_string_lossy().to_string());
    }
    let output = Command::new(r2_bin)
        .arg("-v")
        .output()
        .map_err(|e| format!("failed to spawn radare2: {e}"))?;
    if !output.status.success() {
        return Err(format!("radare2 -v exited with {}", output.status));
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        Err("radare2 -v produced no output".to_string())
    } else {
        Ok(stdout)
    }
}

#[derive(Debug, Deserialize)]
struct R2Info {
    #[serde(default)]
    core: Option<R2CoreInfo>,
    #[serde(default)]
    bin: Option<R2BinInfo>,
}

#[derive(Debug, Deserialize)]
struct R2CoreInfo {
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct R2BinInfo {
    #[serde(default)]
    baddr: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct R2Function {
    #[serde(default)]
    offset: Option<u64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct R2GraphFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    blocks: Option<Vec<R2Block>>,
}

#[derive(Debug, Deserialize)]
struct R2Block {
    #[serde(default)]
    offset: Option<u64>,
    #[serde(default)]
    size: Option<u64>,
}

/// Named address range covered by one function, used to attribute blocks
/// that the graph output does not label.
#[derive(Debug, Clone)]
struct FunctionRange {
    name: String,
    start: u64,
    end: u64,
}

fn parse_module_bounds(body: &str) -> Result<(u64, u64), DisassemblyError> {
    let info: R2Info = serde_json::from_str(body)
        .map_err(|e| DisassemblyError::Backend(format!("failed to parse radare2 ij JSON: {e}")))?;
    let base_addr = info.bin.and_then(|b| b.baddr).unwrap_or(0);
    let size = info.core.and_then(|c| c.size).unwrap_or(0);
    Ok((base_addr, base_addr.saturating_add(size)))
}

fn parse_functions(body: &str) -> Result<Vec<FunctionRange>, DisassemblyError> {
    // aflj returns a JSON array; tolerate missing fields gracefully.
    let funcs: Vec<R2Function> = serde_json::from_str(body).map_err(|e| {
        DisassemblyError::Backend(format!("failed to parse radare2 aflj JSON: {e}"))
    })?;
    let mut out = Vec::new();
    for f in funcs {
        let start = f.offset.unwrap_or(0);
        let size = f.size.unwrap_or(0);
        out.push(FunctionRange {
            name: f.name.unwrap_or_default(),
            start,
            end: start.saturating_add(size),
        });
    }
    Ok(out)
}

fn parse_basic_blocks(
    body: &str,
    functions: &[FunctionRange],
) -> Result<Vec<BasicBlock>, DisassemblyError> {
    let funcs: Vec<R2GraphFunction> = serde_json::from_str(body).map_err(|e| {
        DisassemblyError::Backend(format!("failed to parse radare2 agfj JSON: {e}"))
    })?;

    let mut bbs = Vec::new();
    for func in funcs {
        let Some(blocks) = func.blocks else { continue };
        for b in blocks {
            let start = b.offset.unwrap_or(0);
            let size = b.size.unwrap_or(0);
            // Inclusive end of the block's last byte.
            let end = start.saturating_add(size.saturating_sub(1));
            let function = func
                .name
                .clone()
                .or_else(|| owning_function(start, functions))
                .unwrap_or_default();
            bbs.push(BasicBlock::new(start, end, function));
        }
    }
    Ok(bbs)
}

fn owning_function(addr: u64, functions: &[FunctionRange]) -> Option<String> {
    functions.iter().find(|f| addr >= f.start && addr < f.end).map(|f| f.name.clone())
}
