use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use capstone::{arch, prelude::*, Capstone, InsnGroupId};
use goblin::elf::{self, Elf};

use crate::disas::{DisassemblyBackend, DisassemblyError};
use crate::model::{BasicBlock, DisassemblyInfo};

/// In-process ELF disassembler built on capstone + goblin.
///
/// Function symbols come from the ELF symbol table; each function is
/// disassembled linearly and split into basic blocks at jump targets and
/// after terminating instructions. Module bounds are derived from the
/// PT_LOAD segments.
pub struct CapstoneBackend;

#[derive(Debug, Clone)]
struct FunctionSymbol {
    name: String,
    address: u64,
    size: u64,
    file_range: (usize, usize),
}

impl DisassemblyBackend for CapstoneBackend {
    fn disassemble(&self, module_path: &Path) -> Result<DisassemblyInfo, DisassemblyError> {
        if !module_path.is_file() {
            return Err(DisassemblyError::MissingModule(module_path.to_path_buf()));
        }

        let bytes = fs::read(module_path)
            .map_err(|e| DisassemblyError::Backend(format!("failed to read module: {e}")))?;
        let elf = Elf::parse(&bytes).map_err(|e| {
            DisassemblyError::Backend(format!("only ELF modules are supported: {e}"))
        })?;

        let cs = make_cs(&elf)?;
        let (base_addr, end_addr) = module_bounds(&elf, bytes.len());

        let mut bbs = Vec::new();
        for sym in function_symbols(&elf, bytes.len()) {
            let code = &bytes[sym.file_range.0..sym.file_range.1];
            bbs.extend(function_blocks(&cs, code, &sym)?);
        }

        if bbs.is_empty() {
            return Err(DisassemblyError::NoDisassembly(module_path.display().to_string()));
        }

        Ok(DisassemblyInfo::new(bbs, base_addr, end_addr))
    }

    fn name(&self) -> &'static str {
        "capstone"
    }
}

fn make_cs(elf: &Elf) -> Result<Capstone, DisassemblyError> {
    let build = match elf.header.e_machine {
        elf::header::EM_X86_64 => {
            Capstone::new().x86().mode(arch::x86::ArchMode::Mode64).detail(true).build()
        }
        elf::header::EM_386 => {
            Capstone::new().x86().mode(arch::x86::ArchMode::Mode32).detail(true).build()
        }
        elf::header::EM_AARCH64 => {
            Capstone::new().arm64().mode(arch::arm64::ArchMode::Arm).detail(true).build()
        }
        elf::header::EM_ARM => {
            Capstone::new().arm().mode(arch::arm::ArchMode::Arm).detail(true).build()
        }
        other => {
            return Err(DisassemblyError::Backend(format!(
                "unsupported ELF machine type {other:#x}"
            )))
        }
    };
    build.map_err(|e| DisassemblyError::Backend(format!("capstone init failed: {e}")))
}

/// Module bounds from the PT_LOAD segments; falls back to the raw file
/// span for objects with no program headers (e.g., relocatable fixtures).
fn module_bounds(elf: &Elf, bytes_len: usize) -> (u64, u64) {
    let mut base: Option<u64> = None;
    let mut end: u64 = 0;
    for ph in &elf.program_headers {
        if ph.p_type != elf::program_header::PT_LOAD {
            continue;
        }
        base = Some(base.map_or(ph.p_vaddr, |b| b.min(ph.p_vaddr)));
        end = end.max(ph.p_vaddr.saturating_add(ph.p_memsz));
    }
    match base {
        Some(base) => (base, end),
        None => (0, bytes_len as u64),
    }
}

fn function_symbols(elf: &Elf, bytes_len: usize) -> Vec<FunctionSymbol> {
    let mut symbols = Vec::new();
    for sym in &elf.syms {
        if !sym.is_function()
            || sym.st_size == 0
            || sym.st_shndx == elf::section_header::SHN_UNDEF as usize
        {
            continue;
        }
        let name = elf.strtab.get_at(sym.st_name).unwrap_or("").to_string();
        if name.is_empty() {
            continue;
        }
        let Some(shdr) = elf.section_headers.get(sym.st_shndx) else { continue };
        if sym.st_value < shdr.sh_addr || sym.st_value >= shdr.sh_addr + shdr.sh_size {
            continue;
        }
        let offset_in_section = sym.st_value - shdr.sh_addr;
        let start = shdr.sh_offset.saturating_add(offset_in_section);
        let available = shdr.sh_size.saturating_sub(offset_in_section);
        let end = start.saturating_add(sym.st_size.min(available)).min(bytes_len as u64);
        if end <= start {
            continue;
        }
        symbols.push(FunctionSymbol {
            name,
            address: sym.st_value,
            size: sym.st_size,
            file_range: (start as usize, end as usize),
        });
    }
    symbols
}

/// Split one function's instruction stream into basic blocks.
///
/// Leaders are the function entry, every in-function jump target, and the
/// instruction after a terminator (jump or return). Calls do not end a
/// block, matching the granularity disassemblers report.
fn function_blocks(
    cs: &Capstone,
    code: &[u8],
    sym: &FunctionSymbol,
) -> Result<Vec<BasicBlock>, DisassemblyError> {
    let insns = cs
        .disasm_all(code, sym.address)
        .map_err(|e| DisassemblyError::Backend(format!("capstone disassembly failed: {e}")))?;

    let func_end = sym.address.saturating_add(sym.size);
    let mut leaders: BTreeSet<u64> = BTreeSet::new();
    leaders.insert(sym.address);

    // (address, end-exclusive address, terminates-block)
    let mut rows: Vec<(u64, u64, bool)> = Vec::new();
    for i in insns.iter() {
        let mut terminates = false;
        if let Ok(detail) = cs.insn_detail(i) {
            let is_jump = detail
                .groups()
                .contains(&InsnGroupId(capstone::InsnGroupType::CS_GRP_JUMP as u8));
            let is_ret = detail
                .groups()
                .contains(&InsnGroupId(capstone::InsnGroupType::CS_GRP_RET as u8));
            terminates = is_jump || is_ret;
            if is_jump {
                if let Some(target) = immediate_target(&detail) {
                    if target >= sym.address && target < func_end {
                        leaders.insert(target);
                    }
                }
            }
        }
        rows.push((i.address(), i.address() + i.bytes().len() as u64, terminates));
    }

    let mut blocks = Vec::new();
    let mut block_start: Option<u64> = None;
    for (idx, (addr, next_addr, terminates)) in rows.iter().enumerate() {
        if block_start.is_none() {
            block_start = Some(*addr);
        }
        let next_is_leader =
            rows.get(idx + 1).map(|(next, _, _)| leaders.contains(next)).unwrap_or(false);
        let is_last = idx + 1 == rows.len();
        if *terminates || next_is_leader || is_last {
            if let Some(start) = block_start.take() {
                blocks.push(BasicBlock::new(
                    start,
                    next_addr.saturating_sub(1),
                    sym.name.clone(),
                ));
            }
        }
    }
    Ok(blocks)
}

fn immediate_target(detail: &capstone::InsnDetail) -> Option<u64> {
    for op in detail.arch_detail().operands() {
        match op {
            capstone::arch::ArchOperand::X86Operand(x) => {
                if let capstone::arch::x86::X86OperandType::Imm(v) = x.op_type {
                    return Some(v as u64);
                }
            }
            capstone::arch::ArchOperand::ArmOperand(a) => {
                if let capstone::arch::arm::ArmOperandType::Imm(v) = a.op_type {
                    return Some(v as u64);
                }
            }
            capstone::arch::ArchOperand::Arm64Operand(a) => {
                if let capstone::arch::arm64::Arm64OperandType::Imm(v) = a.op_type {
                    return Some(v as u64);
                }
            }
            _ => {}
        }
    }
    None
}
