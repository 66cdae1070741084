use std::collections::HashSet;

use blockcov_core::model::{BasicBlock, DisassemblyInfo};

#[test]
fn display_formats_addresses_in_hex() {
    let bb = BasicBlock::new(0x400, 0x4ff, "main");
    assert_eq!(bb.to_string(), "BB(start=0x400, end=0x4ff, function=main)");
}

#[test]
fn equality_and_hash_are_structural() {
    let a = BasicBlock::new(0x10, 0x1f, "f");
    let b = BasicBlock::new(0x10, 0x1f, "f");
    let different_function = BasicBlock::new(0x10, 0x1f, "g");

    assert_eq!(a, b);
    assert_ne!(a, different_function);

    let mut set = HashSet::new();
    set.insert(a);
    set.insert(b);
    set.insert(different_function);
    assert_eq!(set.len(), 2);
}

#[test]
fn order_is_by_start_address_first() {
    let mut blocks = vec![
        BasicBlock::new(0x30, 0x3f, "c"),
        BasicBlock::new(0x10, 0x1f, "a"),
        BasicBlock::new(0x20, 0x2f, "b"),
    ];
    blocks.sort();
    let starts: Vec<u64> = blocks.iter().map(|bb| bb.start_addr()).collect();
    assert_eq!(starts, vec![0x10, 0x20, 0x30]);
}

#[test]
fn disassembly_info_sorts_blocks_on_construction() {
    let info = DisassemblyInfo::new(
        vec![
            BasicBlock::new(0x30, 0x3f, "c"),
            BasicBlock::new(0x10, 0x1f, "a"),
            BasicBlock::new(0x20, 0x2f, "b"),
        ],
        0x10,
        0x40,
    );

    let starts: Vec<u64> = info.blocks().iter().map(|bb| bb.start_addr()).collect();
    assert_eq!(starts, vec![0x10, 0x20, 0x30]);
}

#[test]
fn serialized_block_uses_contract_field_names() {
    let bb = BasicBlock::new(0x1000, 0x100f, "entry");
    let value = serde_json::to_value(&bb).expect("serialize");
    assert_eq!(value["start_addr"], 0x1000);
    assert_eq!(value["end_addr"], 0x100f);
    assert_eq!(value["function"], "entry");
}

#[test]
fn serialized_disassembly_info_matches_disas_schema() {
    let info = DisassemblyInfo::new(vec![BasicBlock::new(0x1000, 0x100f, "entry")], 0x1000, 0x2000);
    let value = serde_json::to_value(&info).expect("serialize");
    assert!(value["bbs"].is_array());
    assert_eq!(value["base_addr"], 0x1000);
    assert_eq!(value["end_addr"], 0x2000);
}
