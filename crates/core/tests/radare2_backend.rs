#![cfg(feature = "radare2-backend")]

use blockcov_core::disas::backends::Radare2Backend;
use blockcov_core::disas::{DisassemblyBackend, DisassemblyError};

#[test]
fn radare2_backend_errors_for_missing_module() {
    let backend = Radare2Backend;
    let err = backend.disassemble(std::path::Path::new("does_not_exist.so")).unwrap_err();
    assert!(matches!(err, DisassemblyError::MissingModule(_)));
}

#[test]
fn radare2_backend_parses_fake_json_without_radare2_installed() {
    let backend = Radare2Backend;
    let temp = tempfile::tempdir().unwrap();
    let module = temp.path().join("mod.so");
    std::fs::write(&module, b"bin").unwrap();

    // Fake radare2 output and version to avoid the external dependency in
    // CI.
    let fake_info = temp.path().join("ij.json");
    std::fs::write(&fake_info, r#"{"core":{"size":4096},"bin":{"baddr":4194304}}"#).unwrap();
    let fake_functions = temp.path().join("aflj.json");
    std::fs::write(
        &fake_functions,
        r#"[{"offset":4194304,"name":"main","size":32},{"offset":4194368,"name":"helper","size":16}]"#,
    )
    .unwrap();
    let fake_graph = temp.path().join("agfj.json");
    std::fs::write(
        &fake_graph,
        r#"[{"name":"helper","blocks":[{"offset":4194368,"size":16}]},{"blocks":[{"offset":4194320,"size":16},{"offset":4194304,"size":16}]}]"#,
    )
    .unwrap();
    std::env::set_var("BC_R2_FAKE_INFO", &fake_info);
    std::env::set_var("BC_R2_FAKE_FUNCTIONS", &fake_functions);
    std::env::set_var("BC_R2_FAKE_GRAPH", &fake_graph);
    std::env::set_var("BC_R2_FAKE_VERSION", "radare2 5.0-fake");

    let result = backend.disassemble(&module);

    // Second pass: a graph with no blocks must be rejected rather than
    // cached as an empty result.
    std::fs::write(&fake_graph, r#"[{"name":"main"}]"#).unwrap();
    let empty = backend.disassemble(&module);

    std::env::remove_var("BC_R2_FAKE_INFO");
    std::env::remove_var("BC_R2_FAKE_FUNCTIONS");
    std::env::remove_var("BC_R2_FAKE_GRAPH");
    std::env::remove_var("BC_R2_FAKE_VERSION");

    let info = result.expect("disassemble fake");
    assert_eq!(info.base_addr(), 0x40_0000);
    assert_eq!(info.end_addr(), 0x40_1000);
    assert_eq!(info.blocks().len(), 3);

    // Blocks come back sorted regardless of graph order.
    let starts: Vec<u64> = info.blocks().iter().map(|bb| bb.start_addr()).collect();
    assert_eq!(starts, vec![4194304, 4194320, 4194368]);

    // Labeled graph entries keep their name; unlabeled ones are
    // attributed by address containment.
    assert_eq!(info.blocks()[0].function(), "main");
    assert_eq!(info.blocks()[0].end_addr(), 4194319);
    assert_eq!(info.blocks()[2].function(), "helper");

    assert!(matches!(empty.unwrap_err(), DisassemblyError::NoDisassembly(_)));
}
