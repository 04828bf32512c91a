use ptscope::domain::{ContextId, LoadBias};
use ptscope::symbolization::{
    parse_sideband_file, AddressSpaceRegistry, BinarySpec, SymbolIndex, SymbolLoader,
};
use std::io::Write;

#[test]
fn test_symbol_index_from_binary() {
    // Any binary with a symbol table works; use our own
    let binary_path = env!("CARGO_BIN_EXE_ptscope");

    let index = SymbolIndex::from_file(binary_path);
    assert!(index.is_ok(), "Failed to load symbols: {:?}", index.err());

    let index = index.unwrap();
    assert!(!index.is_empty(), "ptscope binary should carry a symbol table");
    println!("Loaded {} symbols from {}", index.len(), binary_path);
}

#[test]
fn test_symbol_index_is_sorted_and_resolves_starts() {
    let index = SymbolIndex::from_file(env!("CARGO_BIN_EXE_ptscope")).unwrap();

    let starts: Vec<u64> = index.iter().map(|s| s.start).collect();
    assert!(starts.windows(2).all(|w| w[0] < w[1]), "starts must be strictly increasing");

    for symbol in index.iter().take(20) {
        let (found, offset) = index.lookup(symbol.start).unwrap();
        assert_eq!(found.name, symbol.name);
        assert_eq!(offset, 0);
    }
}

#[test]
fn test_symbol_names_are_demangled() {
    let index = SymbolIndex::from_file(env!("CARGO_BIN_EXE_ptscope")).unwrap();
    let mangled = index.iter().filter(|s| s.name.starts_with("_ZN")).count();
    let rust_paths = index.iter().filter(|s| s.name.contains("::")).count();

    assert!(rust_paths > 0, "expected demangled Rust paths");
    assert!(mangled < rust_paths, "{mangled} names still mangled");
}

#[test]
fn test_non_object_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "plain text, not a binary").unwrap();

    let err = SymbolIndex::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Cannot parse symbols"), "{err}");
}

#[test]
fn test_sideband_binds_binary_per_context() {
    let exe = env!("CARGO_BIN_EXE_ptscope");
    let mut sideband = tempfile::NamedTempFile::new().unwrap();
    writeln!(sideband, "# ts ctx load path").unwrap();
    writeln!(sideband, "100 1 10000 {exe}").unwrap();
    writeln!(sideband, "200 2 0x20000000 {exe}").unwrap();

    let records = parse_sideband_file(sideband.path()).unwrap();
    assert_eq!(records.len(), 2);

    let mut registry = AddressSpaceRegistry::new();
    let mut loader = SymbolLoader::new();
    loader.register_sideband(&mut registry, &records).unwrap();

    // Same binary twice: parsed once, bound twice
    assert_eq!(loader.loaded_count(), 1);
    assert_eq!(registry.binding_count(), 2);

    let index = SymbolIndex::from_file(exe).unwrap();
    let symbol = index.iter().nth(index.len() / 2).unwrap();

    let in_one = registry.resolve(ContextId(1), 0x10000 + symbol.start).unwrap();
    assert_eq!(in_one.symbol.name, symbol.name);
    assert_eq!(in_one.offset, 0);

    let in_two = registry.resolve(ContextId(2), 0x2000_0000 + symbol.start).unwrap();
    assert_eq!(in_two.symbol.name, symbol.name);
    assert_eq!(in_two.offset, 0);
}

#[test]
fn test_sideband_with_missing_binary_fails() {
    let mut sideband = tempfile::NamedTempFile::new().unwrap();
    writeln!(sideband, "0 1 1000 /nonexistent/ptscope/binary").unwrap();

    let records = parse_sideband_file(sideband.path()).unwrap();
    let mut registry = AddressSpaceRegistry::new();
    let result = SymbolLoader::new().register_sideband(&mut registry, &records);
    assert!(result.is_err());
}

#[test]
fn test_command_line_binary_goes_to_default_context() {
    let exe = env!("CARGO_BIN_EXE_ptscope");
    let spec: BinarySpec = exe.parse().unwrap();
    assert_eq!(spec.context, ContextId::DEFAULT);
    assert_eq!(spec.load_bias, LoadBias(0));

    let mut registry = AddressSpaceRegistry::new();
    SymbolLoader::new().register_binary(&mut registry, &spec).unwrap();

    let index = SymbolIndex::from_file(exe).unwrap();
    let symbol = index.iter().next().unwrap();

    // Any context falls back to the default one
    let resolved = registry.resolve(ContextId(0x42), symbol.start + 1).unwrap();
    assert_eq!(resolved.symbol.name, symbol.name);
    assert_eq!(resolved.offset, 1);
}
