#![no_main]
use libfuzzer_sys::fuzz_target;
use xmldom::{BuildOptions, Dom};

fuzz_target!(|data: &[u8]| {
    let mut dom = Dom::new();
    // Lenient namespaces, from bytes with encoding detection
    let _ = dom.parse_bytes(data);
    // Strict namespaces, auto-closing, blank removal
    let opts = BuildOptions::default()
        .strict_namespaces(true)
        .no_blanks(true)
        .auto_close(["br", "img"]);
    let _ = dom.parse_bytes_with_options(data, opts);
});
