#![no_main]
use libfuzzer_sys::fuzz_target;
use xmldom::{serialize, Dom};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let mut dom = Dom::new();
        // Build -> serialize -> build must never panic, and a tree that built
        // once must build again from its own output.
        if let Ok(doc) = dom.parse_str(s) {
            let output = serialize(&dom, doc);
            let again = dom.parse_str(&output);
            assert!(again.is_ok(), "reparse failed for {output:?}");
            if dom.normalize_namespaces(doc).is_ok() {
                let _ = serialize(&dom, doc);
            }
        }
    }
});
