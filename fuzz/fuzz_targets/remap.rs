#![no_main]

use libfuzzer_sys::fuzz_target;
use classremap::prelude::*;

fuzz_target!(|data: &[u8]| {
    let symbols = SymbolMap::builder()
        .method("m_1234_", "renderTick")
        .field("f_5678_", "velocity")
        .class("a/b", "net/example/Entity")
        .build()
        .unwrap();
    let config = RemapConfig::production();
    let remapper = BytecodeRemapper::new(&symbols, &config);

    if let Ok(remapped) = remapper.remap(data) {
        // Anything accepted once is accepted again and stays put
        let again = remapper.remap(&remapped).unwrap();
        assert_eq!(again, remapped);
    }
});
