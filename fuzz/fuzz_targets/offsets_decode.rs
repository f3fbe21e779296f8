#![no_main]
use libfuzzer_sys::fuzz_target;
use program_model::decompiled::offsets::{decode, encode};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let offsets = decode(&text);
    assert_eq!(decode(&encode(&offsets)), offsets);
});
