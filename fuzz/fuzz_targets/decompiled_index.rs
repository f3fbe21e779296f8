#![no_main]
use libfuzzer_sys::fuzz_target;
use program_model::DecompiledSource;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = DecompiledSource::from_reader(Cursor::new(data)) {
        for address in source.addresses() {
            let _ = source.try_get_function(address);
        }
    }
});
