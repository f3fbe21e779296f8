#![no_main]
use libfuzzer_sys::fuzz_target;
use program_model::directives::DirectiveParser;
use program_model::TypeStore;

fuzz_target!(|data: &[u8]| {
    let comment = String::from_utf8_lossy(data);
    let mut store = TypeStore::default();
    let mut parser = DirectiveParser::new(|key: &program_model::TypeKey| store.get(key));
    let _ = parser.try_parse(&comment, "fuzz");
});
