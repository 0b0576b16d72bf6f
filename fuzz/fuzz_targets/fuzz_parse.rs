#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
use diff3utils::parser;

fuzz_target!(|data: Vec<u8>| {
    let mut raw = data;
    raw.push(b'\n');
    let mut diagnostics = Vec::new();
    let _ = parser::parse_diff(&raw, false, "diff3", &mut diagnostics);
    let _ = parser::parse_diff(&raw, true, "diff3", &mut diagnostics);
});
