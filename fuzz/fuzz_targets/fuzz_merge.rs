#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
use diff3utils::merge;
use diff3utils::parser;

// Whatever the subsidiary diff program emits, a successful parse must
// merge without panicking.
fuzz_target!(|x: (Vec<u8>, Vec<u8>)| {
    let (mut raw0, mut raw1) = x;
    raw0.push(b'\n');
    raw1.push(b'\n');
    let mut diagnostics = Vec::new();
    let (Ok(thread0), Ok(thread1)) = (
        parser::parse_diff(&raw0, false, "diff3", &mut diagnostics),
        parser::parse_diff(&raw1, false, "diff3", &mut diagnostics),
    ) else {
        return;
    };
    let _ = merge::make_3way_diff(&thread0, &thread1);
});
