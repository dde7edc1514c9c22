//! Fuzz target for string repair.
//!
//! Arbitrary bytes with a declared encoding must come out as canonical
//! UTF-8; bytes without one pass through untouched.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pc_clean::{repair, Text};

fuzz_target!(|data: &[u8]| {
    let encodings = [
        encoding_rs::UTF_8,
        encoding_rs::WINDOWS_1252,
        encoding_rs::SHIFT_JIS,
        encoding_rs::UTF_16LE,
    ];
    let encoding = encodings[data.first().copied().unwrap_or(0) as usize % encodings.len()];

    assert_eq!(repair(Text::raw(data)), Text::raw(data));
    assert!(repair(Text::encoded(data, encoding)).as_str().is_some());
});
