//! Fuzz target for cleaning JSON payloads.
//!
//! Any JSON document must clean without panicking, and cleaning the output
//! again must not change it.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pc_clean::Tree;
use pc_config::{get_preset, PresetName};

fuzz_target!(|data: &[u8]| {
    let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(cleaner) = get_preset(PresetName::Strict).build_cleaner() else {
        return;
    };

    let once = cleaner.clean(&Tree::from_json(&json));
    let twice = cleaner.clean(&Tree::from_cleaned(&once));
    assert_eq!(once, twice);
});
