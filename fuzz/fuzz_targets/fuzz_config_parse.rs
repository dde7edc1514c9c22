//! Fuzz target for cleaner configuration parsing.
//!
//! Tests that JSON and TOML config parsing, validation and cleaner
//! construction handle arbitrary input without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pc_config::CleanerConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    for parsed in [CleanerConfig::parse_json(text), CleanerConfig::parse_toml(text)] {
        if let Ok(config) = parsed {
            let _ = config.build_cleaner();
        }
    }
});
