//! Fuzz target for URL query filtering.
//!
//! Arbitrary URLs and rule fragments must either filter cleanly or return an
//! error; a filtered parameter's value never survives.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pc_clean::{FilterMatcher, FilterRule};

#[derive(Arbitrary, Debug)]
struct Input {
    url: String,
    fragment: String,
}

fuzz_target!(|input: Input| {
    if input.fragment.is_empty() {
        return;
    }
    let matcher = FilterMatcher::new(vec![FilterRule::literal(input.fragment)], Vec::new());
    let _ = pc_clean::clean_url(&input.url, &matcher);
});
