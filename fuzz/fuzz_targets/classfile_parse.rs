//! Fuzz target for classfile::parse with arbitrary byte input.
//!
//! Any input that parses must serialize back to the same bytes, and patching
//! an annotation element must never panic.
//!
//! Run with: cargo +nightly fuzz run classfile_parse

#![no_main]

use jarmod::classfile::{self, patch_annotation_element};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(class) = classfile::parse(data) else {
        return;
    };

    let bytes = classfile::serialize(&class).expect("parsed class must serialize");
    assert_eq!(bytes, data, "round trip must be byte exact");

    if let Ok((patched, _)) = patch_annotation_element(class, "Lfoo/Mod;", "value", &"x".into()) {
        let _ = classfile::serialize(&patched);
    }
});
