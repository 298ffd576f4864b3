//! Fuzz target for rewriting arbitrary bytes as an archive.
//!
//! Exercises the ZIP reader, the per-entry dispatch and every modification
//! kind against malformed or adversarial input. The goal is to find panics
//! or hangs; errors are expected.
//!
//! Run with: cargo +nightly fuzz run archive_rewrite

#![no_main]

use jarmod::{ArchiveRewriter, EntryMatcher, Modification};
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let modifications = vec![
        Modification::annotation_value("Lfoo/Mod;", "value", "x"),
        Modification::json(EntryMatcher::suffix(".json"), Ok),
        Modification::toml(EntryMatcher::suffix(".toml"), Ok),
        Modification::plain_text(EntryMatcher::suffix(".txt"), str::to_owned),
        Modification::rename("(.*)\\.mf", "$1.MF").expect("valid pattern"),
    ];

    let _ = ArchiveRewriter::new(&modifications)
        .rewrite_to_writer(Cursor::new(data), Cursor::new(Vec::new()));
});
