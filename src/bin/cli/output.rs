//! Output formatting for CLI operations.

use serde_json::json;
use std::path::Path;

use jarmod::RewriteResult;

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats the result of a rewrite
    fn format_rewrite_result(&self, result: &RewriteResult, output: &Path, dry_run: bool)
    -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_rewrite_result(
        &self,
        result: &RewriteResult,
        output: &Path,
        dry_run: bool,
    ) -> String {
        let mut text = String::new();
        if dry_run {
            text.push_str("Dry run, nothing written.\n");
        } else {
            text.push_str(&format!("Wrote {}\n", output.display()));
        }
        text.push_str(&format!("  Modified: {}\n", result.entries_modified));
        text.push_str(&format!("  Renamed:  {}\n", result.entries_renamed));
        text.push_str(&format!("  Copied:   {}\n", result.entries_copied));
        text.push_str(&format!("  Size:     {}\n", humanize_bytes(result.total_bytes)));
        if !result.has_changes() {
            text.push_str("No entry matched any modification.\n");
        }
        text
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_rewrite_result(
        &self,
        result: &RewriteResult,
        output: &Path,
        dry_run: bool,
    ) -> String {
        let obj = json!({
            "output": if dry_run { None } else { Some(output.display().to_string()) },
            "dry_run": dry_run,
            "entries_modified": result.entries_modified,
            "entries_renamed": result.entries_renamed,
            "entries_copied": result.entries_copied,
            "total_entries": result.total_entries(),
            "total_bytes": result.total_bytes,
        });
        format!("{}\n", serde_json::to_string_pretty(&obj).unwrap_or_default())
    }
}

/// Creates a formatter for the given output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Formats a byte count with a binary unit suffix
pub fn humanize_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
