//! Command implementation for the CLI tool.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use jarmod::preset::{ModMetadata, Platform};
use jarmod::{
    ArchiveRewriter, CancellationToken, Error, Modification, RewriteOptions, RewriteResult,
};

use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::create_formatter;
use crate::{Compression, OutputFormat};

/// Configuration for the rewrite command.
pub struct RewriteConfig<'a> {
    pub archive_path: &'a Path,
    pub output_path: &'a Path,
    /// Flattened DESCRIPTOR ELEMENT VALUE triples.
    pub annotations: &'a [String],
    /// Flattened PATTERN REPLACEMENT pairs.
    pub renames: &'a [String],
    pub preset: Option<Platform>,
    pub metadata_path: Option<&'a Path>,
    pub compression: Compression,
    pub level: Option<u32>,
    pub dry_run: bool,
    pub format: OutputFormat,
    pub quiet: bool,
    pub cancellation: CancellationToken,
}

/// Rewrite command implementation
pub fn rewrite(config: &RewriteConfig<'_>) -> ExitCode {
    let formatter = create_formatter(config.format);

    let modifications = match build_modifications(config) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {}", e);
            return match e {
                Error::Io(_) => ExitCode::IoError,
                _ => ExitCode::BadArgs,
            };
        }
    };
    if modifications.is_empty() {
        eprintln!("Error: no modifications given (use --annotation, --rename or --preset)");
        return ExitCode::BadArgs;
    }
    log::info!("applying {} modification(s)", modifications.len());

    let mut options = RewriteOptions::new()
        .compression(config.compression.into())
        .cancellation(config.cancellation.clone());
    if let Some(level) = config.level {
        options = options.level(level);
    }
    let rewriter = ArchiveRewriter::new(&modifications).with_options(options);

    let result = if config.dry_run {
        dry_run(&rewriter, config.archive_path)
    } else {
        rewriter.rewrite(config.archive_path, config.output_path)
    };

    let result = match result {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return error_to_exit_code(&e);
        }
    };

    if !config.quiet {
        print!(
            "{}",
            formatter.format_rewrite_result(&result, config.output_path, config.dry_run)
        );
    }

    if result.has_changes() {
        ExitCode::Success
    } else {
        ExitCode::NoChanges
    }
}

/// Orders modifications as preset, then annotations, then renames.
fn build_modifications(config: &RewriteConfig<'_>) -> jarmod::Result<Vec<Modification>> {
    let mut modifications = Vec::new();

    // clap guarantees --metadata accompanies --preset.
    if let (Some(platform), Some(path)) = (config.preset, config.metadata_path) {
        let metadata = ModMetadata::from_toml_str(&std::fs::read_to_string(path)?)?;
        log::debug!("loaded metadata for '{}' from {}", metadata.id, path.display());
        modifications.extend(platform.modifications(&metadata)?);
    }

    for triple in config.annotations.chunks_exact(3) {
        modifications.push(Modification::annotation_value(
            triple[0].as_str(),
            triple[1].as_str(),
            triple[2].as_str(),
        ));
    }

    for pair in config.renames.chunks_exact(2) {
        modifications.push(Modification::rename(&pair[0], pair[1].as_str())?);
    }

    Ok(modifications)
}

/// Rewrites into memory and discards the output.
fn dry_run(rewriter: &ArchiveRewriter<'_>, archive_path: &Path) -> jarmod::Result<RewriteResult> {
    let input = BufReader::new(File::open(archive_path)?);
    let (result, _) = rewriter.rewrite_to_writer(input, Cursor::new(Vec::new()))?;
    Ok(result)
}
