//! CLI tool for rewriting JAR archives.

mod commands;
mod exit_codes;
mod output;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use jarmod::CancellationToken;
use jarmod::preset::Platform;

/// Rewrite entries, annotations and descriptors of a JAR archive
#[derive(Parser)]
#[command(name = "jarmod")]
#[command(author, version, about = "Rewrite entries, annotations and descriptors of a JAR archive", long_about = None)]
pub struct Cli {
    /// Archive to rewrite
    archive: PathBuf,

    /// Output archive (defaults to rewriting in place)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Set an annotation element: DESCRIPTOR ELEMENT VALUE
    #[arg(long, num_args = 3, value_names = ["DESCRIPTOR", "ELEMENT", "VALUE"], action = clap::ArgAction::Append)]
    annotation: Vec<String>,

    /// Rename entries matching a regex: PATTERN REPLACEMENT
    #[arg(long, num_args = 2, value_names = ["PATTERN", "REPLACEMENT"], action = clap::ArgAction::Append)]
    rename: Vec<String>,

    /// Apply a platform preset (requires --metadata)
    #[arg(long, value_parser = parse_platform, requires = "metadata")]
    preset: Option<Platform>,

    /// TOML file describing the mod for --preset
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Compression for rewritten entries
    #[arg(long, value_enum, default_value = "preserve")]
    compression: Compression,

    /// Deflate level for rewritten entries (0-9)
    #[arg(short = 'l', long)]
    level: Option<u32>,

    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human")]
    format: OutputFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress the summary
    #[arg(long, short = 'q')]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Compression {
    Preserve,
    Stored,
    Deflated,
}

impl From<Compression> for jarmod::CompressionPolicy {
    fn from(compression: Compression) -> Self {
        match compression {
            Compression::Preserve => jarmod::CompressionPolicy::PreserveOriginal,
            Compression::Stored => jarmod::CompressionPolicy::Stored,
            Compression::Deflated => jarmod::CompressionPolicy::Deflated,
        }
    }
}

fn parse_platform(s: &str) -> Result<Platform, String> {
    s.parse()
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    // First Ctrl+C stops the rewrite between entries so the staged file is
    // cleaned up; a second one exits immediately.
    let cancellation = CancellationToken::new();
    let handler_token = cancellation.clone();
    ctrlc::set_handler(move || {
        if handler_token.is_cancelled() {
            std::process::exit(exit_codes::USER_INTERRUPT);
        }
        eprintln!("\nInterrupted, stopping");
        handler_token.cancel();
    })
    .ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = cli.output.clone().unwrap_or_else(|| cli.archive.clone());
    let exit_code = commands::rewrite(&commands::RewriteConfig {
        archive_path: &cli.archive,
        output_path: &output,
        annotations: &cli.annotation,
        renames: &cli.rename,
        preset: cli.preset,
        metadata_path: cli.metadata.as_deref(),
        compression: cli.compression,
        level: cli.level,
        dry_run: cli.dry_run,
        format: cli.format,
        quiet: cli.quiet,
        cancellation,
    });

    std::process::exit(exit_code.code());
}
