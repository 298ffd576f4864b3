//! Archive rewriting.
//!
//! The rewriter streams every entry of a source archive in order, applies the
//! modifications that apply to it, and writes a new archive. The destination
//! is only replaced once the new archive is complete.

mod options;
mod rewriter;
mod staging;

pub use options::{CancellationToken, CompressionPolicy, RewriteOptions};
pub use rewriter::{ArchiveRewriter, RewriteResult, rewrite_archive};
