//! Options controlling how rewritten entries are stored.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use zip::CompressionMethod;

/// Compression used for entries whose content was rewritten.
///
/// Entries that are copied or only renamed keep their original compressed
/// bytes regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum CompressionPolicy {
    /// Store if the original entry was stored, deflate otherwise.
    #[default]
    PreserveOriginal,
    /// Always store.
    Stored,
    /// Always deflate.
    Deflated,
}

impl CompressionPolicy {
    /// Resolves the method for an entry originally written with `original`.
    pub fn method_for(self, original: CompressionMethod) -> CompressionMethod {
        match self {
            CompressionPolicy::PreserveOriginal if original == CompressionMethod::Stored => {
                CompressionMethod::Stored
            }
            CompressionPolicy::PreserveOriginal | CompressionPolicy::Deflated => {
                CompressionMethod::Deflated
            }
            CompressionPolicy::Stored => CompressionMethod::Stored,
        }
    }
}

/// Requests that an ongoing rewrite stop before its next entry.
///
/// Clones share the same flag. A cancelled rewrite returns
/// [`Error::Cancelled`](crate::Error::Cancelled) and leaves the destination
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the rewrite.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Checks if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl PartialEq for CancellationToken {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

impl Eq for CancellationToken {}

/// Options for [`ArchiveRewriter`](super::ArchiveRewriter).
///
/// # Example
///
/// ```rust
/// use jarmod::{CompressionPolicy, RewriteOptions};
///
/// let options = RewriteOptions::new()
///     .compression(CompressionPolicy::Deflated)
///     .level(9)
///     .preserve_timestamps(false);
/// assert_eq!(options.level, Some(9));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Compression of rewritten entries.
    pub compression: CompressionPolicy,
    /// Deflate level (0-9), or `None` for the library default.
    pub level: Option<u32>,
    /// Carry each rewritten entry's modification time over.
    pub preserve_timestamps: bool,
    /// Carry each rewritten entry's Unix permissions over.
    pub preserve_permissions: bool,
    /// Token checked before each entry.
    pub cancellation: Option<CancellationToken>,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            compression: CompressionPolicy::default(),
            level: None,
            preserve_timestamps: true,
            preserve_permissions: true,
            cancellation: None,
        }
    }
}

impl RewriteOptions {
    /// Creates options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression policy.
    pub fn compression(mut self, compression: CompressionPolicy) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the deflate level. Values above 9 are clamped to 9.
    pub fn level(mut self, level: u32) -> Self {
        self.level = Some(level.min(9));
        self
    }

    /// Sets whether modification times are preserved.
    pub fn preserve_timestamps(mut self, preserve: bool) -> Self {
        self.preserve_timestamps = preserve;
        self
    }

    /// Sets whether Unix permissions are preserved.
    pub fn preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    /// Sets a token that can stop the rewrite between entries.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let options = RewriteOptions::new().cancellation(token.clone());
        assert!(!options.is_cancelled());
        token.cancel();
        assert!(options.is_cancelled());
        assert!(!RewriteOptions::new().is_cancelled());
    }

    #[test]
    fn test_preserve_original() {
        let policy = CompressionPolicy::PreserveOriginal;
        assert_eq!(
            policy.method_for(CompressionMethod::Stored),
            CompressionMethod::Stored
        );
        assert_eq!(
            policy.method_for(CompressionMethod::Deflated),
            CompressionMethod::Deflated
        );
    }

    #[test]
    fn test_forced_methods() {
        assert_eq!(
            CompressionPolicy::Stored.method_for(CompressionMethod::Deflated),
            CompressionMethod::Stored
        );
        assert_eq!(
            CompressionPolicy::Deflated.method_for(CompressionMethod::Stored),
            CompressionMethod::Deflated
        );
    }

    #[test]
    fn test_level_clamped() {
        assert_eq!(RewriteOptions::new().level(42).level, Some(9));
        assert_eq!(RewriteOptions::default().level, None);
        assert!(RewriteOptions::default().preserve_timestamps);
    }
}
