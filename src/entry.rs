//! Archive entries as seen by modifications.

/// One named member of an archive, with its uncompressed content.
///
/// Modifications never mutate an entry; each step of a chain consumes the
/// entry and returns a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Slash-separated path within the archive.
    pub name: String,
    /// Uncompressed content.
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    /// Creates an entry from a name and content.
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Returns `true` if the name denotes a directory.
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }

    /// Returns the final path component.
    pub fn file_name(&self) -> &str {
        let trimmed = self.name.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    /// Returns the entry with a different name and the same content.
    pub fn renamed(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: self.data,
        }
    }

    /// Returns the entry with different content and the same name.
    pub fn with_data(self, data: Vec<u8>) -> Self {
        Self {
            name: self.name,
            data,
        }
    }
}
