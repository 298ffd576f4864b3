//! The archive rewrite loop.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use super::options::RewriteOptions;
use super::staging::StagedArchive;
use crate::modification::{EntryModification, Modification};
use crate::{ArchiveEntry, Error, Result};

/// Result of a rewrite.
#[must_use = "rewrite result should be checked to verify the expected entries were touched"]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteResult {
    /// Entries copied without any modification.
    pub entries_copied: usize,
    /// Entries whose content was rewritten (and possibly renamed).
    pub entries_modified: usize,
    /// Entries that were only renamed; their compressed bytes were copied.
    pub entries_renamed: usize,
    /// Size of the written archive in bytes.
    pub total_bytes: u64,
}

impl RewriteResult {
    /// Returns the number of entries in the written archive.
    pub fn total_entries(&self) -> usize {
        self.entries_copied + self.entries_modified + self.entries_renamed
    }

    /// Returns `true` if any entry was renamed or rewritten.
    pub fn has_changes(&self) -> bool {
        self.entries_modified + self.entries_renamed > 0
    }
}

/// Rewrites archives by applying an ordered list of modifications.
///
/// For each entry, in archive order, the modifications whose `applies_to`
/// accepts the entry name are folded over the entry in declaration order.
/// Entries no modification applies to are copied with their compressed bytes
/// untouched.
///
/// # Example
///
/// ```rust,no_run
/// use jarmod::{ArchiveRewriter, CompressionPolicy, Modification, RewriteOptions};
///
/// # fn main() -> jarmod::Result<()> {
/// let modifications = vec![
///     Modification::rename(r"fabric\.mixins\.json", "mymod.mixins.json")?,
///     Modification::annotation_value("Lnet/neoforged/fml/common/Mod;", "value", "mymod"),
/// ];
///
/// let result = ArchiveRewriter::new(&modifications)
///     .with_options(RewriteOptions::new().compression(CompressionPolicy::Deflated))
///     .rewrite("universal.jar", "mymod.jar")?;
/// println!("{} entries rewritten", result.entries_modified);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ArchiveRewriter<'m, M: EntryModification = Modification> {
    modifications: &'m [M],
    options: RewriteOptions,
}

impl<'m, M: EntryModification> ArchiveRewriter<'m, M> {
    /// Creates a rewriter for the given modifications.
    pub fn new(modifications: &'m [M]) -> Self {
        Self {
            modifications,
            options: RewriteOptions::default(),
        }
    }

    /// Sets the options for rewritten entries.
    pub fn with_options(mut self, options: RewriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Rewrites `source` into `destination`, which may be the same path.
    ///
    /// The new archive is written to a temporary file in the destination's
    /// directory and renamed over the destination once complete. On any
    /// error, neither file is changed.
    ///
    /// # Errors
    ///
    /// - [`Error::EntryTransformFailed`] if a modification fails on an entry.
    /// - [`Error::ArchiveReplaceFailed`] if the temporary file cannot be
    ///   created or renamed over the destination.
    /// - [`Error::Io`] or [`Error::Zip`] for failures reading the source.
    /// - [`Error::Cancelled`] if the options' cancellation token fired.
    pub fn rewrite(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<RewriteResult> {
        let source = source.as_ref();
        let destination = destination.as_ref();
        log::debug!(
            "rewriting {} into {}",
            source.display(),
            destination.display()
        );

        let permissions = fs::metadata(source)?.permissions();
        let staged = StagedArchive::create(destination)?;

        let result = {
            let input = BufReader::new(File::open(source)?);
            let output = BufWriter::new(staged.as_file());
            let (result, mut output) = self.rewrite_to_writer(input, output)?;
            output.flush()?;
            result
        };
        if self.options.is_cancelled() {
            return Err(Error::Cancelled);
        }

        staged.commit(Some(permissions))?;
        log::info!(
            "rewrote {}: {} copied, {} renamed, {} modified",
            destination.display(),
            result.entries_copied,
            result.entries_renamed,
            result.entries_modified
        );
        Ok(result)
    }

    /// Rewrites an archive read from `source` into `output`.
    ///
    /// Returns the result and the finished writer.
    pub fn rewrite_to_writer<R, W>(&self, source: R, output: W) -> Result<(RewriteResult, W)>
    where
        R: Read + Seek,
        W: Write + Seek,
    {
        let mut archive = ZipArchive::new(source)?;
        let mut writer = ZipWriter::new(output);
        let mut result = RewriteResult::default();

        for index in 0..archive.len() {
            if self.options.is_cancelled() {
                log::debug!("cancelled before entry {}", index);
                return Err(Error::Cancelled);
            }
            let (name, is_dir) = {
                let file = archive.by_index_raw(index)?;
                (file.name().to_string(), file.is_dir())
            };

            let applicable: Vec<&M> = self
                .modifications
                .iter()
                .filter(|m| m.applies_to(&name))
                .filter(|m| !(is_dir && m.rewrites_content()))
                .collect();

            if applicable.is_empty() {
                log::debug!("copying {}", name);
                writer.raw_copy_file(archive.by_index_raw(index)?)?;
                result.entries_copied += 1;
                continue;
            }

            if applicable.iter().all(|m| !m.rewrites_content()) {
                let mut new_name = name.clone();
                for modification in &applicable {
                    if modification.applies_to(&new_name) {
                        new_name = modification
                            .rename_entry(&new_name)
                            .map_err(|e| Error::entry_transform(&name, e))?;
                    }
                }
                log::debug!("renaming {} to {} without recompression", name, new_name);
                writer.raw_copy_file_rename(archive.by_index_raw(index)?, new_name.as_str())?;
                result.entries_renamed += 1;
                continue;
            }

            let mut file = archive.by_index(index)?;
            let declared = file.size();
            let data = read_entry_data(&mut file, declared)?;
            let source = SourceEntry {
                compression: file.compression(),
                last_modified: file.last_modified(),
                unix_mode: file.unix_mode(),
            };
            drop(file);

            let mut entry = ArchiveEntry::new(name.clone(), data);
            for modification in &applicable {
                entry = fold_step(*modification, entry)
                    .map_err(|e| Error::entry_transform(&name, e))?;
            }
            log::debug!(
                "transformed {} with {} modification(s)",
                name,
                applicable.len()
            );

            let options = self.entry_options(&source, entry.data.len());
            if entry.is_directory() {
                writer.add_directory(entry.name.as_str(), options)?;
            } else {
                writer.start_file(entry.name.as_str(), options)?;
                writer.write_all(&entry.data)?;
            }
            result.entries_modified += 1;
        }

        let mut output = writer.finish()?;
        result.total_bytes = output.stream_position()?;
        Ok((result, output))
    }

    fn entry_options(&self, source: &SourceEntry, len: usize) -> SimpleFileOptions {
        let mut options = SimpleFileOptions::default()
            .compression_method(self.options.compression.method_for(source.compression))
            .large_file(len as u64 >= u32::MAX as u64);
        if let Some(level) = self.options.level {
            options = options.compression_level(Some(i64::from(level)));
        }
        if self.options.preserve_timestamps {
            if let Some(modified) = source.last_modified {
                options = options.last_modified_time(modified);
            }
        }
        if self.options.preserve_permissions {
            if let Some(mode) = source.unix_mode {
                options = options.unix_permissions(mode);
            }
        }
        options
    }
}

/// Upper bound on the buffer reserved from an entry's declared size.
const PREALLOCATION_LIMIT: u64 = 1 << 20;

/// Reads an entry body. The declared size comes from the archive headers
/// and only sizes the initial buffer up to [`PREALLOCATION_LIMIT`].
fn read_entry_data(mut reader: impl Read, declared: u64) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(declared.min(PREALLOCATION_LIMIT) as usize);
    reader.read_to_end(&mut data)?;
    Ok(data)
}

/// Applies one selected modification during the fold.
///
/// Selection already happened on the original name. A modification whose
/// pattern no longer matches the current name keeps that name and only
/// transforms content.
fn fold_step<M: EntryModification>(modification: &M, entry: ArchiveEntry) -> Result<ArchiveEntry> {
    if modification.applies_to(&entry.name) {
        return modification.apply(entry);
    }
    let data = if modification.rewrites_content() {
        modification.transform_content(entry.data)?
    } else {
        entry.data
    };
    Ok(ArchiveEntry {
        name: entry.name,
        data,
    })
}

/// Metadata of a source entry carried onto its rewritten copy.
struct SourceEntry {
    compression: CompressionMethod,
    last_modified: Option<DateTime>,
    unix_mode: Option<u32>,
}

/// Rewrites `source` into `destination` with the given modifications.
///
/// This is shorthand for [`ArchiveRewriter::new`] followed by
/// [`ArchiveRewriter::rewrite`] with default options. `source` and
/// `destination` may be the same path.
pub fn rewrite_archive(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    modifications: &[Modification],
) -> Result<RewriteResult> {
    ArchiveRewriter::new(modifications).rewrite(source, destination)
}
