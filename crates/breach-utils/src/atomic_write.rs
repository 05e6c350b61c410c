//! Atomic file writes for rendered documents and configuration files
//!
//! Content is written to a temporary file in the target directory, fsynced,
//! then renamed over the target. Bytes are written verbatim: file contents
//! embedded in a document must survive byte-for-byte, so line endings are
//! never normalized here.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

/// Result of an atomic write operation
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteResult {
    /// Number of bytes written
    pub bytes_written: usize,
    /// Whether cross-filesystem fallback was used
    pub used_cross_filesystem_fallback: bool,
}

/// Atomically write content to a file using temp file + fsync + rename
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<AtomicWriteResult> {
    let mut result = AtomicWriteResult {
        bytes_written: content.len(),
        ..AtomicWriteResult::default()
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create parent directory: {parent}"))?;

    let mut temp_file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in: {parent}"))?;

    temp_file
        .write_all(content.as_bytes())
        .context("Failed to write content to temporary file")?;
    temp_file
        .as_file()
        .sync_all()
        .context("Failed to fsync temporary file")?;

    let temp_path = temp_file.path().to_path_buf();

    match temp_file.persist(path.as_std_path()) {
        Ok(_) => {}
        Err(e) if is_cross_filesystem_error(&e.error) => {
            result.used_cross_filesystem_fallback = true;
            cross_filesystem_copy_from_path(&temp_path, path)?;
        }
        Err(e) => {
            return Err(anyhow::anyhow!(e.error))
                .with_context(|| format!("Failed to atomically write file: {path}"));
        }
    }

    Ok(result)
}

#[cfg(unix)]
fn is_cross_filesystem_error(err: &std::io::Error) -> bool {
    err.raw_os_error() == Some(18) // EXDEV
}

#[cfg(windows)]
fn is_cross_filesystem_error(err: &std::io::Error) -> bool {
    err.raw_os_error() == Some(17) // ERROR_NOT_SAME_DEVICE
}

#[cfg(not(any(unix, windows)))]
fn is_cross_filesystem_error(_err: &std::io::Error) -> bool {
    false
}

/// Fallback for renames across filesystems: copy, fsync, then replace
fn cross_filesystem_copy_from_path(temp_path: &Path, target: &Utf8Path) -> Result<()> {
    let staged = target.with_extension("breach-tmp");
    fs::copy(temp_path, &staged)
        .with_context(|| format!("Failed to copy temporary file to: {staged}"))?;
    fs::File::open(&staged)
        .and_then(|f| f.sync_all())
        .with_context(|| format!("Failed to fsync staged file: {staged}"))?;
    fs::rename(&staged, target)
        .with_context(|| format!("Failed to replace target file: {target}"))?;
    let _ = fs::remove_file(temp_path);
    Ok(())
}
