//! Fixture helpers shared by unit and integration tests

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// Write each `(relative path, content)` pair under `root`, creating parents
pub fn write_tree(root: &Utf8Path, files: &[(&str, &str)]) -> Result<()> {
    for (relative, content) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create fixture directory: {parent}"))?;
        }
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write fixture file: {path}"))?;
    }
    Ok(())
}

/// Create a temporary directory populated with `files`
///
/// The `TempDir` must be kept alive for as long as the tree is used.
pub fn temp_tree(files: &[(&str, &str)]) -> Result<(TempDir, Utf8PathBuf)> {
    let temp = TempDir::new()?;
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf())?;
    write_tree(&root, files)?;
    Ok((temp, root))
}

/// A string of exactly `tokens` estimated tokens (7 chars per 2 tokens)
#[must_use]
pub fn content_with_tokens(tokens: usize) -> String {
    let chars = tokens * 7 / 2;
    "x".repeat(chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_tree_writes_nested_files() -> Result<()> {
        let (_temp, root) = temp_tree(&[("src/lib.rs", "pub fn a() {}"), ("README.md", "# hi")])?;
        assert_eq!(std::fs::read_to_string(root.join("src/lib.rs"))?, "pub fn a() {}");
        assert!(root.join("README.md").is_file());
        Ok(())
    }
}
