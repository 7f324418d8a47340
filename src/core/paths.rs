use std::fs;
use std::path::{Path, PathBuf};

use super::error::Result;

pub const DEFAULT_PDFS_DIR: &str = "pdfs";
pub const DEFAULT_INDEXES_DIR: &str = "gpt_indexes";

/// Directory under the index root holding in-progress builds. Never an index.
pub const STAGING_DIR: &str = ".docuchat-staging";

/// On-disk layout: managed source PDFs and one index directory per document.
#[derive(Debug, Clone, PartialEq)]
pub struct AppPaths {
    pub pdfs: PathBuf,
    pub indexes: PathBuf,
}

impl AppPaths {
    pub fn new(pdfs: impl Into<PathBuf>, indexes: impl Into<PathBuf>) -> Self {
        Self {
            pdfs: pdfs.into(),
            indexes: indexes.into(),
        }
    }

    pub fn from_root(root: &Path) -> Self {
        Self::new(root.join(DEFAULT_PDFS_DIR), root.join(DEFAULT_INDEXES_DIR))
    }

    pub fn required_folders(&self) -> Vec<(&PathBuf, &str)> {
        vec![
            (&self.pdfs, "Managed PDF documents"),
            (&self.indexes, "Persisted document indexes"),
        ]
    }

    /// Create the managed PDFs directory and the index root if absent.
    pub fn ensure_dirs(&self) -> Result<()> {
        for (path, purpose) in self.required_folders() {
            if !path.exists() {
                fs::create_dir_all(path)?;
                tracing::debug!(path = %path.display(), purpose, "created directory");
            }
        }
        Ok(())
    }

    pub fn index_dir(&self, name: &str) -> PathBuf {
        self.indexes.join(name)
    }

    /// Names of persisted indexes, sorted. The staging directory is skipped.
    pub fn list_indexes(&self) -> Result<Vec<String>> {
        if !self.indexes.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.indexes)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name != STAGING_DIR {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// `*.pdf` files in the managed directory, as paths joined onto it.
    pub fn list_managed_pdfs(&self) -> Vec<PathBuf> {
        let Some(dir) = self.pdfs.to_str() else {
            return Vec::new();
        };
        let pattern = PathBuf::from(glob::Pattern::escape(dir)).join("*.pdf");
        let pattern = pattern.to_string_lossy();

        let mut docs: Vec<PathBuf> = match glob::glob(&pattern) {
            Ok(paths) => paths.filter_map(|p| p.ok()).filter(|p| p.is_file()).collect(),
            Err(e) => {
                tracing::warn!("invalid glob pattern {}: {}", pattern, e);
                Vec::new()
            }
        };
        docs.sort();
        docs
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new(DEFAULT_PDFS_DIR, DEFAULT_INDEXES_DIR)
    }
}
