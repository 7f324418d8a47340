use std::path::{Path, PathBuf};

use super::error::{DocuchatError, Result};
use super::paths::{AppPaths, STAGING_DIR};

/// How the caller referenced the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddMode {
    /// File lives in the managed PDFs directory and is referenced by base name.
    Managed,
    /// Caller supplied a full path.
    Absolute,
}

/// A PDF to be indexed: where to read it from and the name its index is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub name: String,
    pub mode: AddMode,
}

impl SourceDocument {
    pub fn managed(paths: &AppPaths, file: &Path) -> Result<Self> {
        let name = base_name(file)?;
        Ok(Self {
            path: paths.pdfs.join(&name),
            name,
            mode: AddMode::Managed,
        })
    }

    pub fn absolute(file: &Path) -> Result<Self> {
        Ok(Self {
            name: base_name(file)?,
            path: file.to_path_buf(),
            mode: AddMode::Absolute,
        })
    }

    pub fn index_dir(&self, paths: &AppPaths) -> PathBuf {
        paths.index_dir(&self.name)
    }
}

fn base_name(file: &Path) -> Result<String> {
    file.file_name()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty() && *s != STAGING_DIR)
        .map(String::from)
        .ok_or_else(|| DocuchatError::InvalidDocumentPath(file.to_path_buf()))
}
