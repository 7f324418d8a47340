use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::error::{DocuchatError, Result};

lazy_static! {
    static ref INLINE_WHITESPACE: Regex = Regex::new(r"[ \t\u{a0}]+").unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Turns a source file into plain text pages.
pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Vec<String>>;
}

/// PDF text extraction.
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> Result<Vec<String>> {
        let raw = pdf_extract::extract_text(path).map_err(|e| DocuchatError::Extraction {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(split_pages(&raw))
    }
}

/// Reads the file as UTF-8 text. Handy for plain-text sources and tests.
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<Vec<String>> {
        let raw = std::fs::read_to_string(path)?;
        Ok(split_pages(&raw))
    }
}

/// Split on form feeds and normalize each page; empty pages are dropped.
pub fn split_pages(raw: &str) -> Vec<String> {
    raw.split('\x0c')
        .map(normalize_text)
        .filter(|page| !page.is_empty())
        .collect()
}

/// Collapse runs of spaces and excess blank lines, trim line ends.
pub fn normalize_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = INLINE_WHITESPACE.replace_all(&text, " ");
    let trimmed: Vec<&str> = text.lines().map(str::trim).collect();
    let joined = trimmed.join("\n");
    BLANK_LINES.replace_all(&joined, "\n\n").trim().to_string()
}
