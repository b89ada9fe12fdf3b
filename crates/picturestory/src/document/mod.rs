pub mod extract;
pub mod paragraphs;

use anyhow::Result;
use std::path::{Path, PathBuf};

pub use paragraphs::DocumentParagraph;

/// An opened document: its source path, extracted text and paragraph segmentation.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub paragraphs: Vec<DocumentParagraph>,
    pub line_count: usize,
}

impl Document {
    pub fn open(path: &Path) -> Result<Self> {
        let text = extract::extract_text(path)?;
        let document = Self::from_text(path.to_path_buf(), &text);
        log::info!(
            "Opened {} ({} paragraphs, {} lines)",
            path.display(),
            document.paragraphs.len(),
            document.line_count
        );
        Ok(document)
    }

    pub fn from_text(path: PathBuf, text: &str) -> Self {
        let paragraphs = paragraphs::segment(text);
        let line_count = paragraphs.last().map(|p| p.end_line + 1).unwrap_or(0);
        Self {
            path,
            paragraphs,
            line_count,
        }
    }

    /// File name shown in window titles.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    }
}
