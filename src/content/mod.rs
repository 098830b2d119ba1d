//! Content-type detection and rendering
//!
//! Documents carry raw text in one of four formats. [`classify`] sniffs the
//! format heuristically; [`render`] turns raw content into a display-safe
//! representation per format. Misclassification is a UX nuisance, not a
//! correctness bug: the explicit override path is first-class via
//! [`TypeSelection`].

pub mod classify;
pub mod render;

pub use classify::{classify, TypeSelection, AUTO_DETECT_MIN_LEN};
pub use render::{
    preview, render, CsvTable, RenderedContent, HTML_EMBED_ALLOW, PREVIEW_MAX_LEN,
};

use serde::{Deserialize, Serialize};

/// The four content formats a document may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    #[default]
    Text,
    Html,
    Csv,
    Markdown,
}

impl DocumentType {
    /// Human-readable label for display
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Text => "Text",
            DocumentType::Html => "HTML",
            DocumentType::Csv => "CSV",
            DocumentType::Markdown => "Markdown",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
