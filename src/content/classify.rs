//! Heuristic content-type detection
//!
//! `classify` is pure, deterministic, and total: it always returns a type
//! and never fails. The heuristics run in fixed order and the first match
//! wins: html, then csv, then markdown, with text as the fallback.

use super::DocumentType;

/// Minimum trimmed content length before auto-detection is applied; shorter
/// fragments produce too many false positives
pub const AUTO_DETECT_MIN_LEN: usize = 50;

/// Detect the content type of a raw document body
pub fn classify(content: &str) -> DocumentType {
    let trimmed = content.trim();

    if looks_like_html(trimmed) {
        return DocumentType::Html;
    }
    if looks_like_csv(trimmed) {
        return DocumentType::Csv;
    }
    if looks_like_markdown(trimmed) {
        return DocumentType::Markdown;
    }
    DocumentType::Text
}

fn looks_like_html(content: &str) -> bool {
    let lower = content.to_lowercase();
    lower.contains("<!doctype")
        || (lower.contains("<html") && lower.contains("</html>"))
        || lower.contains("<head>")
        || lower.contains("<body>")
}

fn looks_like_csv(content: &str) -> bool {
    let mut lines = content.lines().map(str::trim).filter(|line| !line.is_empty());
    let (first, second) = match (lines.next(), lines.next()) {
        (Some(first), Some(second)) => (first, second),
        _ => return false,
    };
    let first_commas = first.matches(',').count();
    let second_commas = second.matches(',').count();
    first_commas >= 1
        && second_commas >= 1
        && first_commas.abs_diff(second_commas) <= 1
}

fn looks_like_markdown(content: &str) -> bool {
    content.contains("# ")
        || content.contains("**")
        || content.contains("```")
        || content.contains("- ")
        || content.contains("* ")
}

/// Tracks the effective document type across edits.
///
/// An explicit selection takes precedence until the content changes again;
/// auto-detection only re-runs once the trimmed content exceeds the
/// threshold, so short fragments never override a prior choice.
#[derive(Debug, Clone)]
pub struct TypeSelection {
    current: DocumentType,
    threshold: usize,
}

impl TypeSelection {
    pub fn new() -> Self {
        Self {
            current: DocumentType::Text,
            threshold: AUTO_DETECT_MIN_LEN,
        }
    }

    /// Use a custom auto-detection threshold
    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            current: DocumentType::Text,
            threshold,
        }
    }

    /// Start from a previously stored type (edit mode)
    pub fn from_existing(document_type: DocumentType) -> Self {
        Self {
            current: document_type,
            threshold: AUTO_DETECT_MIN_LEN,
        }
    }

    /// Record an explicit user selection
    pub fn select(&mut self, document_type: DocumentType) {
        self.current = document_type;
    }

    /// Re-run detection after a content edit. Advisory: below the threshold
    /// the last selection stands.
    pub fn content_changed(&mut self, content: &str) {
        if content.trim().chars().count() > self.threshold {
            self.current = classify(content);
        }
    }

    /// The currently effective type
    pub fn effective(&self) -> DocumentType {
        self.current
    }
}

impl Default for TypeSelection {
    fn default() -> Self {
        Self::new()
    }
}
