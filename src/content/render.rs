//! Per-type content rendering
//!
//! Pure transformations from raw document text into display-safe
//! representations. HTML sandboxing happens at the embedding boundary, not
//! here: the renderer only hands back the raw source together with the
//! capability allow-list the embedder must enforce.

use super::DocumentType;

/// Default bound for list-view previews
pub const PREVIEW_MAX_LEN: usize = 150;

/// How many leading lines a CSV preview shows
const CSV_PREVIEW_LINES: usize = 3;

/// Capabilities the isolated embedding context may grant to raw HTML
/// documents. Same-origin access stays off: user content never executes in
/// the host's trust domain.
pub const HTML_EMBED_ALLOW: &[&str] = &["allow-scripts"];

/// Parsed CSV content: first non-blank line as headers, the rest as rows.
///
/// Cells are split naively on commas and trimmed; embedded commas and quoted
/// fields are not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Display-safe representation of a document body
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedContent {
    /// Plain text, literal line breaks preserved
    Text(String),
    /// CSV parsed into headers and data rows
    Table(CsvTable),
    /// Escaped markup fragment produced from the markdown subset
    Markup(String),
    /// Raw HTML for sandboxed embedding; the raw-source view is always
    /// available from `source`
    Html { source: String },
    /// Content with nothing to show (e.g. blank CSV input)
    Empty,
}

/// Render raw content according to its type
pub fn render(content: &str, document_type: DocumentType) -> RenderedContent {
    match document_type {
        DocumentType::Text => RenderedContent::Text(content.to_string()),
        DocumentType::Csv => match parse_csv(content) {
            Some(table) => RenderedContent::Table(table),
            None => RenderedContent::Empty,
        },
        DocumentType::Markdown => RenderedContent::Markup(render_markdown(content)),
        DocumentType::Html => RenderedContent::Html {
            source: content.to_string(),
        },
    }
}

fn parse_csv(content: &str) -> Option<CsvTable> {
    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());
    let header_line = lines.next()?;
    let headers = split_cells(header_line);
    let rows = lines.map(split_cells).collect();
    Some(CsvTable { headers, rows })
}

fn split_cells(line: &str) -> Vec<String> {
    line.split(',').map(|cell| cell.trim().to_string()).collect()
}

// --- Markdown ---
//
// A restricted markdown subset rendered by a single-pass line scanner with
// an explicit inline precedence: code span, then link, then bold, then
// italic. The grammar's limits are deliberate: headings 1-3, no nested
// emphasis, no tables.

fn render_markdown(content: &str) -> String {
    let mut out = String::new();
    let mut fence: Option<Vec<&str>> = None;

    for line in content.lines() {
        if line.trim_start().starts_with("```") {
            match fence.take() {
                Some(code_lines) => {
                    out.push_str("<pre><code>");
                    out.push_str(&escape_html(&code_lines.join("\n")));
                    out.push_str("</code></pre>\n");
                }
                // Opening fence; any language tag is ignored
                None => fence = Some(Vec::new()),
            }
            continue;
        }
        if let Some(code_lines) = fence.as_mut() {
            code_lines.push(line);
            continue;
        }

        if let Some(rest) = line.strip_prefix("### ") {
            out.push_str("<h3>");
            out.push_str(&render_inline(rest));
            out.push_str("</h3>\n");
        } else if let Some(rest) = line.strip_prefix("## ") {
            out.push_str("<h2>");
            out.push_str(&render_inline(rest));
            out.push_str("</h2>\n");
        } else if let Some(rest) = line.strip_prefix("# ") {
            out.push_str("<h1>");
            out.push_str(&render_inline(rest));
            out.push_str("</h1>\n");
        } else if let Some(rest) = line
            .strip_prefix("- ")
            .or_else(|| line.strip_prefix("* "))
        {
            out.push_str("<li>");
            out.push_str(&render_inline(rest));
            out.push_str("</li>\n");
        } else if line.trim().is_empty() {
            out.push_str("<br>\n");
        } else {
            out.push_str(&render_inline(line));
            out.push_str("<br>\n");
        }
    }

    // Unterminated fence: emit what accumulated rather than dropping it
    if let Some(code_lines) = fence {
        out.push_str("<pre><code>");
        out.push_str(&escape_html(&code_lines.join("\n")));
        out.push_str("</code></pre>\n");
    }

    out
}

/// Inline scan of a single line. Precedence: code span, link, bold, italic;
/// everything else is escaped text. Emphasis does not nest.
fn render_inline(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '`' => {
                if let Some(end) = find_char(&chars, i + 1, '`') {
                    out.push_str("<code>");
                    out.push_str(&escape_html(&collect(&chars[i + 1..end])));
                    out.push_str("</code>");
                    i = end + 1;
                } else {
                    out.push('`');
                    i += 1;
                }
            }
            '[' => {
                if let Some((label, url, next)) = parse_link(&chars, i) {
                    out.push_str("<a href=\"");
                    out.push_str(&escape_html(&url));
                    out.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
                    out.push_str(&escape_html(&label));
                    out.push_str("</a>");
                    i = next;
                } else {
                    out.push('[');
                    i += 1;
                }
            }
            '*' => {
                if i + 1 < chars.len() && chars[i + 1] == '*' {
                    if let Some(end) = find_pair(&chars, i + 2) {
                        out.push_str("<strong>");
                        out.push_str(&escape_html(&collect(&chars[i + 2..end])));
                        out.push_str("</strong>");
                        i = end + 2;
                        continue;
                    }
                } else if let Some(end) = find_char(&chars, i + 1, '*') {
                    out.push_str("<em>");
                    out.push_str(&escape_html(&collect(&chars[i + 1..end])));
                    out.push_str("</em>");
                    i = end + 1;
                    continue;
                }
                out.push('*');
                i += 1;
            }
            c => {
                push_escaped(&mut out, c);
                i += 1;
            }
        }
    }

    out
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

fn find_char(chars: &[char], from: usize, needle: char) -> Option<usize> {
    (from..chars.len()).find(|&j| chars[j] == needle)
}

fn find_pair(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len().saturating_sub(1)).find(|&j| chars[j] == '*' && chars[j + 1] == '*')
}

/// Parse `[label](url)` starting at the `[`. Returns the label, url, and the
/// index just past the closing parenthesis.
fn parse_link(chars: &[char], start: usize) -> Option<(String, String, usize)> {
    let close_bracket = find_char(chars, start + 1, ']')?;
    if chars.get(close_bracket + 1) != Some(&'(') {
        return None;
    }
    let close_paren = find_char(chars, close_bracket + 2, ')')?;
    let label = collect(&chars[start + 1..close_bracket]);
    let url = collect(&chars[close_bracket + 2..close_paren]);
    Some((label, url, close_paren + 1))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut out, c);
    }
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        c => out.push(c),
    }
}

// --- Previews ---

/// Bounded summary for list views: per-type syntax stripping followed by
/// truncation with an ellipsis marker. CSV instead shows up to the first
/// three lines plus a count of the remainder.
pub fn preview(content: &str, document_type: DocumentType, max_len: usize) -> String {
    match document_type {
        DocumentType::Csv => preview_csv(content),
        DocumentType::Markdown => truncate_chars(&strip_markdown(content), max_len),
        DocumentType::Html => truncate_chars(&strip_tags(content), max_len),
        DocumentType::Text => truncate_chars(content, max_len),
    }
}

fn preview_csv(content: &str) -> String {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let shown = lines.len().min(CSV_PREVIEW_LINES);
    let mut out = lines[..shown].join("\n");
    let remaining = lines.len() - shown;
    if remaining > 0 {
        out.push_str(&format!("\n(+{} more lines)", remaining));
    }
    out
}

fn strip_markdown(content: &str) -> String {
    let mut pieces = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with("```") {
            continue;
        }
        let line = line
            .strip_prefix("### ")
            .or_else(|| line.strip_prefix("## "))
            .or_else(|| line.strip_prefix("# "))
            .or_else(|| line.strip_prefix("- "))
            .or_else(|| line.strip_prefix("* "))
            .unwrap_or(line);
        let stripped = strip_inline(line);
        if !stripped.is_empty() {
            pieces.push(stripped);
        }
    }
    pieces.join(" ")
}

/// Drop inline markers, keeping the text they wrap; links reduce to their
/// label
fn strip_inline(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '`' | '*' => i += 1,
            '[' => {
                if let Some((label, _, next)) = parse_link(&chars, i) {
                    out.push_str(&label);
                    i = next;
                } else {
                    out.push('[');
                    i += 1;
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out.trim().to_string()
}

fn strip_tags(content: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    for c in content.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max_len).collect();
        out.push_str("...");
        out
    }
}
