use std::sync::LazyLock;

use regex::Regex;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})(?:\s+(.*))?$").unwrap());
static LIST_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:\d+\.\s*|[-*]\s+)(.+)$").unwrap());

/// Structural kind of a single markdown line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Heading { level: u8, text: String },
    Quote(String),
    ListItem(String),
    Text(String),
    Empty,
}

/// Classify every line of `markdown`, one `Line` per input line, so the
/// result zips with `markdown.lines()`.
pub fn classify_lines(markdown: &str) -> Vec<Line> {
    markdown.lines().map(classify_line).collect()
}

pub fn classify_line(raw: &str) -> Line {
    let line = raw.trim();

    if line.is_empty() {
        return Line::Empty;
    }

    // ── Heading: ### text ──
    if let Some(caps) = HEADING_RE.captures(line) {
        return Line::Heading {
            level: caps[1].len() as u8,
            text: caps.get(2).map(|m| m.as_str().trim()).unwrap_or("").to_string(),
        };
    }

    // ── Block quote: > text ──
    if let Some(rest) = line.strip_prefix('>') {
        return Line::Quote(rest.trim().to_string());
    }

    // ── List item: "- x", "* x", "1. x" ──
    if let Some(caps) = LIST_ITEM_RE.captures(line) {
        return Line::ListItem(caps[1].trim().to_string());
    }

    Line::Text(line.to_string())
}
