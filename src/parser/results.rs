use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::lines::{classify_line, classify_lines, Line};
use crate::record::{Record, Relevance};
use crate::settings::Settings;
use crate::topics::TopicClassifier;

static ORDINAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Result\s*\d+(?:[:\s]+|$)").unwrap());
static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*URL\*\*:\s*(\S+)").unwrap());
static RELEVANCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*Relevance\*\*:\s*(\d+|high|medium|low)").unwrap());

/// Split a search-result document into blocks, one per level-3 heading.
///
/// Each block is the heading text (ordinal "Result N:" removed) followed by
/// the raw lines up to the next level-3 heading. Anything before the first
/// heading is dropped.
pub fn split_blocks(markdown: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for (raw, line) in markdown.lines().zip(classify_lines(markdown)) {
        match line {
            Line::Heading { level: 3, .. } => {
                if let Some(lines) = current.take() {
                    blocks.push(lines.join("\n"));
                }
                let heading = raw.trim().trim_start_matches('#').trim();
                current = Some(vec![strip_ordinal(heading)]);
            }
            _ => {
                if let Some(lines) = current.as_mut() {
                    lines.push(raw);
                }
            }
        }
    }

    if let Some(lines) = current {
        blocks.push(lines.join("\n"));
    }

    blocks
}

fn strip_ordinal(heading: &str) -> &str {
    match ORDINAL_RE.find(heading) {
        Some(m) => &heading[m.end()..],
        None => heading,
    }
}

/// Parse every result block of a search-result document.
pub fn parse_results(
    markdown: &str,
    source: &str,
    classifier: &TopicClassifier,
    settings: &Settings,
) -> Vec<Record> {
    split_blocks(markdown)
        .iter()
        .filter_map(|block| parse_block(block, source, classifier, settings))
        .collect()
}

/// Build a record from one block; `None` when the block has no title.
pub fn parse_block(
    block: &str,
    source: &str,
    classifier: &TopicClassifier,
    settings: &Settings,
) -> Option<Record> {
    let title = block.lines().map(str::trim).find(|l| !l.is_empty());
    let Some(title) = title else {
        debug!(source, "dropping untitled block");
        return None;
    };

    let url = block
        .lines()
        .find_map(|l| URL_RE.captures(l).map(|c| c[1].to_string()));

    let relevance = block
        .lines()
        .find_map(|l| RELEVANCE_RE.captures(l).map(|c| Relevance::parse(&c[1])))
        .unwrap_or_default();

    let excerpts = block
        .lines()
        .filter_map(|l| match classify_line(l) {
            Line::Quote(q) if !q.is_empty() => Some(q),
            _ => None,
        })
        .take(settings.max_excerpts)
        .collect();

    Some(Record {
        source: source.to_string(),
        title: title.to_string(),
        url,
        relevance,
        excerpts,
        topics: classifier.classify(block),
        raw: block.chars().take(settings.raw_chars).collect(),
    })
}
