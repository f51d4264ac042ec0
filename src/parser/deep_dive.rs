use super::lines::{classify_lines, Line};
use crate::record::{Record, Relevance};
use crate::topics::TopicClassifier;

const SECTION_PREFIXES: &[&str] = &["key findings", "key takeaways"];
const TITLE_CHARS: usize = 100;

/// Extract one high-relevance record per list item of the document's
/// "Key Findings" / "Key Takeaways" section.
pub fn parse_deep_dive(markdown: &str, source: &str, classifier: &TopicClassifier) -> Vec<Record> {
    key_findings(markdown)
        .into_iter()
        .map(|item| Record {
            source: source.to_string(),
            title: item.chars().take(TITLE_CHARS).collect(),
            url: None,
            relevance: Relevance::High,
            topics: classifier.classify(&item),
            raw: item.clone(),
            excerpts: vec![item],
        })
        .collect()
}

/// List items of the first key-findings section, which runs until the next
/// heading of level 2 or deeper.
fn key_findings(markdown: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut inside = false;

    for line in classify_lines(markdown) {
        match line {
            Line::Heading { level, text } if level >= 2 => {
                if inside {
                    break;
                }
                inside = level == 2 && is_key_findings_heading(&text);
            }
            Line::ListItem(item) if inside => items.push(item),
            _ => {}
        }
    }

    items
}

fn is_key_findings_heading(text: &str) -> bool {
    let lower = text.to_lowercase();
    SECTION_PREFIXES.iter().any(|p| lower.starts_with(p))
}
