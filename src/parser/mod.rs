pub mod deep_dive;
pub mod lines;
pub mod results;
pub mod sections;

use crate::record::Record;
use crate::settings::Settings;
use crate::topics::TopicClassifier;

/// Which extraction contract a document follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    SearchResults,
    DeepDive,
}

/// markdown → records, tagged with topics at parse time.
pub fn parse_document(
    kind: DocumentKind,
    markdown: &str,
    source: &str,
    classifier: &TopicClassifier,
    settings: &Settings,
) -> Vec<Record> {
    match kind {
        DocumentKind::SearchResults => {
            results::parse_results(markdown, source, classifier, settings)
        }
        DocumentKind::DeepDive => deep_dive::parse_deep_dive(markdown, source, classifier),
    }
}
