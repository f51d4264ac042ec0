/// Built-in topic vocabulary, matched as plain lowercase substrings.
pub const DEFAULT_TOPICS: &[&str] = &[
    "rag",
    "llm",
    "embedding",
    "vector",
    "chunk",
    "retrieval",
    "architecture",
    "implementation",
    "performance",
    "latency",
    "accuracy",
    "benchmark",
    "production",
    "scalability",
    "api",
    "model",
    "training",
    "inference",
    "fine-tuning",
];

/// Keyword-containment classifier over a closed vocabulary.
///
/// No stemming and no word boundaries: "rag" matches inside "storage".
#[derive(Debug, Clone)]
pub struct TopicClassifier {
    keywords: Vec<String>,
}

impl TopicClassifier {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: Vec<String> = Vec::new();
        for kw in keywords {
            let kw = kw.as_ref().trim().to_lowercase();
            if !kw.is_empty() && !seen.contains(&kw) {
                seen.push(kw);
            }
        }
        TopicClassifier { keywords: seen }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Topics whose keyword occurs in `text`, in vocabulary order.
    pub fn classify(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|kw| lower.contains(kw.as_str()))
            .cloned()
            .collect()
    }
}

impl Default for TopicClassifier {
    fn default() -> Self {
        TopicClassifier::new(DEFAULT_TOPICS)
    }
}
