use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::topics::{TopicClassifier, DEFAULT_TOPICS};

/// Optional per-session settings file, looked up in the session root.
pub const SETTINGS_FILE: &str = "research-merge.toml";

const ENV_PREFIX: &str = "RESEARCH";

/// Merge tunables. Missing keys fall back to the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Topic vocabulary for keyword classification.
    pub topics: Vec<String>,
    /// Topics rendered in full detail.
    pub top_topics: usize,
    /// Records shown per topic.
    pub per_topic: usize,
    /// Duplicate-URL groups listed.
    pub duplicate_groups: usize,
    /// Entries in the flat high-relevance list.
    pub high_relevance: usize,
    /// Block-quote excerpts kept per search result.
    pub max_excerpts: usize,
    /// Characters of block text kept in `Record::raw`.
    pub raw_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            top_topics: 10,
            per_topic: 5,
            duplicate_groups: 10,
            high_relevance: 15,
            max_excerpts: 3,
            raw_chars: 500,
        }
    }
}

impl Settings {
    /// Layer: defaults < settings file < `RESEARCH_*` environment.
    ///
    /// An explicit file must exist; the session-root file is optional.
    pub fn load(explicit: Option<&Path>, session_root: Option<&Path>) -> Result<Self> {
        Self::build(explicit, session_root, environment())
    }

    fn build(
        explicit: Option<&Path>,
        session_root: Option<&Path>,
        env: Environment,
    ) -> Result<Self> {
        let mut builder = Config::builder();
        match (explicit, session_root) {
            (Some(path), _) => {
                builder = builder.add_source(File::from(path).required(true));
            }
            (None, Some(root)) => {
                builder = builder.add_source(File::from(root.join(SETTINGS_FILE)).required(false));
            }
            (None, None) => {}
        }
        let settings = builder
            .add_source(env)
            .build()
            .context("Failed to load settings")?
            .try_deserialize::<Settings>()
            .context("Invalid settings")?;
        Ok(settings)
    }

    pub fn classifier(&self) -> TopicClassifier {
        TopicClassifier::new(&self.topics)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("topics")
}
