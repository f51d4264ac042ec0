use std::collections::HashMap;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::parser::{parse_document, DocumentKind};
use crate::record::{Record, DEEP_DIVE_PREFIX};
use crate::session::{self, Session, DEEP_DIVES_DIR, SEARCH_RESULTS_DIR};
use crate::settings::Settings;
use crate::topics::TopicClassifier;

/// Accumulates records during the collection phase. `freeze` ends it.
pub struct FindingsCollector<'a> {
    settings: &'a Settings,
    classifier: TopicClassifier,
    records: Vec<Record>,
}

impl<'a> FindingsCollector<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        let classifier = settings.classifier();
        debug!("topic vocabulary: {}", classifier.keywords().join(", "));
        FindingsCollector {
            settings,
            classifier,
            records: Vec::new(),
        }
    }

    /// Parse one document and append its records. Returns how many were added.
    pub fn add_document(&mut self, kind: DocumentKind, markdown: &str, source: &str) -> usize {
        let parsed = parse_document(kind, markdown, source, &self.classifier, self.settings);
        let added = parsed.len();
        self.records.extend(parsed);
        added
    }

    /// Build both indexes and hand over a read-only corpus.
    pub fn freeze(self) -> Corpus {
        let urls = build_index(&self.records, |r| r.url().into_iter().collect());
        let topics = build_index(&self.records, |r| r.topics.iter().map(String::as_str).collect());
        Corpus {
            records: self.records,
            urls,
            topics,
        }
    }
}

/// Index bucket: a key and the positions of the records carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub key: String,
    pub members: Vec<usize>,
}

/// Buckets come out in order of first occurrence.
fn build_index<'r, F>(records: &'r [Record], keys: F) -> Vec<Bucket>
where
    F: Fn(&'r Record) -> Vec<&'r str>,
{
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::new();
    for (i, record) in records.iter().enumerate() {
        for key in keys(record) {
            let slot = *slots.entry(key).or_insert_with(|| {
                buckets.push(Bucket {
                    key: key.to_string(),
                    members: Vec::new(),
                });
                buckets.len() - 1
            });
            buckets[slot].members.push(i);
        }
    }
    buckets
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub url: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCoverage {
    pub source: String,
    pub total: usize,
    pub high: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicCount {
    pub topic: String,
    pub findings: usize,
}

/// Counts that must not change between two merges of the same session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub total_findings: usize,
    pub search_findings: usize,
    pub deep_dive_findings: usize,
    pub unique_urls: usize,
    pub topics: Vec<TopicCount>,
    pub duplicates: Vec<DuplicateGroup>,
}

/// All records of one merge run plus the URL and topic indexes.
#[derive(Debug, Clone)]
pub struct Corpus {
    records: Vec<Record>,
    urls: Vec<Bucket>,
    topics: Vec<Bucket>,
}

impl Corpus {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    pub fn search_result_count(&self) -> usize {
        self.records().iter().filter(|r| !r.is_deep_dive()).count()
    }

    pub fn deep_dive_count(&self) -> usize {
        self.records().iter().filter(|r| r.is_deep_dive()).count()
    }

    pub fn url_buckets(&self) -> &[Bucket] {
        &self.urls
    }

    /// Topic buckets in discovery order of the label.
    pub fn topic_buckets(&self) -> &[Bucket] {
        &self.topics
    }

    pub fn unique_urls(&self) -> usize {
        self.url_buckets().len()
    }

    pub fn sorted_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.url_buckets().iter().map(|b| b.key.as_str()).collect();
        urls.sort_unstable();
        urls
    }

    pub fn members<'c>(&'c self, bucket: &'c Bucket) -> impl Iterator<Item = &'c Record> + 'c {
        bucket.members.iter().map(move |&i| &self.records[i])
    }

    /// Largest topics first; equal sizes keep discovery order.
    pub fn ranked_topics(&self) -> Vec<&Bucket> {
        let mut ranked: Vec<&Bucket> = self.topics.iter().collect();
        ranked.sort_by(|a, b| b.members.len().cmp(&a.members.len()));
        ranked
    }

    /// URLs seen in more than one distinct source, first occurrence first.
    pub fn duplicate_groups(&self, limit: usize) -> Vec<DuplicateGroup> {
        self.url_buckets()
            .iter()
            .filter_map(|bucket| {
                let mut sources: Vec<String> = Vec::new();
                for record in self.members(bucket) {
                    if !sources.contains(&record.source) {
                        sources.push(record.source.clone());
                    }
                }
                (sources.len() > 1).then(|| DuplicateGroup {
                    url: bucket.key.clone(),
                    sources,
                })
            })
            .take(limit)
            .collect()
    }

    /// High-relevance records in corpus order.
    pub fn high_relevance(&self, limit: usize) -> Vec<&Record> {
        self.records()
            .iter()
            .filter(|r| r.is_high_relevance())
            .take(limit)
            .collect()
    }

    /// Per-source totals, largest first; ties keep first-seen order.
    pub fn source_coverage(&self) -> Vec<SourceCoverage> {
        let mut rows: Vec<SourceCoverage> = Vec::new();
        for record in self.records() {
            let idx = match rows.iter().position(|row| row.source == record.source) {
                Some(idx) => idx,
                None => {
                    rows.push(SourceCoverage {
                        source: record.source.clone(),
                        total: 0,
                        high: 0,
                    });
                    rows.len() - 1
                }
            };
            rows[idx].total += 1;
            if record.is_high_relevance() {
                rows[idx].high += 1;
            }
        }
        rows.sort_by(|a, b| b.total.cmp(&a.total));
        rows
    }

    pub fn summary(&self, settings: &Settings) -> MergeSummary {
        MergeSummary {
            total_findings: self.len(),
            search_findings: self.search_result_count(),
            deep_dive_findings: self.deep_dive_count(),
            unique_urls: self.unique_urls(),
            topics: self
                .ranked_topics()
                .into_iter()
                .map(|b| TopicCount {
                    topic: b.key.clone(),
                    findings: b.members.len(),
                })
                .collect(),
            duplicates: self.duplicate_groups(settings.duplicate_groups),
        }
    }
}

/// Collect search results, then deep dives, from a session into a corpus.
///
/// Missing directories contribute nothing; an unreadable file aborts.
pub fn collect_session(session: &Session, settings: &Settings) -> Result<Corpus> {
    let plan = [
        (DocumentKind::SearchResults, SEARCH_RESULTS_DIR, session.search_result_files()?),
        (DocumentKind::DeepDive, DEEP_DIVES_DIR, session.deep_dive_files()?),
    ];

    let total: usize = plan.iter().filter_map(|(_, _, f)| f.as_ref()).map(Vec::len).sum();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut collector = FindingsCollector::new(settings);
    for (kind, dir, files) in plan {
        let Some(files) = files else {
            warn!("No {} directory found in {}", dir, session.root().display());
            continue;
        };
        for path in files {
            let stem = session::file_stem(&path);
            pb.set_message(stem.clone());
            let source = match kind {
                DocumentKind::SearchResults => stem,
                DocumentKind::DeepDive => format!("{}{}", DEEP_DIVE_PREFIX, stem),
            };
            let markdown = session::read_document(&path)?;
            let added = collector.add_document(kind, &markdown, &source);
            debug!(file = %path.display(), records = added, "processed");
            pb.inc(1);
        }
    }
    pb.finish_and_clear();

    let corpus = collector.freeze();
    info!(
        "Collected {} findings ({} URLs, {} topics)",
        corpus.len(),
        corpus.unique_urls(),
        corpus.topic_buckets().len()
    );
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Relevance;
    use std::path::Path;

    const FIXTURE: &str = "tests/fixtures/session/2026-02-04-rag-architecture";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn collect(root: &Path) -> Corpus {
        let session = Session::open(root).unwrap();
        collect_session(&session, &Settings::default()).unwrap()
    }

    fn block(title: &str, url: Option<&str>, relevance: &str) -> String {
        let mut s = format!("### {title}\n");
        if let Some(u) = url {
            s.push_str(&format!("**URL**: {u}\n"));
        }
        s.push_str(&format!("**Relevance**: {relevance}\n\n"));
        s
    }

    #[test]
    fn empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = collect(dir.path());
        assert!(corpus.is_empty());
        assert_eq!(corpus.unique_urls(), 0);
        assert!(corpus.topic_buckets().is_empty());
        assert!(corpus.duplicate_groups(10).is_empty());
    }

    #[test]
    fn single_block_without_url() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "01-search-results/blog.md", "### Embedding drift notes\nplain body\n");
        let corpus = collect(dir.path());
        assert_eq!(corpus.len(), 1);
        assert!(corpus.url_buckets().is_empty());
        let topics: Vec<&str> = corpus.topic_buckets().iter().map(|b| b.key.as_str()).collect();
        assert_eq!(topics, vec!["embedding"]);
    }

    #[test]
    fn cross_source_duplicates_list_both_sources() {
        let dir = tempfile::tempdir().unwrap();
        let shared = "https://example.com/shared";
        let hn = format!(
            "{}{}",
            block("One", Some(shared), "high"),
            block("Solo", Some("https://solo.dev"), "low")
        );
        write(dir.path(), "01-search-results/hn.md", &hn);
        write(dir.path(), "01-search-results/reddit.md", &block("Two", Some(shared), "medium"));
        let corpus = collect(dir.path());

        assert_eq!(corpus.unique_urls(), 2);
        let groups = corpus.duplicate_groups(10);
        assert_eq!(
            groups,
            vec![DuplicateGroup {
                url: shared.to_string(),
                sources: vec!["hn".to_string(), "reddit".to_string()],
            }]
        );
    }

    #[test]
    fn same_source_repeat_is_not_a_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://example.com/again";
        write(
            dir.path(),
            "01-search-results/hn.md",
            &format!("{}{}", block("A", Some(url), "high"), block("B", Some(url), "high")),
        );
        let corpus = collect(dir.path());
        assert_eq!(corpus.url_buckets()[0].members, vec![0, 1]);
        assert!(corpus.duplicate_groups(10).is_empty());
    }

    #[test]
    fn duplicate_groups_are_capped() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = String::new();
        let mut b = String::new();
        for i in 0..12 {
            let url = format!("https://example.com/{i}");
            a.push_str(&block(&format!("a{i}"), Some(&url), "low"));
            b.push_str(&block(&format!("b{i}"), Some(&url), "low"));
        }
        write(dir.path(), "01-search-results/a.md", &a);
        write(dir.path(), "01-search-results/b.md", &b);
        let groups = collect(dir.path()).duplicate_groups(10);
        assert_eq!(groups.len(), 10);
        assert_eq!(groups[0].url, "https://example.com/0");
    }

    #[test]
    fn coverage_matrix_is_skipped_and_order_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "01-search-results/coverage-matrix.md", "### Should not parse\n");
        write(dir.path(), "01-search-results/zeta.md", "### Z\n");
        write(dir.path(), "01-search-results/alpha.md", "### A\n");
        write(dir.path(), "02-deep-dives/dive.md", "## Key Findings\n- D\n");
        let corpus = collect(dir.path());
        let seen: Vec<(&str, &str)> = corpus
            .records()
            .iter()
            .map(|r| (r.source.as_str(), r.title.as_str()))
            .collect();
        assert_eq!(seen, vec![("alpha", "A"), ("zeta", "Z"), ("deep-dive:dive", "D")]);
        assert_eq!(corpus.search_result_count(), 2);
        assert_eq!(corpus.deep_dive_count(), 1);
    }

    #[test]
    fn topics_fan_out_and_rank() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "01-search-results/a.md",
            "### Latency budget\n### Vector latency\n### Vector index\n### Benchmark only\n",
        );
        let corpus = collect(dir.path());
        let ranked: Vec<(&str, usize)> = corpus
            .ranked_topics()
            .iter()
            .map(|b| (b.key.as_str(), b.members.len()))
            .collect();
        // latency discovered before vector, both have 2
        assert_eq!(ranked, vec![("latency", 2), ("vector", 2), ("benchmark", 1)]);
        assert_eq!(corpus.topic_buckets()[1].members, vec![1, 2]);
    }

    #[test]
    fn source_coverage_sorted_by_total() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "01-search-results/a.md", &block("x", None, "high"));
        write(
            dir.path(),
            "01-search-results/b.md",
            &format!("{}{}", block("y", None, "5"), block("z", None, "low")),
        );
        let rows = collect(dir.path()).source_coverage();
        assert_eq!(
            rows,
            vec![
                SourceCoverage { source: "b".into(), total: 2, high: 1 },
                SourceCoverage { source: "a".into(), total: 1, high: 1 },
            ]
        );
    }

    #[test]
    fn high_relevance_is_flat_and_capped() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = String::new();
        for i in 0..20 {
            doc.push_str(&block(&format!("r{i}"), None, if i % 2 == 0 { "high" } else { "4" }));
        }
        doc.push_str(&block("meh", None, "3"));
        write(dir.path(), "01-search-results/a.md", &doc);
        let corpus = collect(dir.path());
        let high = corpus.high_relevance(15);
        assert_eq!(high.len(), 15);
        assert_eq!(high[0].title, "r0");
        assert_eq!(high[14].title, "r14");
        assert!(corpus.records().iter().any(|r| r.relevance == Relevance::Score("3".into())));
    }

    #[test]
    fn invalid_utf8_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("01-search-results/bad.md");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, [0xff, 0xfe, 0xfd]).unwrap();
        let session = Session::open(dir.path()).unwrap();
        let err = collect_session(&session, &Settings::default()).unwrap_err();
        assert!(err.to_string().contains("bad.md"));
    }

    #[test]
    fn merging_twice_gives_identical_summary() {
        let session = Session::open(FIXTURE).unwrap();
        let settings = Settings::default();
        let first = collect_session(&session, &settings).unwrap().summary(&settings);
        let second = collect_session(&session, &settings).unwrap().summary(&settings);
        assert_eq!(first, second);
        assert_eq!(first.total_findings, 8);
        assert_eq!(first.search_findings, 5);
        assert_eq!(first.deep_dive_findings, 3);
        assert_eq!(first.unique_urls, 4);
        assert_eq!(first.duplicates.len(), 1);
        assert_eq!(first.duplicates[0].sources, vec!["github-issues", "stack-overflow"]);
    }
}
