use chrono::{DateTime, Local};
use itertools::Itertools;

use super::clip;
use crate::findings::{Bucket, Corpus};
use crate::record::Record;
use crate::settings::Settings;

/// High-relevance members first, then the rest, both in corpus order.
pub fn select_topic_records<'c>(
    corpus: &'c Corpus,
    bucket: &'c Bucket,
    cap: usize,
) -> Vec<&'c Record> {
    let (high, rest): (Vec<&Record>, Vec<&Record>) =
        corpus.members(bucket).partition(|r| r.is_high_relevance());
    high.into_iter().chain(rest).take(cap).collect()
}

/// Render the merged-findings document.
pub fn render(
    corpus: &Corpus,
    settings: &Settings,
    session: &str,
    generated: DateTime<Local>,
) -> String {
    let mut out = String::new();

    out.push_str("# Merged Research Findings\n\n");
    out.push_str(&format!(
        "**Generated**: {}\n**Session**: {}\n**Total Findings**: {}\n**Unique URLs**: {}\n\n---\n\n",
        generated.format("%Y-%m-%dT%H:%M:%S"),
        session,
        corpus.len(),
        corpus.unique_urls()
    ));

    out.push_str("## Summary Statistics\n\n");
    out.push_str(&format!(
        "- **Findings from search results**: {}\n- **Findings from deep dives**: {}\n- **Topics identified**: {}\n\n---\n\n",
        corpus.search_result_count(),
        corpus.deep_dive_count(),
        corpus.topic_buckets().len()
    ));

    out.push_str("## Findings by Topic\n\n");
    for bucket in corpus.ranked_topics().into_iter().take(settings.top_topics) {
        out.push_str(&format!(
            "\n### {} ({} findings)\n\n",
            bucket.key.to_uppercase(),
            bucket.members.len()
        ));
        for record in select_topic_records(corpus, bucket, settings.per_topic) {
            out.push_str(&format!("- **{}**\n", clip(&record.title, 80)));
            out.push_str(&format!("  - Source: {}\n", record.source));
            if let Some(url) = record.url() {
                out.push_str(&format!("  - URL: {}\n", url));
            }
            if let Some(excerpt) = record.excerpts.first() {
                out.push_str(&format!("  - Key: \"{}...\"\n", clip(excerpt, 100)));
            }
            out.push('\n');
        }
    }

    out.push_str("---\n\n## Potential Duplicates\n\n");
    out.push_str("*Findings from multiple sources covering the same URL:*\n\n");
    let duplicates = corpus.duplicate_groups(settings.duplicate_groups);
    if duplicates.is_empty() {
        out.push_str("*No duplicates found*\n");
    }
    for group in &duplicates {
        out.push_str(&format!("- {}\n  - Found in: {}\n", group.url, group.sources.join(", ")));
    }

    out.push_str("\n---\n\n## High Relevance Findings\n\n");
    out.push_str("*Findings marked as high relevance:*\n\n");
    for record in corpus.high_relevance(settings.high_relevance) {
        out.push_str(&format!("### {}\n", clip(&record.title, 80)));
        out.push_str(&format!("- **Source**: {}\n", record.source));
        if let Some(url) = record.url() {
            out.push_str(&format!("- **URL**: {}\n", url));
        }
        let topics = if record.topics.is_empty() {
            "N/A".to_string()
        } else {
            record.topics.iter().join(", ")
        };
        out.push_str(&format!("- **Topics**: {}\n", topics));
        if let Some(excerpt) = record.excerpts.first() {
            out.push_str(&format!("- **Key excerpt**:\n  > {}\n", clip(excerpt, 200)));
        }
        out.push('\n');
    }

    out.push_str("---\n\n## Source Coverage\n\n*Findings per source:*\n\n");
    out.push_str("| Source | Findings | High Relevance |\n");
    out.push_str("|--------|----------|----------------|\n");
    for row in corpus.source_coverage() {
        out.push_str(&format!("| {} | {} | {} |\n", row.source, row.total, row.high));
    }

    let urls = corpus.sorted_urls();
    out.push_str("\n---\n\n## All URLs Referenced\n\n<details>\n");
    out.push_str(&format!("<summary>Click to expand ({} URLs)</summary>\n\n", urls.len()));
    for url in urls {
        out.push_str(&format!("- {}\n", url));
    }
    out.push_str("\n</details>\n");

    out
}
