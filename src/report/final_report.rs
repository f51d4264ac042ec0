use std::sync::LazyLock;

use anyhow::Result;
use chrono::{DateTime, Local};
use regex::Regex;

use crate::parser::sections::first_section;
use crate::session::{
    Session, CURRENT_UNDERSTANDING, MERGED_FINDINGS, RESEARCH_PLAN, VERIFICATION_LOG,
};

static ITERATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Iteration[:\s]+(\d+)").unwrap());
static CONFIDENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Confidence Level[:\s]+(\w+)").unwrap());
static FINDING_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#+\s+Finding").unwrap());

const SUMMARY: &[&str] = &["Executive Summary"];
const FINDINGS: &[&str] = &["High Confidence Findings", "Detailed Findings"];
const RECOMMENDATIONS: &[&str] = &["Preliminary Recommendations", "Recommendations"];
const OPEN_QUESTIONS: &[&str] = &["Open Questions", "Remaining Knowledge Gaps"];
const VALIDATION: &[&str] = &["Validation Summary", "Completed Validations"];
const RESEARCH_QUESTION: &[&str] = &["Research Question"];
const URL_SECTION: &[&str] = &["All URLs Referenced"];

/// Headline numbers for the final report. `None` renders as "N/A".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub search_results: usize,
    pub deep_dives: usize,
    pub iterations: Option<u32>,
    pub findings: Option<usize>,
    pub confidence: Option<String>,
}

/// "2026-02-04-rag-architecture" → "Rag Architecture".
pub fn session_topic(name: &str) -> String {
    let parts: Vec<&str> = name.splitn(4, '-').collect();
    if parts.len() < 4 {
        return name.to_string();
    }
    parts[3]
        .split('-')
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Iteration number as written in a synthesis document ("Iteration: 3").
pub fn iteration(text: &str) -> Option<u32> {
    ITERATION_RE.captures(text).and_then(|c| c[1].parse().ok())
}

pub fn collect_stats(session: &Session, synthesis: Option<&str>) -> Result<ReportStats> {
    let mut stats = ReportStats {
        search_results: session.search_result_files()?.map_or(0, |f| f.len()),
        deep_dives: session.deep_dive_files()?.map_or(0, |f| f.len()),
        ..ReportStats::default()
    };

    if let Some(text) = synthesis {
        stats.iterations = Some(iteration(text).unwrap_or(0));
        stats.findings = Some(text.lines().filter(|l| FINDING_HEADING_RE.is_match(l)).count());
        stats.confidence = Some(
            CONFIDENCE_RE
                .captures(text)
                .map(|c| c[1].to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
        );
    }

    Ok(stats)
}

fn or_na<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

fn section_or(text: Option<&str>, names: &[&str], placeholder: &str) -> String {
    text.and_then(|t| first_section(t, names))
        .unwrap_or_else(|| placeholder.to_string())
}

/// Assemble FINAL-REPORT.md from the plan, synthesis, validation log and
/// merged findings. Every missing piece gets a placeholder.
pub fn generate(session: &Session, generated: DateTime<Local>) -> Result<String> {
    let plan = session.read_optional(RESEARCH_PLAN)?;
    let synthesis = session.read_optional(CURRENT_UNDERSTANDING)?;
    let validation = session.read_optional(VERIFICATION_LOG)?;
    let merged = session.read_optional(MERGED_FINDINGS)?;

    let name = session.name();
    let topic = session_topic(&name);
    let stats = collect_stats(session, synthesis.as_deref())?;
    let synthesis = synthesis.as_deref();

    let summary = section_or(
        synthesis,
        SUMMARY,
        "*No executive summary available - synthesis may be incomplete.*",
    );
    let findings = section_or(
        synthesis,
        FINDINGS,
        "*Findings not yet synthesized. See 03-synthesis/current-understanding.md for latest progress.*",
    );
    let recommendations = section_or(
        synthesis,
        RECOMMENDATIONS,
        "*Recommendations not yet formulated. Research may still be in progress.*",
    );
    let open_questions = synthesis.and_then(|t| first_section(t, OPEN_QUESTIONS));
    let validation_summary = section_or(
        validation.as_deref(),
        VALIDATION,
        "*Validation not yet completed.*",
    );

    let mut out = String::new();
    out.push_str(&format!("# Deep Research Report: {}\n\n", topic));
    out.push_str(&format!(
        "**Generated**: {}\n**Session ID**: {}\n**Research Duration**: {} iterations\n**Overall Confidence**: {}\n\n---\n\n",
        generated.format("%Y-%m-%d %H:%M:%S"),
        name,
        or_na(&stats.iterations),
        or_na(&stats.confidence)
    ));

    out.push_str("## Table of Contents\n\n");
    for (i, title) in [
        "Executive Summary",
        "Methodology",
        "Key Findings",
        "Recommendations",
        "Validation Results",
        "Limitations",
        "Further Research",
        "Appendix",
    ]
    .iter()
    .enumerate()
    {
        let anchor = title.to_lowercase().replace(' ', "-");
        out.push_str(&format!("{}. [{}](#{})\n", i + 1, title, anchor));
    }

    out.push_str(&format!("\n---\n\n## Executive Summary\n\n{}\n\n", summary));
    out.push_str("### Quick Statistics\n\n| Metric | Value |\n|--------|-------|\n");
    out.push_str(&format!("| Research Iterations | {} |\n", or_na(&stats.iterations)));
    out.push_str(&format!("| Sources Searched | {} |\n", stats.search_results));
    out.push_str(&format!("| Deep-Dive Analyses | {} |\n", stats.deep_dives));
    out.push_str(&format!("| Findings Documented | {} |\n", or_na(&stats.findings)));
    out.push_str(&format!("| Confidence Level | {} |\n", or_na(&stats.confidence)));

    out.push_str("\n---\n\n## Methodology\n\n");
    out.push_str("Queries were varied for coverage, searched across source tiers, the most promising sources were analysed in depth, and findings were synthesised iteratively and cross-checked.\n\n");
    out.push_str("### Research Questions\n\n");
    if let Some(plan) = plan.as_deref() {
        match first_section(plan, RESEARCH_QUESTION) {
            Some(question) => out.push_str(&format!("{}\n\n", question)),
            None => out.push_str(&format!(
                "*Primary question*: What is the best approach for {}?\n\n",
                topic
            )),
        }
    }

    out.push_str(&format!("---\n\n## Key Findings\n\n{}\n\n", findings));
    out.push_str(&format!("---\n\n## Recommendations\n\n{}\n\n", recommendations));
    out.push_str(&format!("---\n\n## Validation Results\n\n{}\n\n", validation_summary));

    out.push_str("---\n\n## Limitations\n\n");
    out.push_str(&format!(
        "{}\n\n",
        open_questions.as_deref().unwrap_or("*No specific limitations identified yet.*")
    ));

    out.push_str("---\n\n## Further Research\n\n### Remaining Questions\n\n");
    out.push_str(&format!(
        "{}\n\n",
        open_questions.as_deref().unwrap_or("*All primary questions addressed.*")
    ));

    out.push_str("---\n\n## Appendix\n\n");
    out.push_str(&format!(
        "Session files: `{}` ({} search result files, {} deep dives)\n\n",
        session.root().display(),
        stats.search_results,
        stats.deep_dives
    ));
    out.push_str("### Full Source List\n\n");
    match merged.as_deref() {
        Some(text) => match first_section(text, URL_SECTION) {
            Some(urls) => out.push_str(&format!("## All URLs Referenced\n\n{}\n", urls)),
            None => out.push_str("See `03-synthesis/merged-findings.md` for complete source list.\n"),
        },
        None => out.push_str("See individual files in `01-search-results/` for sources.\n"),
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "tests/fixtures/session/2026-02-04-rag-architecture";

    #[test]
    fn topic_from_dated_name() {
        assert_eq!(session_topic("2026-02-04-rag-architecture"), "Rag Architecture");
        assert_eq!(session_topic("2026-02-04-LLM-eval"), "Llm Eval");
        assert_eq!(session_topic("scratch"), "scratch");
        assert_eq!(session_topic("a-b-c"), "a-b-c");
    }

    #[test]
    fn stats_from_fixture() {
        let session = Session::open(FIXTURE).unwrap();
        let synthesis = session.read_optional(CURRENT_UNDERSTANDING).unwrap();
        let stats = collect_stats(&session, synthesis.as_deref()).unwrap();
        assert_eq!(
            stats,
            ReportStats {
                search_results: 2,
                deep_dives: 1,
                iterations: Some(2),
                findings: Some(2),
                confidence: Some("Medium".into()),
            }
        );
    }

    #[test]
    fn sections_pulled_with_fallbacks() {
        let session = Session::open(FIXTURE).unwrap();
        let report = generate(&session, Local::now()).unwrap();
        assert!(report.starts_with("# Deep Research Report: Rag Architecture\n"));
        assert!(report.contains("Hybrid retrieval with pgvector"));
        // no "High Confidence Findings" section, falls back to Detailed Findings
        assert!(report.contains("### Finding 1: HNSW"));
        assert!(report.contains("Start with HNSW"));
        // Validation Summary is empty, Completed Validations is used
        assert!(report.contains("Cross-checked recall numbers"));
        assert!(report.contains("What is the best chunk size for code?"));
        assert!(report.contains("| Sources Searched | 2 |"));
    }

    #[test]
    fn empty_session_uses_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(dir.path()).unwrap();
        let report = generate(&session, Local::now()).unwrap();
        assert!(report.contains("*No executive summary available"));
        assert!(report.contains("*Validation not yet completed.*"));
        assert!(report.contains("**Research Duration**: N/A iterations"));
        assert!(report.contains("See individual files in `01-search-results/` for sources."));
    }

    #[test]
    fn url_list_copied_from_merged_findings() {
        let dir = tempfile::tempdir().unwrap();
        let synthesis = dir.path().join("03-synthesis");
        std::fs::create_dir_all(&synthesis).unwrap();
        std::fs::write(
            synthesis.join("merged-findings.md"),
            "# Merged\n\n## All URLs Referenced\n\n- https://a.dev\n",
        )
        .unwrap();
        let session = Session::open(dir.path()).unwrap();
        let report = generate(&session, Local::now()).unwrap();
        assert!(report.contains("## All URLs Referenced\n\n- https://a.dev\n"));
    }
}
