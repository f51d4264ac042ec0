use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Result;
use chrono::{DateTime, Local};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::report::final_report::iteration;
use crate::session::{
    self, Session, COVERAGE_MATRIX, CURRENT_UNDERSTANDING, DEEP_DIVES_DIR, FINAL_REPORT,
    RESEARCH_PLAN, SEARCH_RESULTS_DIR, SYNTHESIS_DIR, VALIDATION_DIR, VERIFICATION_LOG,
};

static QUERY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^\d+\.\s*["']"#).unwrap());
static CHECKED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\[x\]").unwrap());
static UNCHECKED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\s\]").unwrap());
static FINDING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*]\s+\*\*|^#+\s+Finding").unwrap());
static OPEN_QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*-\s*\[\s*\]").unwrap());
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://([^/\s]+)").unwrap());

const REQUIRED_DIRS: &[&str] = &[SEARCH_RESULTS_DIR, DEEP_DIVES_DIR, SYNTHESIS_DIR, VALIDATION_DIR];
const PLAN_SECTIONS: &[&str] = &["Research Question", "Success Criteria", "Query Variations"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queries_planned: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources_covered: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources_total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_files: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub findings_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_questions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep_dives: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_urls: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_domains: Option<usize>,
}

impl ValidationStats {
    /// Recorded statistics as display label and value.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let counts = [
            ("Queries Planned", self.queries_planned),
            ("Sources Covered", self.sources_covered),
            ("Sources Total", self.sources_total),
            ("Result Files", self.result_files),
            ("Findings Count", self.findings_count),
            ("Open Questions", self.open_questions),
            ("Iterations", self.iterations.map(|i| i as usize)),
            ("Deep Dives", self.deep_dives),
            ("Total Urls", self.total_urls),
            ("Unique Domains", self.unique_domains),
        ];
        let mut out: Vec<(&'static str, String)> = counts
            .into_iter()
            .filter_map(|(label, v)| v.map(|v| (label, v.to_string())))
            .collect();
        if let Some(pct) = self.coverage_percent {
            out.insert(out.len().min(3), ("Coverage Percent", format!("{:.1}", pct)));
        }
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub session_path: String,
    pub timestamp: String,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub statistics: ValidationStats,
    pub recommendations: Vec<String>,
}

/// Structural and statistical health check of a research session.
/// Errors fail validation; warnings only inform.
pub struct Validator {
    root: PathBuf,
    errors: Vec<String>,
    warnings: Vec<String>,
    stats: ValidationStats,
}

impl Validator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Validator {
            root: root.into(),
            errors: Vec::new(),
            warnings: Vec::new(),
            stats: ValidationStats::default(),
        }
    }

    pub fn run(mut self, now: DateTime<Local>) -> Result<ValidationReport> {
        info!("Validating research session: {}", self.root.display());
        match Session::open(&self.root) {
            Ok(session) => {
                self.check_structure(&session);
                self.check_plan(&session)?;
                self.check_coverage(&session)?;
                self.check_synthesis(&session)?;
                self.check_sources(&session)?;
            }
            Err(e) => self.errors.push(e.to_string()),
        }
        Ok(self.finish(now))
    }

    fn check_structure(&mut self, session: &Session) {
        info!("[1/5] Validating directory structure");
        for dir in REQUIRED_DIRS {
            if session.path(dir).is_dir() {
                debug!("found {}/", dir);
            } else {
                self.errors.push(format!("Missing required directory: {}", dir));
            }
        }
        let matrix = format!("{}/{}", SEARCH_RESULTS_DIR, COVERAGE_MATRIX);
        let required_files = [
            RESEARCH_PLAN,
            matrix.as_str(),
            CURRENT_UNDERSTANDING,
            VERIFICATION_LOG,
            FINAL_REPORT,
        ];
        for file in required_files {
            if session.path(file).exists() {
                debug!("found {}", file);
            } else {
                self.warnings.push(format!("Missing file: {}", file));
            }
        }
    }

    fn check_plan(&mut self, session: &Session) -> Result<()> {
        info!("[2/5] Validating research plan");
        let Some(plan) = session.read_optional(RESEARCH_PLAN)? else {
            self.errors.push("Research plan file missing".to_string());
            return Ok(());
        };

        let lower = plan.to_lowercase();
        for section in PLAN_SECTIONS {
            if !lower.contains(&section.to_lowercase()) {
                self.warnings.push(format!("Research plan missing section: {}", section));
            }
        }

        let queries = plan.lines().filter(|l| QUERY_RE.is_match(l)).count();
        self.stats.queries_planned = Some(queries);
        if queries < 5 {
            self.warnings.push(format!("Only {} queries planned (recommend 5-10)", queries));
        }
        Ok(())
    }

    fn check_coverage(&mut self, session: &Session) -> Result<()> {
        info!("[3/5] Validating source coverage");
        self.stats.result_files = session.search_result_files()?.map(|f| f.len());

        let matrix = format!("{}/{}", SEARCH_RESULTS_DIR, COVERAGE_MATRIX);
        let Some(content) = session.read_optional(&matrix)? else {
            self.warnings.push("Coverage matrix missing".to_string());
            return Ok(());
        };

        let checked = CHECKED_RE.find_iter(&content).count();
        let unchecked = UNCHECKED_RE.find_iter(&content).count();
        self.stats.sources_covered = Some(checked);
        self.stats.sources_total = Some(checked + unchecked);

        if checked + unchecked > 0 {
            let pct = checked as f64 / (checked + unchecked) as f64 * 100.0;
            self.stats.coverage_percent = Some(pct);
            if pct < 25.0 {
                self.warnings.push(format!("Low source coverage: {:.0}%", pct));
            }
        }
        Ok(())
    }

    fn check_synthesis(&mut self, session: &Session) -> Result<()> {
        info!("[4/5] Validating synthesis");
        let Some(content) = session.read_optional(CURRENT_UNDERSTANDING)? else {
            self.warnings.push("Synthesis document missing".to_string());
            return Ok(());
        };

        let findings = content.lines().filter(|l| FINDING_RE.is_match(l)).count();
        let open = content.lines().filter(|l| OPEN_QUESTION_RE.is_match(l)).count();
        self.stats.findings_count = Some(findings);
        self.stats.open_questions = Some(open);

        if let Some(n) = iteration(&content) {
            self.stats.iterations = Some(n);
            if n == 0 {
                self.warnings.push("Research has 0 iterations - not started?".to_string());
            }
        }
        Ok(())
    }

    fn check_sources(&mut self, session: &Session) -> Result<()> {
        info!("[5/5] Validating source diversity");
        if let Some(dives) = session.deep_dive_files()? {
            self.stats.deep_dives = Some(dives.len());
            if dives.len() < 3 {
                self.warnings.push(format!("Only {} deep-dives (recommend 3+)", dives.len()));
            }
        }

        let mut total = 0;
        let mut domains: HashSet<String> = HashSet::new();
        for path in session.markdown_files(SEARCH_RESULTS_DIR)?.unwrap_or_default() {
            let content = session::read_document(&path)?;
            for caps in DOMAIN_RE.captures_iter(&content) {
                total += 1;
                domains.insert(caps[1].to_string());
            }
        }
        self.stats.total_urls = Some(total);
        self.stats.unique_domains = Some(domains.len());

        if domains.len() < 3 {
            self.warnings.push("Low source diversity - less than 3 unique domains".to_string());
        }
        Ok(())
    }

    fn recommendations(&self) -> Vec<String> {
        let s = &self.stats;
        let mut out = Vec::new();
        if s.coverage_percent.unwrap_or(0.0) < 50.0 {
            out.push("Search more source types for comprehensive coverage".to_string());
        }
        if s.deep_dives.unwrap_or(0) < 3 {
            out.push("Perform more deep-dives on promising leads".to_string());
        }
        if s.findings_count.unwrap_or(0) < 5 {
            out.push("Synthesize more findings from search results".to_string());
        }
        if s.unique_domains.unwrap_or(0) < 5 {
            out.push("Diversify sources across more domains".to_string());
        }
        if s.open_questions.unwrap_or(0) > 5 {
            out.push("Consider additional iterations to address open questions".to_string());
        }
        out
    }

    fn finish(self, now: DateTime<Local>) -> ValidationReport {
        let recommendations = self.recommendations();
        ValidationReport {
            session_path: self.root.display().to_string(),
            timestamp: now.to_rfc3339(),
            valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
            statistics: self.stats,
            recommendations,
        }
    }
}

pub fn print_summary(report: &ValidationReport) {
    println!("{}", "=".repeat(60));
    println!("VALIDATION SUMMARY");
    println!("{}", "=".repeat(60));

    if !report.errors.is_empty() {
        println!("\nERRORS ({}):", report.errors.len());
        for e in &report.errors {
            println!("   - {}", e);
        }
    }
    if !report.warnings.is_empty() {
        println!("\nWARNINGS ({}):", report.warnings.len());
        for w in &report.warnings {
            println!("   - {}", w);
        }
    }
    if report.errors.is_empty() && report.warnings.is_empty() {
        println!("\nAll validations passed!");
    }

    println!("\nStatistics:");
    for (label, value) in report.statistics.entries() {
        println!("   - {}: {}", label, value);
    }

    if !report.recommendations.is_empty() {
        println!("\nRecommendations:");
        for r in &report.recommendations {
            println!("   - {}", r);
        }
    }
}
