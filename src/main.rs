mod findings;
mod parser;
mod record;
mod report;
mod session;
mod settings;
mod topics;
mod validate;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use session::{Session, FINAL_REPORT, MERGED_FINDINGS};
use settings::Settings;

#[derive(Parser)]
#[command(name = "research_merge", about = "Merge and report on deep-research session findings")]
struct Cli {
    /// Settings file (default: research-merge.toml in the session directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge search results and deep dives into merged-findings.md
    Merge {
        /// Session directory
        session: PathBuf,
        /// Output path (default: 03-synthesis/merged-findings.md)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the merge summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Assemble FINAL-REPORT.md from the session documents
    Report {
        /// Session directory
        session: PathBuf,
        /// Output path (default: FINAL-REPORT.md)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check session structure and research quality
    Validate {
        /// Session directory
        session: PathBuf,
        /// Print the validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    subscriber(filter, std::io::stderr).init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let status = match run(cli, &mut std::io::stdout()) {
        Ok(status) => status,
        Err(e) => {
            eprintln!("{}", error_line(&e));
            ExitCode::FAILURE
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    status
}

/// Log lines go to `writer`; stdout stays reserved for command output.
fn subscriber<W>(filter: EnvFilter, writer: W) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .finish()
}

/// Whole error chain on one line.
fn error_line(e: &anyhow::Error) -> String {
    format!("Error: {e:#}")
}

fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<ExitCode> {
    let now = chrono::Local::now();

    let status = match cli.command {
        Commands::Merge { session, output, json } => {
            let session = Session::open(session)?;
            let settings = Settings::load(cli.config.as_deref(), Some(session.root()))?;
            let corpus = findings::collect_session(&session, &settings)?;
            if corpus.is_empty() {
                tracing::warn!("No findings in {}", session.root().display());
            }

            let out_path = output.unwrap_or_else(|| session.path(MERGED_FINDINGS));
            let name = session.root().display().to_string();
            let doc = report::merged::render(&corpus, &settings, &name, now);
            report::write_report(&out_path, &doc)?;

            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&corpus.summary(&settings))?)?;
            } else {
                writeln!(
                    out,
                    "Merged {} findings ({} from search results, {} from deep dives), {} unique URLs.",
                    corpus.len(),
                    corpus.search_result_count(),
                    corpus.deep_dive_count(),
                    corpus.unique_urls()
                )?;
                writeln!(out, "Output: {}", out_path.display())?;
            }
            ExitCode::SUCCESS
        }
        Commands::Report { session, output } => {
            let session = Session::open(session)?;
            let doc = report::final_report::generate(&session, now)?;
            let out_path = output.unwrap_or_else(|| session.path(FINAL_REPORT));
            report::write_report(&out_path, &doc)?;
            writeln!(out, "Final report written to {}", out_path.display())?;
            ExitCode::SUCCESS
        }
        Commands::Validate { session, json } => {
            let report = validate::Validator::new(session).run(now)?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            } else {
                validate::print_summary(&report);
            }
            if report.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    };

    Ok(status)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
