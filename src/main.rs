use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod aggregate;
mod config;
mod criteria;
mod db;
mod error;
mod import;
mod intake;
mod models;
mod report;

use config::Config;
use criteria::CriterionRegistry;
use error::AggregateError;
use models::FacultySummary;
use report::ReportOptions;

const INVALID_DATA: &str = "feedback data contains invalid entries";

#[derive(Parser)]
#[command(name = "faculty-feedback")]
#[command(about = "Anonymous faculty feedback aggregation and reporting", long_about = None)]
struct Cli {
    /// Config file (defaults to ./feedback.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default feedback.toml
    InitConfig,
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo feedback
    Seed,
    /// Import submissions from a CSV export
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Record one anonymous submission
    Submit {
        #[arg(long)]
        faculty: String,
        /// Criterion rating as Name=score, repeatable
        #[arg(long = "rating")]
        ratings: Vec<String>,
        #[arg(long, default_value = "")]
        comment: String,
        /// Reject the submission unless every criterion is rated
        #[arg(long)]
        require_all: bool,
    },
    /// List faculty members with feedback
    Faculties,
    /// Print the summary for one faculty member
    Summary {
        #[arg(long)]
        faculty: String,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    #[command(group(
        ArgGroup::new("scope")
            .args(["faculty", "all"])
            .required(true)
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        faculty: Option<String>,
        #[arg(long)]
        all: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Summarize a CSV export without touching the database
    SummarizeCsv {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        faculty: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("faculty_feedback=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let registry = config.registry()?;
    tracing::debug!(criteria = registry.len(), "criterion registry loaded");

    match cli.command {
        Commands::InitConfig => init_config()?,
        Commands::InitDb => {
            let pool = connect(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(&config).await?;
            let inserted = db::seed(&pool).await?;
            println!("Seed data inserted ({inserted} new submissions).");
        }
        Commands::Import { csv } => {
            let rows = import::read_csv(&registry, &csv)?;
            let pool = connect(&config).await?;
            let inserted = db::import_csv(&pool, &rows).await?;
            tracing::info!(read = rows.len(), inserted, "import finished");
            println!("Inserted {inserted} submissions from {}.", csv.display());
        }
        Commands::Submit {
            faculty,
            ratings,
            comment,
            require_all,
        } => {
            let form = intake::SubmissionForm {
                faculty,
                ratings: intake::parse_rating_pairs(&ratings)?,
                comment,
            };
            let record = intake::accept(&registry, &form, Utc::now(), require_all)?;
            let pool = connect(&config).await?;
            db::insert_submission(&pool, &record, None).await?;
            println!("Feedback for {} recorded.", record.faculty_id);
        }
        Commands::Faculties => {
            let pool = connect(&config).await?;
            let faculties = db::fetch_faculties(&pool).await?;
            if faculties.is_empty() {
                println!("No feedback recorded yet.");
                return Ok(());
            }
            for faculty in faculties {
                println!("- {faculty}");
            }
        }
        Commands::Summary { faculty, json } => {
            let pool = connect(&config).await?;
            let records = db::fetch_submissions(&pool, Some(&faculty)).await?;
            let summary =
                aggregate::summarize(&registry, &faculty, &records).map_err(reject_batch)?;
            print_summary(&registry, &summary, json)?;
        }
        Commands::Report { faculty, out, .. } => {
            let pool = connect(&config).await?;
            let options = ReportOptions {
                low_rating_threshold: config.report.low_rating_threshold,
                generated_at: Utc::now(),
            };

            let (document, default_out) = match faculty {
                Some(faculty) => {
                    let records = db::fetch_submissions(&pool, Some(&faculty)).await?;
                    let summary = aggregate::summarize(&registry, &faculty, &records)
                        .map_err(reject_batch)?;
                    (
                        report::build_report(&registry, &summary, &options),
                        PathBuf::from(report::report_file_name(&faculty)),
                    )
                }
                None => {
                    let records = db::fetch_submissions(&pool, None).await?;
                    let summaries =
                        aggregate::summarize_all(&registry, &records).map_err(reject_batch)?;
                    let ordered: Vec<&FacultySummary> = summaries.values().collect();
                    (
                        report::build_combined_report(&registry, &ordered, &options),
                        PathBuf::from(&config.report.output),
                    )
                }
            };

            let out = out.unwrap_or(default_out);
            std::fs::write(&out, document)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::SummarizeCsv { csv, faculty, json } => {
            let rows = import::read_csv(&registry, &csv)?;
            let records: Vec<_> = rows.into_iter().map(|row| row.record).collect();

            let summaries = match faculty {
                Some(faculty) => {
                    aggregate::summarize_requested(&registry, &[faculty], &records)
                }
                None => aggregate::summarize_all(&registry, &records),
            }
            .map_err(reject_batch)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else if summaries.is_empty() {
                println!("No submissions in {}.", csv.display());
            } else {
                for summary in summaries.values() {
                    print_summary(&registry, summary, false)?;
                    println!();
                }
            }
        }
    }

    Ok(())
}

fn reject_batch(err: AggregateError) -> anyhow::Error {
    tracing::warn!(record = err.record_index(), "rejected feedback batch: {err}");
    anyhow::Error::new(err).context(INVALID_DATA)
}

async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

fn init_config() -> anyhow::Result<()> {
    let path = Path::new(config::DEFAULT_CONFIG_FILE);
    if path.exists() {
        anyhow::bail!("{} already exists; edit it or remove it first", path.display());
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Created {} with default settings.", path.display());
    Ok(())
}

fn print_summary(
    registry: &CriterionRegistry,
    summary: &FacultySummary,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("{}", summary.faculty_id);
    if summary.is_empty() {
        println!("  No feedback available.");
        return Ok(());
    }

    println!(
        "  {} responses, overall {} {}",
        summary.submission_count,
        report::format_average(summary.overall_average),
        summary.overall_average.map(report::stars).unwrap_or_default()
    );
    for criterion in registry.names() {
        println!(
            "  - {}: {} ({} ratings)",
            criterion,
            report::format_average(summary.per_criterion_average.get(criterion).copied()),
            summary.per_criterion_count.get(criterion).copied().unwrap_or(0)
        );
    }
    for comment in &summary.comments {
        println!("  > {}", report::single_line(comment));
    }

    Ok(())
}
