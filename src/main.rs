use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod client;
mod coerce;
mod dashboard;
mod export;
mod fallback;
mod models;
mod refresh;
mod report;
mod transform;

use client::{Endpoints, ReqwestTransport, StudentClient};
use dashboard::{Dashboard, StatKey};
use models::Study;
use refresh::{RefreshOutcome, DEFAULT_REFRESH_DELAY};

#[derive(Parser)]
#[command(name = "lpi-dashboard")]
#[command(about = "Cognitive training leaderboard for LPI results", long_about = None)]
struct Cli {
    /// Results endpoint returning `{ success, data }`
    #[arg(long, global = true, env = "LPI_RESULTS_URL", default_value = client::RESULTS_URL)]
    results_url: String,
    /// Endpoint that starts a backend stats recompute
    #[arg(long, global = true, env = "LPI_RECOMPUTE_URL", default_value = client::RECOMPUTE_URL)]
    recompute_url: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the leaderboard for one study year
    Leaderboard {
        #[arg(long, value_enum, default_value_t = Study::First)]
        study: Study,
        #[arg(long, value_enum, default_value_t = StatKey::Overall)]
        stat: StatKey,
        #[arg(long, default_value_t = 25)]
        limit: usize,
        /// Print the normalized students as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one student's stats and how they compare to their year
    Student {
        #[arg(long)]
        id: u32,
        #[arg(long, value_enum, default_value_t = StatKey::Overall)]
        stat: StatKey,
    },
    /// Ask the backend to recompute stats, then reload once it should be done
    Refresh {
        #[arg(long, default_value_t = DEFAULT_REFRESH_DELAY.as_secs())]
        delay_secs: u64,
        #[arg(long, value_enum, default_value_t = Study::First)]
        study: Study,
        #[arg(long, default_value_t = 25)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "lpi-report.md")]
        out: PathBuf,
    },
    /// Export the loaded students as CSV
    Export {
        #[arg(long)]
        csv: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let transport = ReqwestTransport::new().context("failed to build HTTP client")?;
    let client = StudentClient::new(
        Arc::new(transport),
        Endpoints {
            results: cli.results_url,
            recompute: cli.recompute_url,
        },
    );

    let refresh_delay = match &cli.command {
        Commands::Refresh { delay_secs, .. } => Duration::from_secs(*delay_secs),
        _ => DEFAULT_REFRESH_DELAY,
    };
    let dashboard = Dashboard::load(client, refresh_delay).await;
    if let Some(advisory) = dashboard.advisory() {
        eprintln!("{advisory}");
    }

    match cli.command {
        Commands::Leaderboard {
            study,
            stat,
            limit,
            json,
        } => {
            let students = dashboard.in_study(study);
            if json {
                println!("{}", serde_json::to_string_pretty(&students)?);
            } else {
                println!("{} players by {}:", study.label(), stat.label());
                print!("{}", report::render_leaderboard(&students, stat, limit));
            }
        }
        Commands::Student { id, stat } => {
            let student = dashboard
                .find(id)
                .with_context(|| format!("no student with id {id} in the loaded results"))?;
            let peers = dashboard.in_study(student.study);
            print!("{}", report::render_student_detail(&student, &peers, stat));
        }
        Commands::Refresh {
            delay_secs,
            study,
            limit,
        } => {
            let Some(mut handle) = dashboard.refresh() else {
                warn!("a refresh is already running");
                return Ok(());
            };
            println!("Refreshing stats; results will be reloaded in {delay_secs}s (Ctrl-C to cancel).");

            let outcome = tokio::select! {
                outcome = handle.wait() => outcome,
                _ = tokio::signal::ctrl_c() => {
                    dashboard.cancel_refresh(&mut handle);
                    RefreshOutcome::Cancelled
                }
            };

            match outcome {
                RefreshOutcome::Updated { students } => {
                    info!(students, "refresh complete");
                    print!(
                        "{}",
                        report::render_leaderboard(&dashboard.in_study(study), StatKey::Overall, limit)
                    );
                }
                RefreshOutcome::Failed => {
                    println!("Refresh failed; showing the previously loaded data.");
                    print!(
                        "{}",
                        report::render_leaderboard(&dashboard.in_study(study), StatKey::Overall, limit)
                    );
                }
                RefreshOutcome::Cancelled => println!("Refresh cancelled."),
            }
        }
        Commands::Report { out } => {
            let report = report::build_report(
                &dashboard.students(),
                dashboard.advisory().as_deref(),
                chrono::Utc::now(),
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { csv } => {
            let written = export::write_csv(&csv, &dashboard.students())?;
            println!("Exported {written} students to {}.", csv.display());
        }
    }

    Ok(())
}
