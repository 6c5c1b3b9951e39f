//! `malviz` -- submit files for static and dynamic malware analysis.
//!
//! `malviz submit <files...>` uploads the files to both analysis
//! pipelines, shows a progress bar per pipeline, and prints the results
//! location (`/result?id=..&dynamicId=..`) once both are done.
//! `malviz report` fetches the raw JSON report of a finished task.
//!
//! Configuration comes from `MALVIZ_*` environment variables (a `.env`
//! file is honoured); see [`malviz_cli::config::ClientConfig::from_env`].

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use malviz_analysis::{AnalysisApi, AnalysisBackend};
use malviz_cli::config::ClientConfig;
use malviz_cli::render::ProgressBoard;
use malviz_core::artifact::{Artifact, ArtifactPart};
use malviz_core::handoff::HandOffTarget;
use malviz_orchestrator::events::SessionEvent;
use malviz_orchestrator::handoff::{resolve, HandOff};
use malviz_orchestrator::Orchestrator;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status after Ctrl-C, as shells report for SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, Parser)]
#[command(name = "malviz", version, about = "Submit files for static and dynamic malware analysis")]
struct Cli {
    /// Base URL of the task API (overrides MALVIZ_API_URL).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Base URL used for report retrieval (overrides MALVIZ_REPORT_API_URL).
    #[arg(long, global = true)]
    report_api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload files to both pipelines and wait for both analyses.
    Submit {
        /// Files to analyse. All of them form one submission.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the raw JSON report of a finished task.
    Report {
        /// Task identifier.
        #[arg(required_unless_present = "target", conflicts_with = "target")]
        id: Option<String>,

        /// A results location printed by `submit`; fetches both reports.
        #[arg(long)]
        target: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()
        .and_then(|c| c.with_urls(cli.api_url, cli.report_api_url))
        .context("invalid configuration")?;

    let api = AnalysisApi::new(&config.api_url, &config.report_api_url, config.request_timeout)
        .context("failed to build HTTP client")?;

    match cli.command {
        Command::Submit { files } => submit(&config, Arc::new(api), &files).await,
        Command::Report { id, target } => report(&api, id, target).await,
    }
}

/// Logs go to stderr so stdout carries only the results location or
/// report. `MALVIZ_LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "malviz=info".into());
    let json = std::env::var("MALVIZ_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn submit(
    config: &ClientConfig,
    backend: Arc<dyn AnalysisBackend>,
    files: &[PathBuf],
) -> anyhow::Result<ExitCode> {
    let artifact = read_artifact(files).await?;

    tracing::info!(
        api_url = %config.api_url,
        files = ?artifact.file_names(),
        sha256 = ?artifact.parts().iter().map(|p| p.sha256()).collect::<Vec<_>>(),
        bytes = artifact.total_bytes(),
        "Submitting artifact",
    );

    let orchestrator = Orchestrator::new(backend, config.orchestrator_config())
        .context("invalid orchestrator configuration")?;
    let mut events = orchestrator.subscribe();
    let handle = orchestrator.start_session(artifact);
    let session_id = handle.id();

    let mut board = ProgressBoard::new();
    let mut events_open = true;
    let outcome = handle.outcome();
    tokio::pin!(outcome);

    let outcome = loop {
        tokio::select! {
            outcome = &mut outcome => break outcome,
            event = events.recv(), if events_open => match event {
                Ok(event) if event.session_id() == session_id => draw(&mut board, &event),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Progress display skipped events");
                }
                Err(RecvError::Closed) => events_open = false,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(session_id = %session_id, "Interrupted, abandoning session");
                orchestrator.cancel_active();
            }
        }
    };

    while let Ok(event) = events.try_recv() {
        if event.session_id() == session_id {
            draw(&mut board, &event);
        }
    }
    eprintln!();

    match resolve(&outcome, &config.result_path) {
        HandOff::Navigate(target) => {
            println!("{target}");
            Ok(ExitCode::SUCCESS)
        }
        HandOff::Alert(message) => {
            eprintln!("{message}");
            Ok(ExitCode::FAILURE)
        }
        HandOff::Stay => {
            eprintln!("Cancelled.");
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
    }
}

async fn report(api: &AnalysisApi, id: Option<String>, target: Option<String>) -> anyhow::Result<ExitCode> {
    let report = match (id, target) {
        (Some(id), _) => api
            .get_report(&id)
            .await
            .with_context(|| format!("failed to fetch report {id}"))?,
        (None, Some(target)) => {
            let target = HandOffTarget::parse(&target).context("invalid results location")?;
            let static_report = api
                .get_report(&target.static_id)
                .await
                .with_context(|| format!("failed to fetch static report {}", target.static_id))?;
            let dynamic_report = match &target.dynamic_id {
                Some(id) => Some(
                    api.get_report(id)
                        .await
                        .with_context(|| format!("failed to fetch dynamic report {id}"))?,
                ),
                None => None,
            };
            serde_json::json!({ "static": static_report, "dynamic": dynamic_report })
        }
        (None, None) => anyhow::bail!("either a task id or --target is required"),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}

async fn read_artifact(files: &[PathBuf]) -> anyhow::Result<Artifact> {
    let mut parts = Vec::with_capacity(files.len());
    for path in files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} is not a file path", path.display()))?;
        parts.push(ArtifactPart::new(file_name, bytes));
    }
    Artifact::new(parts).context("nothing to submit")
}

fn draw(board: &mut ProgressBoard, event: &SessionEvent) {
    if !board.apply(event) {
        return;
    }
    let mut stderr = std::io::stderr().lock();
    if let Err(e) = write!(stderr, "\r{}", board.line()).and_then(|()| stderr.flush()) {
        tracing::debug!(error = %e, "Progress redraw failed");
    }
}
