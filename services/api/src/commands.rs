use clap::Args;
use std::path::PathBuf;
use talent_relay::config::AppConfig;
use talent_relay::connectors::http_client;
use talent_relay::domain::AtsSource;
use talent_relay::error::AppError;
use talent_relay::sink::ForwardOutcome;
use talent_relay::status::{StatusUpdate, StatusUpdater};
use talent_relay::sync::{RunSummary, SyncService};
use talent_relay::telemetry;

#[derive(Args, Debug)]
pub(crate) struct SyncArgs {
    /// ATS to pull from: workable, bamboohr, ceipal or recruitee
    pub(crate) source: String,
    /// Directory for <source>_data.json and analyzed_<source>.json
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,
    /// Override the analysis endpoint
    #[arg(long)]
    pub(crate) analysis_url: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct UpdateStatusArgs {
    /// BambooHR application id
    pub(crate) application_id: u64,
    /// Target pipeline status id
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub(crate) status_id: u32,
}

pub(crate) async fn run_sync(args: SyncArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(output_dir) = args.output_dir {
        config.sink.output_dir = output_dir;
    }
    if let Some(analysis_url) = args.analysis_url {
        config.sink.analysis_url = analysis_url;
    }

    telemetry::init(&config.telemetry)?;

    let source: AtsSource = args.source.parse()?;
    let summary = SyncService::from_config(&config)?.run_source(source).await?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("{} sync", summary.source);
    println!(
        "  Window: {} -> {}",
        summary.started_at.to_rfc3339(),
        summary.finished_at.to_rfc3339()
    );
    println!(
        "  Records: {} profiles, {} jobs, {} applications",
        summary.profiles, summary.jobs, summary.applications
    );

    match &summary.dispatch.persisted_to {
        Some(path) => println!("  Saved to {}", path.display()),
        None => println!("  Local write failed (see logs)"),
    }

    match &summary.dispatch.forward {
        ForwardOutcome::Delivered(analysis) => {
            println!(
                "  Analysis: {} analyzed across {} jobs",
                analysis
                    .analyzed
                    .map_or_else(|| "?".to_string(), |n| n.to_string()),
                analysis
                    .grouped_jobs
                    .map_or_else(|| "?".to_string(), |n| n.to_string())
            );
            for candidate in analysis.candidates.iter().flatten() {
                let name = candidate
                    .pointer("/candidate/name")
                    .and_then(|value| value.as_str())
                    .unwrap_or("Unknown Candidate");
                let score = candidate
                    .get("ai_score")
                    .and_then(|value| value.as_u64())
                    .unwrap_or_default();
                let recommendation = candidate
                    .get("recommendation")
                    .and_then(|value| value.as_str())
                    .unwrap_or("-");
                println!("    - {name}: {score} ({recommendation})");
            }
        }
        ForwardOutcome::Rejected { status, body } => {
            println!("  Analysis rejected the batch: HTTP {status} {body}");
        }
        ForwardOutcome::Unreachable { error } => {
            println!("  Analysis service unreachable: {error}");
        }
    }
}

pub(crate) async fn run_update_status(args: UpdateStatusArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let client = http_client(config.fetch.request_timeout)?;
    let updater = StatusUpdater::from_settings(client, &config.sources.bamboohr)?;
    let update = updater
        .update(&args.application_id.to_string(), args.status_id)
        .await;

    match serde_json::to_string_pretty(&update) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("status update result unavailable: {err}"),
    }
    if let StatusUpdate::Failed { status, .. } = &update {
        tracing::warn!(
            application_id = %args.application_id,
            status = ?status,
            "status update did not apply"
        );
    }
    Ok(())
}
