use std::error::Error;
use std::process::ExitCode;
use std::time::Duration;

use serde_json::Value;

use obs_service_patcher::models::{PatchOutcome, PatcherSettings, RunStatus, RunSummary};
use obs_service_patcher::services::{
    find_obs_directories, init_logger, patch_all, prune_logs, refresh_all, DescriptorFetcher,
    EventSink, PatchEvent, PatchEventKind, RemoteClient, PATCH_EVENT,
};

const TITLE: &str = "OBS Service Patcher";

// ============================================================================
// Console output
// ============================================================================

/// Renders patch events as one line each on stdout
struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: &str, payload: Value) {
        if event != PATCH_EVENT {
            return;
        }
        let Some(event) = PatchEvent::from_payload(payload) else {
            return;
        };

        let icon = match event.kind {
            PatchEventKind::Downloaded | PatchEventKind::Refreshed => "💽",
            PatchEventKind::Detected => "🔍",
            PatchEventKind::AlreadyPresent | PatchEventKind::Patched => "✅",
            PatchEventKind::Failed => "⛔️",
        };
        match event.path {
            Some(path) => println!("{icon} {}: {path}", event.message),
            None => println!("{icon} {}", event.message),
        }
    }
}

fn wait_for_enter() {
    println!("Press the Enter key or close this window.");
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
}

fn print_summary(summary: &RunSummary) -> ExitCode {
    match summary.status() {
        RunStatus::NothingToDo => {
            println!("No OBS Studio or Streamlabs OBS services file found, nothing to do.");
            println!("{TITLE} Completed!");
            ExitCode::SUCCESS
        }
        RunStatus::AllGood => {
            println!(
                "{} file(s) patched, {} already up to date.",
                summary.count(PatchOutcome::Patched),
                summary.count(PatchOutcome::AlreadyPresent)
            );
            println!("{TITLE} Completed!");
            ExitCode::SUCCESS
        }
        RunStatus::PartialFailure => {
            for report in summary.failures() {
                if let Err(e) = &report.result {
                    println!("⛔️ {}: {e}", report.label);
                }
            }
            if summary.needs_elevation() {
                println!("⛔️ Please try running the program as an Administrator");
            }
            println!("{TITLE} Failed!");
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Run
// ============================================================================

async fn run(settings: &PatcherSettings, sink: &dyn EventSink) -> Result<RunSummary, Box<dyn Error>> {
    let client = RemoteClient::new(Duration::from_secs(settings.timeout_secs))?;

    // Nothing is touched until the descriptor is known to be good
    let service = DescriptorFetcher::new(&client, settings.descriptor_url.as_str())
        .fetch(sink)
        .await?;
    println!();

    let targets = find_obs_directories(sink);
    log::info!("Found {} services file(s)", targets.len());

    if settings.refresh_official && !targets.is_empty() {
        let refreshed = refresh_all(&client, &targets, sink).await;
        log::info!("Refreshed {refreshed} of {} upstream services file(s)", targets.len());
    }
    println!();

    let summary = patch_all(&targets, &service, sink);
    println!();
    Ok(summary)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let settings = PatcherSettings::from_env();

    // Prune before the logger opens its file
    let pruned = settings
        .log_dir
        .as_deref()
        .map(|log_dir| prune_logs(log_dir, settings.log_retention_days));

    match init_logger(settings.log_dir.as_deref(), settings.level_filter()) {
        Ok(Some(path)) => log::info!("Logging to {path:?}"),
        Ok(None) => {}
        Err(e) => eprintln!("Logging to stderr only: {e}"),
    }
    match pruned {
        Some(Ok(0)) | None => {}
        Some(Ok(removed)) => log::info!("Removed {removed} old log file(s)"),
        Some(Err(e)) => log::warn!("Log cleanup failed: {e}"),
    }
    log::info!("{TITLE} {} starting", env!("CARGO_PKG_VERSION"));

    let sink = ConsoleSink;
    let exit_code = match run(&settings, &sink).await {
        Ok(summary) => print_summary(&summary),
        Err(e) => {
            log::error!("Run aborted: {e}");
            println!("⛔️ {e}");
            println!("{TITLE} Failed!");
            ExitCode::FAILURE
        }
    };

    if settings.pause_on_exit {
        wait_for_enter();
    }
    exit_code
}
