// src/main.rs

use clap::Parser;
use color_eyre::eyre::Result;
use exposure_scanner::core::report::TOOL_NAME;
use exposure_scanner::core::targets::load_targets;
use exposure_scanner::notify::console::ConsoleNotifier;
use exposure_scanner::notify::telegram::TelegramNotifier;
use exposure_scanner::{
    execute, logging, Config, DeliveryResult, ModuleRegistry, Notifier, RunOutcome, ScanError,
    ScanEvent, Scanner, TelegramMarkdownRenderer,
};
use std::path::PathBuf;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "exposure-scanner", version, about = "Scan targets for exposed services and secrets and report to Telegram")]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Target list, one per line. Overrides `targets_file` from the config.
    #[arg(short, long)]
    targets: Option<PathBuf>,

    /// Print the report instead of sending it.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    let log_path = logging::initialize_logging(config.log_file.as_deref())?;
    info!(log = %log_path.display(), "Starting {} v{}.", TOOL_NAME, env!("CARGO_PKG_VERSION"));
    info!(
        path = %cli.config.display(),
        env_overrides = ?config.env_overrides(),
        "Configuration loaded."
    );

    let registry = ModuleRegistry::from_config(&config)?;
    println!("{} v{}", TOOL_NAME, env!("CARGO_PKG_VERSION"));
    println!("\nEnabled modules:");
    println!("{}", registry.names().join(" / "));
    println!("\nStarting scan...\n");

    let targets_path = cli.targets.unwrap_or_else(|| config.targets_file.clone());
    let targets = match load_targets(&targets_path).await {
        Ok(targets) => targets,
        Err(ScanError::NoTargets(path)) => {
            error!(path = %path.display(), "Target list is empty, no scan performed.");
            println!("No targets found in {}. No scan performed.", path.display());
            return Ok(());
        }
        Err(e) => {
            error!(error = %e, "Could not load targets, no scan performed.");
            return Err(e.into());
        }
    };

    let notifier: Box<dyn Notifier> = if cli.dry_run {
        Box::new(ConsoleNotifier::new())
    } else {
        Box::new(TelegramNotifier::new(&config.telegram)?)
    };

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight checks.");
            eprintln!("\nInterrupted: finishing running checks, then reporting what completed.");
            let _ = cancel_tx.send(true);
        }
    });

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            match event {
                ScanEvent::TargetStarted(target) => println!("Scanning target: {target}"),
                ScanEvent::TargetCompleted { target, .. } => println!("Scan complete for {target}.\n"),
            }
        }
    });

    let scanner = Scanner::new(registry, config.scan.max_in_flight)
        .with_progress(progress_tx)
        .with_cancellation(cancel_rx);
    let renderer = TelegramMarkdownRenderer::default();

    let outcome = execute(&scanner, &targets, &renderer, notifier.as_ref()).await?;
    // Closing the progress channel lets the printer drain and stop.
    drop(scanner);
    let _ = printer.await;

    match outcome {
        RunOutcome::EmptyRun => println!("No scan performed."),
        RunOutcome::Finished { report, delivery } => {
            if report.interrupted() {
                println!("Scan was interrupted: checks that never ran are marked in the report.");
            }
            let counts = report.severity_counts();
            println!(
                "Findings: High {} | Medium {} | Low {}",
                counts.high, counts.medium, counts.low
            );
            match delivery {
                DeliveryResult::Delivered => println!("Scan finished. Report delivered."),
                DeliveryResult::Failed(reason) => {
                    println!("Scan finished. Report could not be delivered: {reason}")
                }
            }
        }
    }
    Ok(())
}
