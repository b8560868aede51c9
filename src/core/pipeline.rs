// src/core/pipeline.rs

use crate::core::models::{ScanReport, Target};
use crate::core::report::ReportRenderer;
use crate::core::scanner::{ScanOutcome, Scanner};
use crate::error::Result;
use crate::notify::{DeliveryResult, Notifier};
use chrono::Utc;
use tracing::{info, warn};

/// What one full run did.
#[derive(Debug)]
pub enum RunOutcome {
    /// No targets: nothing was scanned, built or sent.
    EmptyRun,
    Finished {
        report: ScanReport,
        delivery: DeliveryResult,
    },
}

/// Scans `targets`, builds and renders the report, then hands it to the
/// notifier exactly once.
///
/// Only a broken result contract surfaces as an error; a failed delivery is
/// part of a successful run and comes back in `RunOutcome::Finished`.
pub async fn execute(
    scanner: &Scanner,
    targets: &[Target],
    renderer: &dyn ReportRenderer,
    notifier: &dyn Notifier,
) -> Result<RunOutcome> {
    let run_timestamp = Utc::now();

    let results = match scanner.run(targets).await {
        ScanOutcome::EmptyRun => {
            warn!("Empty run, no report will be sent.");
            return Ok(RunOutcome::EmptyRun);
        }
        ScanOutcome::Completed(results) => results,
    };

    let report = results.into_report(run_timestamp)?;
    let document = renderer.render(&report);
    info!(chars = document.chars().count(), "Report rendered, delivering.");

    let delivery = notifier.deliver(&document).await;
    match &delivery {
        DeliveryResult::Delivered => info!("Report delivered."),
        DeliveryResult::Failed(reason) => warn!(%reason, "Report delivery failed."),
    }

    Ok(RunOutcome::Finished { report, delivery })
}
