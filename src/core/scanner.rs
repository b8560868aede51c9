// src/core/scanner.rs

use crate::core::models::{Finding, Severity, Target, TargetResult};
use crate::core::modules::{DetectionModule, ModuleRegistry};
use crate::core::report::build_report;
use crate::error::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{debug, error, info, warn};

/// Progress notifications emitted while a scan runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    TargetStarted(Target),
    TargetCompleted {
        target: Target,
        highest: Option<Severity>,
    },
}

/// What a scan run produced.
#[derive(Debug)]
pub enum ScanOutcome {
    /// There was nothing to scan; no report must be built or sent.
    EmptyRun,
    Completed(ScanResults),
}

/// Raw per-target results, ready to be folded into a `ScanReport`.
#[derive(Debug, Clone)]
pub struct ScanResults {
    pub modules: Vec<String>,
    pub targets: Vec<Target>,
    pub results: HashMap<Target, TargetResult>,
    /// Set when the run was cancelled; some findings then only record that the
    /// module never ran.
    pub interrupted: bool,
}

impl ScanResults {
    pub fn into_report(self, run_timestamp: DateTime<Utc>) -> Result<crate::core::models::ScanReport> {
        let mut report = build_report(run_timestamp, self.modules, self.targets, self.results)?;
        report.interrupted = self.interrupted;
        Ok(report)
    }
}

/// Runs every registered module against every target.
///
/// Targets and modules are all scheduled at once; the semaphore caps how many
/// module evaluations are in flight. Each evaluation gets its own task and
/// timeout, so a hung or panicking module only costs its own slot.
pub struct Scanner {
    registry: Arc<ModuleRegistry>,
    semaphore: Arc<Semaphore>,
    progress: Option<mpsc::UnboundedSender<ScanEvent>>,
    cancel: Option<watch::Receiver<bool>>,
}

impl Scanner {
    pub fn new(registry: ModuleRegistry, max_in_flight: usize) -> Self {
        Self {
            registry: Arc::new(registry),
            semaphore: Arc::new(Semaphore::new(max_in_flight.max(1))),
            progress: None,
            cancel: None,
        }
    }

    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<ScanEvent>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Once `true` is sent on the channel no new evaluations start; running
    /// ones finish or time out.
    pub fn with_cancellation(mut self, rx: watch::Receiver<bool>) -> Self {
        self.cancel = Some(rx);
        self
    }

    pub async fn run(&self, targets: &[Target]) -> ScanOutcome {
        if targets.is_empty() {
            warn!("No targets to scan, skipping run.");
            return ScanOutcome::EmptyRun;
        }

        info!(targets = targets.len(), modules = self.registry.len(), "Starting scan.");
        let per_target = join_all(targets.iter().map(|t| self.scan_target(t))).await;

        let results: HashMap<Target, TargetResult> =
            targets.iter().cloned().zip(per_target).collect();
        let interrupted = self.is_cancelled();
        if interrupted {
            warn!("Scan was interrupted, report will contain placeholder findings.");
        }
        info!("Scan finished.");

        ScanOutcome::Completed(ScanResults {
            modules: self.registry.names(),
            targets: targets.to_vec(),
            results,
            interrupted,
        })
    }

    async fn scan_target(&self, target: &Target) -> TargetResult {
        info!(target = %target, "Scan started.");
        self.emit(ScanEvent::TargetStarted(target.clone()));

        // `join_all` keeps input order, so slot i belongs to registry module i.
        let slots = join_all(
            self.registry
                .modules()
                .iter()
                .map(|module| self.run_module(Arc::clone(module), target.clone())),
        )
        .await;
        let result = TargetResult::from_slots(slots);

        info!(target = %target, highest = ?result.highest_severity(), "Scan complete.");
        self.emit(ScanEvent::TargetCompleted {
            target: target.clone(),
            highest: result.highest_severity(),
        });
        result
    }

    async fn run_module(&self, module: Arc<dyn DetectionModule>, target: Target) -> Finding {
        let name = module.name().to_string();

        let permit = tokio::select! {
            biased;
            _ = self.cancelled() => None,
            permit = Arc::clone(&self.semaphore).acquire_owned() => permit.ok(),
        };
        let Some(permit) = permit else {
            return interrupted(&name, &target);
        };
        if self.is_cancelled() {
            return interrupted(&name, &target);
        }

        let timeout = module.timeout();
        let task_target = target.clone();
        let handle = tokio::spawn(async move {
            let _permit = permit;
            tokio::time::timeout(timeout, module.evaluate(&task_target)).await
        });

        match handle.await {
            Ok(Ok(mut finding)) => {
                if finding.module_name != name {
                    warn!(module = %name, reported = %finding.module_name, "Module reported a different name; corrected.");
                    finding.module_name = name;
                }
                debug!(module = %finding.module_name, target = %target, severity = %finding.severity, "Module finished.");
                finding
            }
            Ok(Err(_)) => {
                warn!(module = %name, target = %target, ?timeout, "Module timed out.");
                Finding::low(
                    &name,
                    format!(
                        "{name}: timed out after {}s, unable to confirm exposure for {target}.",
                        timeout.as_secs()
                    ),
                )
            }
            Err(e) => {
                error!(module = %name, target = %target, error = %e, "Module task failed.");
                Finding::low(&name, format!("{name}: check failed, unable to confirm exposure for {target}."))
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is requested; never resolves without a
    /// cancellation channel or after its sender is gone.
    async fn cancelled(&self) {
        if let Some(rx) = &self.cancel {
            let mut rx = rx.clone();
            let requested = rx.wait_for(|cancelled| *cancelled).await.is_ok();
            if requested {
                return;
            }
        }
        std::future::pending::<()>().await
    }

    fn emit(&self, event: ScanEvent) {
        if let Some(tx) = &self.progress {
            // A dropped receiver only means nobody is watching progress.
            let _ = tx.send(event);
        }
    }
}

fn interrupted(module_name: &str, target: &str) -> Finding {
    Finding::low(
        module_name,
        format!("{module_name}: scan interrupted before the module ran against {target}."),
    )
}
