// src/lib.rs

//! Target-oriented exposure scanner.
//!
//! Runs a fixed battery of detection modules against each target, folds the
//! findings into a [`core::models::ScanReport`] and delivers the rendered
//! report through a [`notify::Notifier`].

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod notify;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::config::Config;
pub use crate::core::models::{Finding, ScanReport, Severity, Target, TargetResult};
pub use crate::core::modules::{DetectionModule, ModuleRegistry};
pub use crate::core::pipeline::{execute, RunOutcome};
pub use crate::core::report::{build_report, ReportRenderer, TelegramMarkdownRenderer};
pub use crate::core::scanner::{ScanEvent, ScanOutcome, ScanResults, Scanner};
pub use crate::error::{Result, ScanError};
pub use crate::notify::{DeliveryResult, Notifier};
