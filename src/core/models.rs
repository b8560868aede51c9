// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use strum::{Display, EnumIter};

/// One host, URL or `host:port` identifier handed to the scanner.
pub type Target = String;

// --- Core Data Models ---

/// Exposure risk level of a finding, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// The result of one detection module applied to one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub module_name: String,
    pub severity: Severity,
    pub description: String,
}

impl Finding {
    pub fn new(module_name: &str, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            module_name: module_name.to_string(),
            severity,
            description: description.into(),
        }
    }

    /// Shorthand for the fail-closed outcome every module falls back to.
    pub fn low(module_name: &str, description: impl Into<String>) -> Self {
        Self::new(module_name, Severity::Low, description)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} : {}", self.module_name, self.severity, self.description)
    }
}

/// All findings for a single target, one per registered module, kept in
/// registry order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResult {
    findings: Vec<Finding>,
}

impl TargetResult {
    /// Builds a result from per-module slots. Slot `i` must hold the finding of
    /// the `i`-th registered module.
    pub fn from_slots(findings: Vec<Finding>) -> Self {
        Self { findings }
    }

    pub fn get(&self, module_name: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.module_name == module_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// True when this result holds exactly one finding per name in `modules`,
    /// in that order.
    pub fn covers_exactly(&self, modules: &[String]) -> bool {
        self.findings.len() == modules.len()
            && self
                .findings
                .iter()
                .zip(modules)
                .all(|(finding, name)| &finding.module_name == name)
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}

/// Number of findings per severity across a whole report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }
}

// --- Main Report ---

/// The aggregated, immutable output of one scan run.
///
/// Fields are private so a report can only come out of
/// [`crate::core::report::build_report`], which checks that every target has a
/// complete result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub(crate) run_timestamp: DateTime<Utc>,
    pub(crate) modules: Vec<String>,
    pub(crate) targets: Vec<Target>,
    pub(crate) results: HashMap<Target, TargetResult>,
    /// The run was cancelled, so some findings only say a module never ran.
    #[serde(default)]
    pub(crate) interrupted: bool,
}

impl ScanReport {
    pub fn run_timestamp(&self) -> DateTime<Utc> {
        self.run_timestamp
    }

    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn result(&self, target: &str) -> Option<&TargetResult> {
        self.results.get(target)
    }

    pub fn results(&self) -> &HashMap<Target, TargetResult> {
        &self.results
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// Targets paired with their results, in the order they were loaded.
    pub fn iter(&self) -> impl Iterator<Item = (&Target, &TargetResult)> {
        self.targets
            .iter()
            .filter_map(|t| self.results.get(t).map(|r| (t, r)))
    }

    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for finding in self.results.values().flat_map(TargetResult::iter) {
            counts.record(finding.severity);
        }
        counts
    }
}
