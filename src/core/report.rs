// src/core/report.rs

use crate::core::models::{ScanReport, Target, TargetResult};
use crate::error::{Result, ScanError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::Write;

pub const TOOL_NAME: &str = "EXPOSURE-SCANNER";

/// Folds per-target results into an immutable report.
///
/// Every target must have a result covering exactly `modules`, in order.
/// Anything else means the orchestrator broke its contract, so it is returned
/// as an error instead of being patched up.
pub fn build_report(
    run_timestamp: DateTime<Utc>,
    modules: Vec<String>,
    targets: Vec<Target>,
    results: HashMap<Target, TargetResult>,
) -> Result<ScanReport> {
    for target in &targets {
        let result = results.get(target).ok_or_else(|| ScanError::IncompleteResults {
            target: target.clone(),
            message: "no result recorded".to_string(),
        })?;
        if !result.covers_exactly(&modules) {
            return Err(ScanError::IncompleteResults {
                target: target.clone(),
                message: format!(
                    "expected findings for {} modules, got {}",
                    modules.len(),
                    result.len()
                ),
            });
        }
    }
    if let Some(extra) = results.keys().find(|t| !targets.contains(*t)) {
        return Err(ScanError::IncompleteResults {
            target: extra.clone(),
            message: "result for a target that was not scanned".to_string(),
        });
    }

    Ok(ScanReport {
        run_timestamp,
        modules,
        targets,
        results,
        interrupted: false,
    })
}

/// Turns a report into the text document handed to a notifier.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, report: &ScanReport) -> String;
}

/// Renders for Telegram's legacy `Markdown` parse mode: `*bold*` and plain
/// line breaks, with user-supplied text escaped.
pub struct TelegramMarkdownRenderer {
    tool_identity: String,
}

impl TelegramMarkdownRenderer {
    pub fn new(tool_identity: impl Into<String>) -> Self {
        Self {
            tool_identity: tool_identity.into(),
        }
    }
}

impl Default for TelegramMarkdownRenderer {
    fn default() -> Self {
        Self::new(format!("{TOOL_NAME} v{}", env!("CARGO_PKG_VERSION")))
    }
}

impl ReportRenderer for TelegramMarkdownRenderer {
    fn render(&self, report: &ScanReport) -> String {
        let mut doc = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(doc, "🔍 {} 🔍", bold(&format!("{} - Scan Report", self.tool_identity)));
        doc.push('\n');
        let modules: Vec<String> = report.modules().iter().map(|m| escape_markdown(m)).collect();
        let _ = writeln!(doc, "🧩 Modules: {}", modules.join(" / "));
        let _ = writeln!(doc, "📅 Date and time: {}", format_timestamp(report.run_timestamp()));
        if report.interrupted() {
            let _ = writeln!(doc, "⚠️ *Scan interrupted:* checks that never ran are listed as such.");
        }
        let _ = writeln!(doc, "🎯 Scanned targets:");
        for target in report.targets() {
            let _ = writeln!(doc, "- {}", escape_markdown(target));
        }
        doc.push('\n');
        let _ = writeln!(doc, "*Detected leaks:*");

        for (target, result) in report.iter() {
            doc.push('\n');
            let _ = writeln!(doc, "🌐 *Target:* {}", escape_markdown(target));
            for finding in result.iter() {
                let _ = writeln!(
                    doc,
                    "- \\[{}] {} : {}",
                    escape_markdown(&finding.module_name),
                    finding.severity,
                    escape_markdown(&finding.description)
                );
            }
        }

        let counts = report.severity_counts();
        doc.push('\n');
        let _ = writeln!(
            doc,
            "📊 High: {} | Medium: {} | Low: {}",
            counts.high, counts.medium, counts.low
        );
        doc
    }
}

/// Same layout as the chat message, e.g. "02:33 PM UTC on Tuesday, May 20, 2025".
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%I:%M %p UTC on %A, %B %d, %Y").to_string()
}

/// Wraps `text` in a bold entity. Escapes are not honored inside entities in
/// legacy Markdown, so the only unsafe character, `*`, is dropped instead.
fn bold(text: &str) -> String {
    format!("*{}*", text.replace('*', ""))
}

/// Escapes the characters legacy Telegram Markdown treats as entity markers.
/// Only valid outside of entities.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
