// src/core/targets.rs

use crate::core::models::Target;
use crate::error::{Result, ScanError};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Loads the ordered target list from a text file, one target per line.
///
/// Blank lines are skipped and duplicates are dropped (first occurrence
/// wins). A readable file with no targets is `NoTargets`, distinct from the
/// I/O failure `TargetsUnreadable`.
pub async fn load_targets(path: &Path) -> Result<Vec<Target>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ScanError::TargetsUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

    let targets = parse_targets(&content);
    if targets.is_empty() {
        return Err(ScanError::NoTargets(path.to_path_buf()));
    }
    info!(count = targets.len(), ?targets, "Targets loaded.");
    Ok(targets)
}

pub fn parse_targets(content: &str) -> Vec<Target> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if seen.insert(line) {
            targets.push(line.to_string());
        } else {
            warn!(target = line, "Duplicate target ignored.");
        }
    }
    targets
}
