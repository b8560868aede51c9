// src/core/modules/credential_module.rs

use super::DetectionModule;
use crate::core::models::{Finding, Severity};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info};

/// Marker whose presence in the credential store means a key is exposed.
pub const AWS_KEY_MARKER: &str = "aws_access_key_id";

/// Looks for exposed secrets in a local credential store.
///
/// The store is the same for every target, so the finding only differs by the
/// target named in its description.
pub struct CredentialModule {
    name: String,
    path: PathBuf,
    marker: String,
    timeout: Duration,
}

impl CredentialModule {
    pub fn new(name: &str, path: PathBuf, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            path,
            marker: AWS_KEY_MARKER.to_string(),
            timeout,
        }
    }

    pub fn with_marker(mut self, marker: &str) -> Self {
        self.marker = marker.to_string();
        self
    }
}

#[async_trait]
impl DetectionModule for CredentialModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn evaluate(&self, target: &str) -> Finding {
        debug!(target, path = %self.path.display(), "Reading credential store.");
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.contains(&self.marker) => {
                info!(target, path = %self.path.display(), "Exposed credential marker found.");
                Finding::new(
                    &self.name,
                    Severity::High,
                    format!("Exposed AWS key detected in {} for {}", self.path.display(), target),
                )
            }
            Ok(_) => Finding::low(&self.name, format!("No exposed AWS key detected for {target}.")),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(target, "Credential store not found.");
                Finding::low(&self.name, format!("AWS credentials file not found for {target}."))
            }
            Err(e) => {
                error!(target, error = %e, "Could not read credential store.");
                Finding::low(&self.name, format!("AWS check failed for {target}."))
            }
        }
    }
}
