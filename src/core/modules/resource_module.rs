// src/core/modules/resource_module.rs

use super::{DetectionModule, JS, PHP, XML, YML};
use crate::core::models::{Finding, Severity};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Built-in sensitive-resource patterns for each resource module.
///
/// Each module only matches its own extensions, so a served `config.yml` is a
/// YML finding and nothing else. Set `resource_patterns` in the config to give
/// every module the same list when one response should flag all of them.
const DEFAULT_PATTERNS: &[(&str, &[&str])] = &[
    (JS, &[".js"]),
    (PHP, &[".php"]),
    (YML, &[".yml", ".yaml"]),
    (XML, &[".xml"]),
];

pub fn default_patterns(module_name: &str) -> Vec<String> {
    DEFAULT_PATTERNS
        .iter()
        .find(|(name, _)| *name == module_name)
        .map(|(_, patterns)| patterns.iter().map(|p| p.to_string()).collect())
        .unwrap_or_default()
}

/// Flags HTTP resources that are publicly served and look sensitive.
///
/// Only targets with an `http://` or `https://` scheme are fetched; anything
/// else gets a Low finding without any network traffic.
pub struct ResourceExposureModule {
    name: String,
    patterns: Vec<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl ResourceExposureModule {
    pub fn new(name: &str, patterns: Vec<String>, client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            patterns: patterns.into_iter().map(|p| p.to_lowercase()).collect(),
            client,
            timeout,
        }
    }

    fn matches_sensitive_pattern(&self, target: &str) -> bool {
        let target = target.to_lowercase();
        self.patterns.iter().any(|p| target.contains(p.as_str()))
    }
}

pub fn is_http_target(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[async_trait]
impl DetectionModule for ResourceExposureModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn evaluate(&self, target: &str) -> Finding {
        if !is_http_target(target) {
            debug!(module = %self.name, target, "Not an HTTP target, skipping request.");
            return Finding::low(&self.name, format!("No {} leak detected for {}.", self.name, target));
        }

        match self.client.get(target).timeout(self.timeout).send().await {
            Ok(response) => {
                let status = response.status();
                debug!(module = %self.name, target, %status, "Received HTTP response.");
                if status == StatusCode::OK && self.matches_sensitive_pattern(target) {
                    info!(module = %self.name, target, "Sensitive resource is publicly served.");
                    Finding::new(&self.name, Severity::Medium, format!("Exposed resource detected: {target}"))
                } else {
                    Finding::low(&self.name, format!("No HTTP leak detected for {target}."))
                }
            }
            Err(e) => {
                warn!(module = %self.name, target, error = %e, "HTTP request failed.");
                Finding::low(&self.name, format!("Unable to reach {target}."))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_port, spawn_status_server};

    fn module(name: &str, patterns: &[&str]) -> ResourceExposureModule {
        ResourceExposureModule::new(
            name,
            patterns.iter().map(|p| p.to_string()).collect(),
            reqwest::Client::new(),
            Duration::from_secs(2),
        )
    }

    #[test]
    fn default_patterns_per_module() {
        assert_eq!(default_patterns("YML"), vec![".yml", ".yaml"]);
        assert_eq!(default_patterns("JS"), vec![".js"]);
        assert!(default_patterns("GIT").is_empty());
    }

    #[tokio::test]
    async fn ok_response_on_sensitive_path_is_medium() {
        let (addr, recorded) = spawn_status_server(200).await;
        let target = format!("http://{addr}/deploy/.env");

        let finding = module("YML", &[".env"]).evaluate(&target).await;
        assert_eq!(finding.severity, Severity::Medium);
        assert_eq!(finding.description, format!("Exposed resource detected: {target}"));
        assert!(recorded.lock().unwrap()[0].starts_with("GET /deploy/.env"));
    }

    #[tokio::test]
    async fn pattern_match_is_case_insensitive() {
        let (addr, _) = spawn_status_server(200).await;
        let target = format!("http://{addr}/static/APP.JS");
        let finding = module("JS", &[".js"]).evaluate(&target).await;
        assert_eq!(finding.severity, Severity::Medium);
    }

    #[tokio::test]
    async fn non_ok_response_is_low_even_on_sensitive_path() {
        let (addr, _) = spawn_status_server(404).await;
        let target = format!("http://{addr}/config.php");

        let finding = module("PHP", &[".php"]).evaluate(&target).await;
        assert_eq!(finding.severity, Severity::Low);
        assert_eq!(finding.description, format!("No HTTP leak detected for {target}."));
    }

    #[tokio::test]
    async fn ok_response_without_pattern_is_low() {
        let (addr, _) = spawn_status_server(200).await;
        let target = format!("http://{addr}/index.html");
        let finding = module("XML", &[".xml"]).evaluate(&target).await;
        assert_eq!(finding.severity, Severity::Low);
    }

    #[tokio::test]
    async fn unreachable_target_is_low() {
        let addr = closed_port().await;
        let target = format!("http://{addr}/app.js");
        let finding = module("JS", &[".js"]).evaluate(&target).await;
        assert_eq!(finding.severity, Severity::Low);
        assert_eq!(finding.description, format!("Unable to reach {target}."));
    }

    #[tokio::test]
    async fn bare_host_is_low_without_request() {
        let finding = module("JS", &[".js"]).evaluate("example.com").await;
        assert_eq!(finding.severity, Severity::Low);
        assert_eq!(finding.description, "No JS leak detected for example.com.");
    }
}
