// src/core/modules/mod.rs

// Every detection category lives in its own file and implements
// `DetectionModule`; the registry below fixes which ones run and in what order.
pub mod credential_module;
pub mod resource_module;
pub mod simulated_module;
pub mod smtp_module;

use crate::config::Config;
use crate::core::models::{Finding, Severity};
use crate::error::{Result, ScanError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use self::credential_module::CredentialModule;
use self::resource_module::{default_patterns, ResourceExposureModule};
use self::simulated_module::SimulatedModule;
use self::smtp_module::SmtpRelayModule;

pub const KBS: &str = "KBS";
pub const JS: &str = "JS";
pub const GIT: &str = "GIT";
pub const MISCONFIG: &str = "MISCONFIG";
pub const PHP: &str = "PHP";
pub const SSRF: &str = "SSRF";
pub const XXE: &str = "XXE";
pub const RCE: &str = "RCE";
pub const YML: &str = "YML";
pub const XML: &str = "XML";
pub const TRAVERSAL_PATH: &str = "TRANSVERSAL PATH";
pub const SMTP: &str = "SMTP";

/// Names of the resource-exposure modules, the only ones that take patterns.
pub const RESOURCE_MODULES: &[&str] = &[JS, PHP, YML, XML];

pub const DEFAULT_MODULE_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("ExposureScanner/", env!("CARGO_PKG_VERSION"));

/// A check that evaluates one exposure category against one target.
///
/// Implementations must not fail: every internal error is turned into a Low
/// finding that says the exposure could not be confirmed. They should also
/// finish within [`DetectionModule::timeout`]; the orchestrator enforces it
/// regardless.
#[async_trait]
pub trait DetectionModule: Send + Sync {
    fn name(&self) -> &str;

    fn timeout(&self) -> Duration {
        DEFAULT_MODULE_TIMEOUT
    }

    async fn evaluate(&self, target: &str) -> Finding;
}

/// The ordered set of modules that defines what a scan checks.
#[derive(Clone)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn DetectionModule>>,
}

impl ModuleRegistry {
    /// Registers `modules` in the given order. Names must be unique since
    /// results are keyed by them.
    pub fn new(modules: Vec<Arc<dyn DetectionModule>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for module in &modules {
            if !seen.insert(module.name().to_string()) {
                return Err(ScanError::DuplicateModule(module.name().to_string()));
            }
        }
        Ok(Self { modules })
    }

    /// Builds the standard battery from the run configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.scan.module_timeout();
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        for name in config.resource_patterns.keys() {
            if !RESOURCE_MODULES.contains(&name.as_str()) {
                warn!(module = %name, "Patterns configured for a module that takes none; ignored.");
            }
        }

        let resource = |name: &str| -> Arc<dyn DetectionModule> {
            let patterns = config
                .resource_patterns
                .get(name)
                .cloned()
                .unwrap_or_else(|| default_patterns(name));
            Arc::new(ResourceExposureModule::new(name, patterns, client.clone(), timeout))
        };
        let simulated = |name: &str, severity: Severity| -> Arc<dyn DetectionModule> {
            Arc::new(SimulatedModule::new(name, severity))
        };

        let registry = Self::new(vec![
            Arc::new(CredentialModule::new(KBS, config.aws_credentials_path.clone(), timeout))
                as Arc<dyn DetectionModule>,
            resource(JS),
            simulated(GIT, Severity::Low),
            simulated(MISCONFIG, Severity::Medium),
            resource(PHP),
            simulated(SSRF, Severity::Low),
            simulated(XXE, Severity::Low),
            simulated(RCE, Severity::Low),
            resource(YML),
            resource(XML),
            simulated(TRAVERSAL_PATH, Severity::Low),
            Arc::new(SmtpRelayModule::new(SMTP, config.scan.smtp_port, timeout)),
        ])?;
        debug!(modules = ?registry.names(), "Module registry built.");
        Ok(registry)
    }

    pub fn modules(&self) -> &[Arc<dyn DetectionModule>] {
        &self.modules
    }

    /// `(name, module)` pairs in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn DetectionModule>)> {
        self.modules.iter().map(|m| (m.name(), m))
    }

    pub fn names(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
