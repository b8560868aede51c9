// src/core/mod.rs

/// Data structures shared by the whole scan: `Target`, `Severity`, `Finding`,
/// `TargetResult` and `ScanReport`.
pub mod models;

/// The detection-module contract, its implementations and the registry.
pub mod modules;

/// Runs the registry against every target with bounded concurrency.
pub mod scanner;

/// Report assembly and rendering.
pub mod report;

pub mod pipeline;
pub mod targets;
