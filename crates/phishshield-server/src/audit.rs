//! JSONL audit log: one line per classification.

use anyhow::{Context, Result};
use chrono::Utc;
use phishshield::Verdict;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// A single audit event.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub request_id: String,
    pub method: String,
    pub url: Option<String>,
    pub prediction: Option<u8>,
    pub result: Option<String>,
    pub probability: Option<f64>,
    pub duration_ms: u64,
    pub status: String,
}

impl AuditEvent {
    /// Event for a classification attempt. `verdict` is `None` when the
    /// request was rejected.
    pub fn new(
        request_id: &str,
        method: &str,
        url: Option<&str>,
        verdict: Option<&Verdict>,
        duration_ms: u64,
        status: &str,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            request_id: request_id.to_string(),
            method: method.to_string(),
            url: url.map(String::from),
            prediction: verdict.map(Verdict::prediction),
            result: verdict.map(|v| v.label.to_string()),
            probability: verdict.map(|v| v.probability),
            duration_ms,
            status: status.to_string(),
        }
    }
}

/// Append-only JSONL audit logger.
#[derive(Debug)]
pub struct AuditLogger {
    file: File,
}

impl AuditLogger {
    /// Open or create the audit log file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open audit log: {}", path.display()))?;

        Ok(Self { file })
    }

    /// Append one event.
    pub fn log(&mut self, event: &AuditEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        writeln!(self.file, "{json}")?;
        Ok(())
    }
}
