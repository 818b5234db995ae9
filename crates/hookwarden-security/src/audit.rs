use chrono::{DateTime, SecondsFormat, Utc};
use hookwarden_core::{HookEvent, HookwardenError, HookwardenResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const UNKNOWN: &str = "unknown";

/// One line of the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// RFC 3339 UTC timestamp with second precision.
    pub timestamp: String,
    /// Host session, or `"unknown"`.
    pub session_id: String,
    /// Name of the invoked tool.
    pub tool_name: String,
    /// Parameters of the invocation.
    pub tool_input: Map<String, Value>,
    /// Agent working directory, or `"unknown"`.
    pub cwd: String,
}

impl AuditEntry {
    /// Captures the identity and parameters of one tool invocation.
    pub fn from_event(event: &HookEvent, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            session_id: event.session_id.as_deref().unwrap_or(UNKNOWN).to_string(),
            tool_name: event.tool_name.clone(),
            tool_input: event.tool_input.clone(),
            cwd: event.cwd.as_deref().unwrap_or(UNKNOWN).to_string(),
        }
    }
}

/// Append-only JSONL audit trail. Never read back, rotated or truncated.
///
/// Each record is one open-append-close cycle with a single write, so
/// concurrent hook processes interleave whole lines.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    /// Audit log writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry.
    pub fn append(&self, entry: &AuditEntry) -> HookwardenResult<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                HookwardenError::Audit(format!("cannot open {}: {e}", self.path.display()))
            })?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Records an event now. Failures are logged and swallowed: auditing
    /// never changes the outcome of mediation.
    pub fn record(&self, event: &HookEvent) {
        let entry = AuditEntry::from_event(event, Utc::now());
        info!(
            session_id = %entry.session_id,
            tool = %entry.tool_name,
            "audit"
        );
        if let Err(e) = self.append(&entry) {
            warn!(path = %self.path.display(), error = %e, "Failed to append audit record");
        }
    }
}
