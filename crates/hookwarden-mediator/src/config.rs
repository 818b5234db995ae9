use hookwarden_core::{HookwardenError, HookwardenResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV: &str = "HOOKWARDEN_CONFIG";

/// Runtime settings, read from `~/.claude/hookwarden.toml` when present.
///
/// Every field has a default, so an absent or partial file is fine.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Newline-delimited list of literal strings to redact.
    #[serde(default = "default_filter_file")]
    pub filter_file: PathBuf,
    /// Append-only JSONL audit trail.
    #[serde(default = "default_audit_log")]
    pub audit_log: PathBuf,
    /// Web pre-fetch timeout.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// User agent sent with the web pre-fetch.
    #[serde(default = "default_fetch_user_agent")]
    pub fetch_user_agent: String,
    /// Redacted web text beyond this many characters is truncated.
    #[serde(default = "default_max_fetch_chars")]
    pub max_fetch_chars: usize,
    /// How long the stream filter waits for its input to end.
    #[serde(default = "default_stream_timeout_secs")]
    pub stream_timeout_secs: u64,
    /// Program used to re-run searches.
    #[serde(default = "default_search_program")]
    pub search_program: String,
    /// Binary invoked as `<program> filter` in wrapped shell commands.
    /// Defaults to the running executable.
    #[serde(default)]
    pub filter_program: Option<PathBuf>,
}

fn claude_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".claude")
}
fn default_filter_file() -> PathBuf {
    claude_dir().join("filter-string.txt")
}
fn default_audit_log() -> PathBuf {
    claude_dir().join("audit.jsonl")
}
fn default_fetch_timeout_secs() -> u64 {
    15
}
fn default_fetch_user_agent() -> String {
    "Mozilla/5.0 (sanitize-hook)".to_string()
}
fn default_max_fetch_chars() -> usize {
    30_000
}
fn default_stream_timeout_secs() -> u64 {
    120
}
fn default_search_program() -> String {
    "rg".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            filter_file: default_filter_file(),
            audit_log: default_audit_log(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            fetch_user_agent: default_fetch_user_agent(),
            max_fetch_chars: default_max_fetch_chars(),
            stream_timeout_secs: default_stream_timeout_secs(),
            search_program: default_search_program(),
            filter_program: None,
        }
    }
}

impl Settings {
    /// Default settings file location.
    pub fn default_path() -> PathBuf {
        claude_dir().join("hookwarden.toml")
    }

    /// Parses settings from TOML text.
    pub fn parse(raw: &str) -> HookwardenResult<Self> {
        toml::from_str(raw).map_err(|e| HookwardenError::Config(e.to_string()))
    }

    /// Loads settings from `path`, falling back to defaults when the file is
    /// absent or invalid.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No settings file, using defaults");
                return Self::default();
            }
        };
        match Self::parse(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid settings file, using defaults");
                Self::default()
            }
        }
    }

    /// Loads settings from `$HOOKWARDEN_CONFIG` or the default location.
    pub fn from_env() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_path);
        Self::load(&path)
    }

    /// [`Self::fetch_timeout_secs`] as a duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// [`Self::stream_timeout_secs`] as a duration.
    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_secs)
    }

    /// Binary used for the `filter` stage of wrapped shell commands: the
    /// configured override, else the resolved running executable, else the
    /// conventional install location.
    pub fn resolve_filter_program(&self) -> PathBuf {
        if let Some(program) = &self.filter_program {
            return program.clone();
        }
        std::env::current_exe()
            .and_then(std::fs::canonicalize)
            .unwrap_or_else(|_| claude_dir().join("hooks").join("hookwarden"))
    }
}
