//! Tool-use mediation for hookwarden.
//!
//! Composes the security primitives into per-tool decisions and hosts the
//! streaming redaction pipe used by wrapped shell commands.
//!
//! # Main types
//!
//! - [`Mediator`] — Runs the pre- and post-execution checks for one event.
//! - [`Settings`] — Paths, timeouts and limits, loaded from TOML.
//! - [`SearchBackend`] — Seam for the external search re-run.
//! - [`PageFetcher`] — Seam for the web pre-fetch.
//! - [`StreamOutcome`] — How a streaming redaction run ended.

/// Per-tool decision logic.
pub mod controller;
/// Settings file handling.
pub mod config;
/// Web pre-fetch.
pub mod fetch;
/// External search re-run.
pub mod search;
/// Streaming redaction pipe.
pub mod stream;

pub use config::{Settings, CONFIG_ENV};
pub use controller::{Mediator, FILTER_FILE_DENIAL};
pub use fetch::{truncate_chars, HttpPageFetcher, PageFetcher, TRUNCATION_MARKER};
pub use search::{apply_window, ripgrep_args, RipgrepSearch, SearchBackend};
pub use stream::{passthrough, redact_stream, StreamOutcome};
