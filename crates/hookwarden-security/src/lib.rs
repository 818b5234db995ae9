//! Security primitives for hookwarden.
//!
//! Provides the building blocks the mediator composes: a denylist for
//! destructive shell commands, a package-manager command rewriter, literal
//! string redaction, HTML flattening and the audit trail.
//!
//! # Main types
//!
//! - [`PatternGuard`] — Case-insensitive denylist of destructive commands.
//! - [`CommandRewriter`] — Rewrites `npm` invocations to `bun`.
//! - [`FilterSet`] — Literal strings redacted from everything the agent sees.
//! - [`TextExtractor`] — HTML to scannable plain text.
//! - [`AuditLog`] — Append-only JSONL record of every tool invocation.

/// Audit logging module.
pub mod audit;
/// Destructive command denylist.
pub mod guard;
/// HTML to plain text extraction.
pub mod html;
/// Literal string redaction.
pub mod redaction;
/// Command rewriting.
pub mod rewrite;

pub use audit::{AuditEntry, AuditLog};
pub use guard::{BlockRule, PatternGuard, BLOCK_RULES};
pub use html::TextExtractor;
pub use redaction::{FilterSet, RedactionOutcome, SENTINEL};
pub use rewrite::{CommandRewriter, REWRITE_REASON};
