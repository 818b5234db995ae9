//! Core types and error definitions for hookwarden.
//!
//! This crate provides the types shared by every hookwarden crate: the
//! unified error enum, the tool-use event delivered by the host, the decision
//! produced by the mediator and the response envelope written back to the host.
//!
//! # Main types
//!
//! - [`HookwardenError`] — Unified error enum for all hookwarden subsystems.
//! - [`HookwardenResult`] — Convenience alias for `Result<T, HookwardenError>`.
//! - [`HookEvent`] — A single tool invocation as seen by the hook.
//! - [`HookPhase`] — Whether the event precedes or follows execution.
//! - [`ToolKind`] — The tool family an event belongs to.
//! - [`Decision`] — The terminal outcome of mediating one event.
//! - [`HookResponse`] — The JSON envelope emitted for every non-silent decision.

/// Mediation decisions and the response envelope.
pub mod decision;
/// Error types.
pub mod error;
/// Tool-use events delivered by the host.
pub mod event;

pub use decision::{Decision, HookResponse, HookSpecificOutput, PermissionDecision};
pub use error::{HookwardenError, HookwardenResult};
pub use event::{HookEvent, HookPhase, ToolKind, PLUGGABLE_TOOL_PREFIX};
