//! `hookwarden`: tool-use hook for coding agents.
//!
//! The host runs one process per event, passing the event as JSON on stdin.
//! A decision, when there is one, is written to stdout as a single JSON line.
//! Logs go to stderr so they never mix with the response.

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use hookwarden_core::{Decision, HookEvent, HookPhase, HookwardenError, ToolKind};
use hookwarden_mediator::{passthrough, redact_stream, Mediator, Settings};
use hookwarden_security::{AuditLog, FilterSet};
use std::io::Write;
use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "HOOKWARDEN_LOG";
const LOG_FORMAT_ENV: &str = "HOOKWARDEN_LOG_FORMAT";

#[derive(Parser)]
#[command(
    name = "hookwarden",
    version,
    about = "Blocks destructive commands and keeps secrets out of agent context"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Decide on a tool invocation before it runs
    PreToolUse,
    /// Audit a finished tool invocation and redact its output
    PostToolUse,
    /// Redact stdin to stdout; used behind wrapped shell commands
    Filter,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::MissingSubcommand
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            | ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                // Never break the host over a bad invocation.
                let _ = e.print();
                return ExitCode::SUCCESS;
            }
        },
    };

    init_tracing();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to start runtime");
            return ExitCode::SUCCESS;
        }
    };
    let result = runtime.block_on(run(cli.command));
    // A stdin reader abandoned by the filter may still be blocked.
    runtime.shutdown_background();

    if let Err(e) = result {
        warn!(error = %e, "Hook failed, allowing");
    }
    ExitCode::SUCCESS
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    let settings = Settings::from_env();
    match command {
        Command::PreToolUse => mediate(HookPhase::PreToolUse, settings).await,
        Command::PostToolUse => mediate(HookPhase::PostToolUse, settings).await,
        Command::Filter => filter(settings).await,
    }
}

async fn mediate(phase: HookPhase, settings: Settings) -> anyhow::Result<()> {
    let mut raw = String::new();
    tokio::io::stdin().read_to_string(&mut raw).await?;
    let event = match HookEvent::from_json(&raw) {
        Ok(event) => event,
        Err(e) => {
            debug!(error = %e, "Unreadable event, allowing");
            return Ok(());
        }
    };

    let audit = AuditLog::new(settings.audit_log.clone());
    let decision = match Mediator::from_settings(settings) {
        Ok(mediator) => mediator.handle(phase, &event).await,
        Err(e) => startup_failure(phase, &event, e, &audit),
    };
    emit(phase, decision)
}

/// Shell commands are refused when the guard could not be built; anything
/// else proceeds. Finished invocations are still audited.
fn startup_failure(
    phase: HookPhase,
    event: &HookEvent,
    err: HookwardenError,
    audit: &AuditLog,
) -> Decision {
    error!(error = %err, "Mediator unavailable");
    if phase == HookPhase::PostToolUse {
        audit.record(event);
    }
    let guarded = phase == HookPhase::PreToolUse && event.tool_kind() == ToolKind::Shell;
    match err {
        HookwardenError::Guard(_) if guarded => {
            Decision::deny(format!("hookwarden command guard unavailable: {err}"))
        }
        _ => Decision::SilentAllow,
    }
}

fn emit(phase: HookPhase, decision: Decision) -> anyhow::Result<()> {
    let Some(response) = decision.into_response(phase) else {
        return Ok(());
    };
    let line = response.to_json()?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()?;
    Ok(())
}

async fn filter(settings: Settings) -> anyhow::Result<()> {
    let filters = FilterSet::load(&settings.filter_file);
    let mut stdout = tokio::io::stdout();
    let outcome = if filters.is_empty() {
        passthrough(&mut tokio::io::stdin(), &mut stdout).await?
    } else {
        redact_stream(
            &filters,
            std::io::stdin(),
            &mut stdout,
            settings.stream_timeout(),
        )
        .await?
    };
    debug!(?outcome, "Filter finished");
    Ok(())
}
