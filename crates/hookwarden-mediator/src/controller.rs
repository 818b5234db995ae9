use crate::config::Settings;
use crate::fetch::{truncate_chars, HttpPageFetcher, PageFetcher};
use crate::search::{apply_window, ripgrep_args, RipgrepSearch, SearchBackend};
use hookwarden_core::{Decision, HookEvent, HookPhase, HookwardenResult, ToolKind};
use hookwarden_security::{
    AuditLog, CommandRewriter, FilterSet, PatternGuard, TextExtractor, REWRITE_REASON,
};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Denial for reads that resolve to the filter file itself.
pub const FILTER_FILE_DENIAL: &str = "cannot read filter configuration file";

const READ_HEADER: &str = "[SANITIZED - disruptive string removed]";
const SEARCH_HEADER: &str = "[SANITIZED - disruptive string removed from grep results]";
const WEB_HEADER: &str = "[SANITIZED - disruptive string removed from web content]";
const OUTPUT_HEADER: &str = "[SANITIZED OUTPUT]";

/// Decides what happens to one tool invocation.
///
/// Every check within a tool branch runs in a fixed order and the first one
/// that reaches a decision wins. Failures of anything except the command
/// guard and the filter file protection resolve to [`Decision::SilentAllow`].
pub struct Mediator {
    settings: Settings,
    filters: FilterSet,
    guard: PatternGuard,
    rewriter: CommandRewriter,
    extractor: TextExtractor,
    audit: AuditLog,
    search: Arc<dyn SearchBackend>,
    fetcher: Arc<dyn PageFetcher>,
    filter_program: PathBuf,
}

impl Mediator {
    /// Builds a mediator with the built-in rule table, `rg` search and an
    /// HTTP page fetcher configured from `settings`.
    pub fn new(settings: Settings, filters: FilterSet) -> HookwardenResult<Self> {
        let fetcher =
            HttpPageFetcher::new(settings.fetch_timeout(), &settings.fetch_user_agent)?;
        Ok(Self {
            guard: PatternGuard::new()?,
            rewriter: CommandRewriter::new()?,
            extractor: TextExtractor::new()?,
            audit: AuditLog::new(settings.audit_log.clone()),
            search: Arc::new(RipgrepSearch::new(settings.search_program.clone())),
            fetcher: Arc::new(fetcher),
            filter_program: settings.resolve_filter_program(),
            settings,
            filters,
        })
    }

    /// Builds a mediator whose filters come from `settings.filter_file`.
    pub fn from_settings(settings: Settings) -> HookwardenResult<Self> {
        let filters = FilterSet::load(&settings.filter_file);
        Self::new(settings, filters)
    }

    /// Replaces the search backend.
    pub fn with_search(mut self, search: Arc<dyn SearchBackend>) -> Self {
        self.search = search;
        self
    }

    /// Replaces the page fetcher.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Replaces the command guard.
    pub fn with_guard(mut self, guard: PatternGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Overrides the binary used in wrapped shell commands.
    pub fn with_filter_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.filter_program = program.into();
        self
    }

    /// The active filter set.
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// The settings this mediator was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mediates `event` for the given phase.
    pub async fn handle(&self, phase: HookPhase, event: &HookEvent) -> Decision {
        match phase {
            HookPhase::PreToolUse => self.pre_tool_use(event).await,
            HookPhase::PostToolUse => self.post_tool_use(event),
        }
    }

    /// Checks run before the tool executes.
    pub async fn pre_tool_use(&self, event: &HookEvent) -> Decision {
        let decision = match event.tool_kind() {
            ToolKind::Shell => self.check_shell(event),
            ToolKind::FileRead => self.check_file_read(event),
            ToolKind::Search => self.check_search(event).await,
            ToolKind::WebFetch => self.check_web_fetch(event).await,
            ToolKind::Other => Decision::SilentAllow,
        };
        if !decision.is_silent() {
            info!(tool = %event.tool_name, deny = decision.is_deny(), "Pre-execution decision");
        }
        decision
    }

    /// Checks run after the tool completed. The audit record is written
    /// before anything else, whatever the outcome.
    pub fn post_tool_use(&self, event: &HookEvent) -> Decision {
        self.audit.record(event);
        if self.filters.is_empty() {
            return Decision::SilentAllow;
        }

        let outcome = self.filters.redact_text(&event.output_text());
        if !outcome.matched {
            return Decision::SilentAllow;
        }
        warn!(tool = %event.tool_name, "Filtered string found in tool output");

        if event.is_pluggable_tool() {
            let output = event
                .tool_output
                .as_ref()
                .map_or(Value::Null, |o| self.filters.redact_value(o));
            return Decision::ReplaceOutput { output };
        }
        Decision::AllowAnnotated {
            context: format!("{OUTPUT_HEADER}\n{}", outcome.content),
        }
    }

    fn check_shell(&self, event: &HookEvent) -> Decision {
        let command = event.input_str("command");
        if let Some(reason) = self.guard.evaluate(command) {
            return Decision::deny(format!(
                "🛑 BLOCKED: {reason}\ncommand: {command}\n\nif you really need this, run it manually outside claude."
            ));
        }

        let (rewritten, changed) = self.rewriter.rewrite(command);
        let reason = changed.then(|| REWRITE_REASON.to_string());

        if !self.filters.is_empty() && !rewritten.is_empty() {
            let wrapped = self.wrap_command(&rewritten);
            return Decision::allow_modified(replace_command(event, wrapped), reason);
        }
        if changed {
            return Decision::allow_modified(replace_command(event, rewritten), reason);
        }
        Decision::SilentAllow
    }

    /// Pipes the command's combined output through the `filter` subcommand.
    fn wrap_command(&self, command: &str) -> String {
        let program = shell_quote(&self.filter_program.to_string_lossy());
        format!("( {command} ) 2>&1 | {program} filter")
    }

    fn check_file_read(&self, event: &HookEvent) -> Decision {
        let requested = event.input_str("file_path");
        if requested.is_empty() {
            return Decision::SilentAllow;
        }
        let target = resolve_against(event.cwd.as_deref(), requested);
        if self.is_filter_file(&target) {
            warn!(path = %target.display(), "Blocked read of filter file");
            return Decision::deny(FILTER_FILE_DENIAL);
        }
        if self.filters.is_empty() || !target.is_file() {
            return Decision::SilentAllow;
        }

        let data = match std::fs::read(&target) {
            Ok(data) => data,
            Err(e) => {
                debug!(path = %target.display(), error = %e, "Read pre-check skipped");
                return Decision::SilentAllow;
            }
        };
        let outcome = self.filters.redact_text(&String::from_utf8_lossy(&data));
        if !outcome.matched {
            return Decision::SilentAllow;
        }

        let numbered: Vec<String> = outcome
            .content
            .split('\n')
            .enumerate()
            .map(|(i, line)| format!("  {}\t{line}", i + 1))
            .collect();
        Decision::deny(format!("{READ_HEADER}\n{}", numbered.join("\n")))
    }

    /// Both paths are resolved through symlinks; an unresolvable path never
    /// counts as the filter file.
    fn is_filter_file(&self, target: &Path) -> bool {
        match (
            std::fs::canonicalize(&self.settings.filter_file),
            std::fs::canonicalize(target),
        ) {
            (Ok(filter_file), Ok(target)) => filter_file == target,
            _ => false,
        }
    }

    async fn check_search(&self, event: &HookEvent) -> Decision {
        if self.filters.is_empty() {
            return Decision::SilentAllow;
        }
        let Some(args) = ripgrep_args(event) else {
            return Decision::SilentAllow;
        };

        let cwd = event.cwd.as_deref().map(Path::new);
        let output = match self.search.search(&args, cwd).await {
            Ok(output) => output,
            Err(e) => {
                debug!(error = %e, "Search pre-check failed");
                return Decision::SilentAllow;
            }
        };
        let outcome = self.filters.redact_text(&output);
        if !outcome.matched {
            return Decision::SilentAllow;
        }

        let shown = apply_window(
            &outcome.content,
            event.input_count("offset"),
            event.input_count("head_limit"),
        );
        Decision::deny(format!("{SEARCH_HEADER}\n{shown}"))
    }

    async fn check_web_fetch(&self, event: &HookEvent) -> Decision {
        if self.filters.is_empty() {
            return Decision::SilentAllow;
        }
        let url = event.input_str("url");
        if url.is_empty() {
            return Decision::SilentAllow;
        }

        let body = match self.fetcher.fetch(url).await {
            Ok(body) => body,
            Err(e) => {
                debug!(url = %url, error = %e, "Web pre-check failed");
                return Decision::SilentAllow;
            }
        };
        if !self.filters.contains_any(&body) {
            return Decision::SilentAllow;
        }

        let text = self.extractor.to_plain_text(&body);
        let redacted = self.filters.redact_text(&text).content;
        let shown = truncate_chars(&redacted, self.settings.max_fetch_chars);
        Decision::deny(format!("{WEB_HEADER}\nURL: {url}\n\n{shown}"))
    }
}

/// Copy of the event's input with `command` replaced.
fn replace_command(event: &HookEvent, command: String) -> Map<String, Value> {
    let mut input = event.tool_input.clone();
    input.insert("command".to_string(), Value::String(command));
    input
}

fn resolve_against(cwd: Option<&str>, path: &str) -> PathBuf {
    let path = Path::new(path);
    match cwd {
        Some(cwd) if path.is_relative() => Path::new(cwd).join(path),
        _ => path.to_path_buf(),
    }
}

/// Single-quotes `word` for `sh` unless it only has characters that need no
/// quoting.
fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | '-'));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
