use async_trait::async_trait;
use hookwarden_core::{HookEvent, HookwardenError, HookwardenResult};
use std::path::Path;
use tracing::debug;

/// Runs an external search and returns its standard output.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Runs the search with `args`, inside `cwd` when given.
    async fn search(&self, args: &[String], cwd: Option<&Path>) -> HookwardenResult<String>;
}

/// Search backend spawning `rg` (or a configured replacement).
///
/// The exit status is ignored: ripgrep exits 1 when nothing matched, which
/// is simply an empty result here.
pub struct RipgrepSearch {
    program: String,
}

impl RipgrepSearch {
    /// Uses `program` as the ripgrep executable.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for RipgrepSearch {
    fn default() -> Self {
        Self::new("rg")
    }
}

#[async_trait]
impl SearchBackend for RipgrepSearch {
    async fn search(&self, args: &[String], cwd: Option<&Path>) -> HookwardenResult<String> {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(args).stdin(std::process::Stdio::null());
        if let Some(dir) = cwd.filter(|d| d.is_dir()) {
            command.current_dir(dir);
        }
        debug!(program = %self.program, args = args.len(), "Running search");
        let output = command
            .output()
            .await
            .map_err(|e| HookwardenError::Search(format!("{}: {e}", self.program)))?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Translates a search tool invocation into ripgrep arguments.
///
/// Returns `None` when there is no pattern to search for.
pub fn ripgrep_args(event: &HookEvent) -> Option<Vec<String>> {
    let pattern = event.input_str("pattern");
    if pattern.is_empty() {
        return None;
    }

    let mut args = vec!["--no-config".to_string()];
    let mode = match event.input_str("output_mode") {
        "" => "files_with_matches",
        other => other,
    };
    match mode {
        "files_with_matches" => args.push("-l".into()),
        "count" => args.push("-c".into()),
        _ => {}
    }
    let content = mode == "content";

    if event.input_bool("-i").unwrap_or(false) {
        args.push("-i".into());
    }
    if content && event.input_bool("-n").unwrap_or(true) {
        args.push("-n".into());
    }
    if event.input_bool("multiline").unwrap_or(false) {
        args.extend(["-U".into(), "--multiline-dotall".into()]);
    }

    if content {
        let unified = event
            .input_count("context")
            .or_else(|| event.input_count("-C"));
        if let Some(lines) = unified {
            args.extend(["-C".into(), lines.to_string()]);
        } else {
            if let Some(after) = event.input_count("-A") {
                args.extend(["-A".into(), after.to_string()]);
            }
            if let Some(before) = event.input_count("-B") {
                args.extend(["-B".into(), before.to_string()]);
            }
        }
    }

    let glob = event.input_str("glob");
    if !glob.is_empty() {
        args.extend(["--glob".into(), glob.to_string()]);
    }
    let file_type = event.input_str("type");
    if !file_type.is_empty() {
        args.extend(["--type".into(), file_type.to_string()]);
    }

    // `-e` keeps a pattern starting with a dash from being read as a flag
    args.extend(["-e".into(), pattern.to_string()]);
    let path = match event.input_str("path") {
        "" => ".",
        p => p,
    };
    args.push(path.to_string());
    Some(args)
}

/// Applies the search tool's `offset`/`head_limit` paging to output lines.
pub fn apply_window(output: &str, offset: Option<u64>, head_limit: Option<u64>) -> String {
    if offset.is_none() && head_limit.is_none() {
        return output.to_string();
    }
    let skip = usize::try_from(offset.unwrap_or(0)).unwrap_or(usize::MAX);
    let take = head_limit
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(usize::MAX);
    let lines: Vec<&str> = output.split('\n').skip(skip).take(take).collect();
    lines.join("\n")
}
