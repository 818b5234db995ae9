use hookwarden_core::{HookwardenError, HookwardenResult};
use regex::{NoExpand, Regex};

/// Reason attached to a rewritten command.
pub const REWRITE_REASON: &str = "rewrote npm→bun";

/// Swaps `npm` invocations for `bun`, leaving global installs alone since
/// bun has no equivalent for them.
#[derive(Debug)]
pub struct CommandRewriter {
    keyword: Regex,
    global_install: Regex,
    replacement: &'static str,
}

impl CommandRewriter {
    /// Builds the npm → bun rewriter.
    pub fn new() -> HookwardenResult<Self> {
        Ok(Self {
            keyword: compile(r"\bnpm\b")?,
            global_install: compile(r"\bnpm\s+(i|install)\s+(-g|--global)")?,
            replacement: "bun",
        })
    }

    /// Rewrites every whole-word occurrence in one pass. Returns the command
    /// and whether it changed; unchanged commands are returned byte-identical.
    pub fn rewrite(&self, command: &str) -> (String, bool) {
        if !self.keyword.is_match(command) || self.global_install.is_match(command) {
            return (command.to_string(), false);
        }
        let rewritten = self
            .keyword
            .replace_all(command, NoExpand(self.replacement))
            .into_owned();
        (rewritten, true)
    }
}

fn compile(pattern: &str) -> HookwardenResult<Regex> {
    Regex::new(pattern).map_err(|e| HookwardenError::Config(format!("rewrite pattern: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter() -> CommandRewriter {
        CommandRewriter::new().unwrap()
    }

    #[test]
    fn test_rewrites_every_occurrence() {
        let (cmd, changed) = rewriter().rewrite("npm install && npm run build");
        assert!(changed);
        assert_eq!(cmd, "bun install && bun run build");
    }

    #[test]
    fn test_simple_install() {
        assert_eq!(
            rewriter().rewrite("npm install lodash"),
            ("bun install lodash".to_string(), true)
        );
    }

    #[test]
    fn test_global_install_untouched() {
        let r = rewriter();
        for cmd in ["npm install -g typescript", "npm i --global pnpm", "cd x && npm i -g y"] {
            assert_eq!(r.rewrite(cmd), (cmd.to_string(), false));
        }
    }

    #[test]
    fn test_word_boundary() {
        let r = rewriter();
        assert_eq!(r.rewrite("ls ~/.npmrc"), ("ls ~/.npmrc".to_string(), false));
        assert!(!r.rewrite("pnpm install").1);
        let (cmd, changed) = r.rewrite("rm -rf /tmp/npm-cache && npm ci");
        assert!(changed);
        assert_eq!(cmd, "rm -rf /tmp/bun-cache && bun ci");
    }

    #[test]
    fn test_no_keyword() {
        assert_eq!(rewriter().rewrite("cargo build"), ("cargo build".to_string(), false));
    }
}
