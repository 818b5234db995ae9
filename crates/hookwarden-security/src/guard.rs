use hookwarden_core::{HookwardenError, HookwardenResult};
use regex::{Regex, RegexBuilder};
use tracing::warn;

/// One entry of the denylist: a case-insensitive pattern and the reason
/// reported when it matches.
#[derive(Debug, Clone, Copy)]
pub struct BlockRule {
    /// Regular expression searched anywhere in the command.
    pub pattern: &'static str,
    /// Optional pattern anchored at the end of a match; when it matches there
    /// the match does not count.
    pub unless_followed_by: Option<&'static str>,
    /// Human-readable reason.
    pub reason: &'static str,
}

impl BlockRule {
    const fn new(pattern: &'static str, reason: &'static str) -> Self {
        Self {
            pattern,
            unless_followed_by: None,
            reason,
        }
    }

    const fn unless(mut self, pattern: &'static str) -> Self {
        self.unless_followed_by = Some(pattern);
        self
    }
}

const BLIND_PORT_KILL: &str = "blind port kill - use: kill $(lsof -ti:PORT -sTCP:LISTEN)";
const NOT_LISTEN_ONLY: &str = r"^[^\n]*-sTCP:LISTEN";

/// Destructive or irreversible operations that must never run from the agent.
/// First match in table order supplies the reported reason.
pub const BLOCK_RULES: &[BlockRule] = &[
    // filesystem destruction
    // any run of option words may precede the target
    BlockRule::new(
        r#"\brm\s+(?:-\S*\s+)*["']?/\*?["']?(?:[\s;&|)]|$)"#,
        "rm on root directory",
    ),
    BlockRule::new(
        r#"\brm\s+(?:-\S*\s+)*["']?(?:~|\$HOME|\$\{HOME\})/?\*?["']?(?:[\s;&|)]|$)"#,
        "rm on home directory",
    ),
    // recursive and force, clustered in either order, split or long form
    BlockRule::new(
        r#"\brm\s+(?:-\S*\s+)*(?:-[a-z]*r[a-z]*f[a-z]*|-[a-z]*f[a-z]*r[a-z]*|(?:-[a-z]*r[a-z]*|--recursive)\s+(?:-\S*\s+)*(?:-[a-z]*f[a-z]*|--force)|(?:-[a-z]*f[a-z]*|--force)\s+(?:-\S*\s+)*(?:-[a-z]*r[a-z]*|--recursive))\s+(?:-\S*\s+)*["']?/"#,
        "rm -rf on system path",
    )
    .unless(r"^(?:tmp|var/tmp)"),
    BlockRule::new(r">\s*/etc/", "overwriting /etc"),
    BlockRule::new(r">\s*/usr/", "overwriting /usr"),
    BlockRule::new(r">\s*/System/", "overwriting /System"),
    // git history on the primary branch
    BlockRule::new(r"git\s+push\s+.*--force.*(?:main|master)", "force push to main/master"),
    BlockRule::new(r"git\s+push\s+-f.*(?:main|master)", "force push to main/master"),
    BlockRule::new(r"git\s+reset\s+--hard.*origin/(?:main|master)", "hard reset main/master"),
    // disks
    BlockRule::new(r"diskutil\s+eraseDisk", "erasing disk"),
    BlockRule::new(r"dd\s+.*of=/dev/", "dd to raw device"),
    // `lsof -ti:PORT` returns every pid holding the port, browsers included
    BlockRule::new(r"lsof\s+-ti[^-]*\|\s*xargs.*kill", BLIND_PORT_KILL),
    BlockRule::new(r"kill\s+.*\$\(lsof\s+-ti", BLIND_PORT_KILL).unless(NOT_LISTEN_ONLY),
    BlockRule::new(r"kill\s+`lsof\s+-ti", BLIND_PORT_KILL).unless(NOT_LISTEN_ONLY),
    BlockRule::new(
        r"pkill\s+-f.*:\d+",
        "pkill by port - use: kill $(lsof -ti:PORT -sTCP:LISTEN)",
    ),
    // browsers and dev tooling
    BlockRule::new(r"pkill\s+(-\w+\s+)*.*web-ext", "NEVER kill web-ext - ask user to restart"),
    BlockRule::new(r"pkill\s+(-\w+\s+)*.*firefox", "NEVER kill firefox - ask user to restart"),
    BlockRule::new(r"pkill\s+(-\w+\s+)*.*chrome", "NEVER kill chrome - ask user to restart"),
    BlockRule::new(r"pkill\s+(-\w+\s+)*.*safari", "NEVER kill safari - ask user to restart"),
    BlockRule::new(
        r"pkill\s+(-\w+\s+)*.*electron",
        "NEVER kill electron apps - ask user to restart",
    ),
    BlockRule::new(r"pkill\s+(-\w+\s+)*.*brave", "NEVER kill brave - ask user to restart"),
    BlockRule::new(r"pkill\s+(-\w+\s+)*.*arc", "NEVER kill arc - ask user to restart"),
    BlockRule::new(r"killall\s+.*firefox", "NEVER kill firefox - ask user to restart"),
    BlockRule::new(r"killall\s+.*chrome", "NEVER kill chrome - ask user to restart"),
    BlockRule::new(r"killall\s+.*safari", "NEVER kill safari - ask user to restart"),
    BlockRule::new(r"killall\s+.*web-ext", "NEVER kill web-ext - ask user to restart"),
    BlockRule::new(r"killall\s+.*brave", "NEVER kill Brave - ask user to restart"),
    BlockRule::new(r"killall\s+.*arc", "NEVER kill Arc - ask user to restart"),
    BlockRule::new(r"kill\s+.*web-ext", "NEVER kill web-ext - ask user to restart"),
    BlockRule::new(r"kill\s+.*firefox", "NEVER kill firefox - ask user to restart"),
    BlockRule::new(r"kill\s+.*chrome", "NEVER kill chrome - ask user to restart"),
    BlockRule::new(r"pgrep.*\|\s*xargs\s+kill", "NEVER kill processes via pgrep pipe - ask user"),
    BlockRule::new(r"pgrep.*\|\s*kill", "NEVER kill processes via pgrep pipe - ask user"),
    BlockRule::new(r"osascript.*quit.*firefox", "NEVER quit Firefox via osascript - ask user"),
    BlockRule::new(r"osascript.*quit.*chrome", "NEVER quit Chrome via osascript - ask user"),
    BlockRule::new(r"osascript.*quit.*safari", "NEVER quit Safari via osascript - ask user"),
    // repositories need explicit authorization
    BlockRule::new(r"git\s+clone\s+", "NEVER git clone without explicit user authorization"),
    BlockRule::new(
        r"gh\s+repo\s+clone\s+",
        "NEVER gh repo clone without explicit user authorization",
    ),
];

#[derive(Debug)]
struct CompiledRule {
    pattern: Regex,
    unless_followed_by: Option<Regex>,
    reason: &'static str,
}

impl CompiledRule {
    fn matches(&self, command: &str) -> bool {
        self.pattern.find_iter(command).any(|m| match &self.unless_followed_by {
            Some(unless) => !unless.is_match(&command[m.end()..]),
            None => true,
        })
    }
}

/// Inspects shell commands against the compiled denylist. Never executes
/// anything.
#[derive(Debug)]
pub struct PatternGuard {
    rules: Vec<CompiledRule>,
}

impl PatternGuard {
    /// Compiles the built-in [`BLOCK_RULES`] table.
    pub fn new() -> HookwardenResult<Self> {
        Self::with_rules(BLOCK_RULES)
    }

    /// Compiles a custom rule table. Any invalid pattern is an error; a guard
    /// is never built with silently missing rules.
    pub fn with_rules(rules: &[BlockRule]) -> HookwardenResult<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                Ok(CompiledRule {
                    pattern: compile(rule.pattern)?,
                    unless_followed_by: rule.unless_followed_by.map(compile).transpose()?,
                    reason: rule.reason,
                })
            })
            .collect::<HookwardenResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Returns the reason of the first rule matching `command`.
    pub fn evaluate(&self, command: &str) -> Option<&'static str> {
        let reason = self
            .rules
            .iter()
            .find(|rule| rule.matches(command))
            .map(|rule| rule.reason);
        if let Some(reason) = reason {
            warn!(reason, "Blocked destructive command");
        }
        reason
    }

    /// Number of compiled rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

fn compile(pattern: &str) -> HookwardenResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| HookwardenError::Guard(format!("invalid rule '{pattern}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> PatternGuard {
        PatternGuard::new().unwrap()
    }

    #[test]
    fn test_full_table_compiles() {
        assert_eq!(guard().rule_count(), BLOCK_RULES.len());
    }

    #[test]
    fn test_root_and_home_deletion() {
        let g = guard();
        assert_eq!(g.evaluate("rm -rf /"), Some("rm on root directory"));
        assert_eq!(g.evaluate("rm -r -f \"/\""), Some("rm on root directory"));
        assert_eq!(g.evaluate("rm -rf ~"), Some("rm on home directory"));
        assert_eq!(g.evaluate("sudo rm -fr '~' "), Some("rm on home directory"));
    }

    #[test]
    fn test_root_and_home_spellings() {
        let g = guard();
        for cmd in [
            "rm -fr /*",
            "rm -rf --no-preserve-root /",
            "rm --recursive --force /",
            "rm -Rf / && echo done",
            "(rm -rf /)",
        ] {
            assert_eq!(g.evaluate(cmd), Some("rm on root directory"), "{cmd}");
        }
        for cmd in [
            "rm -rf ~/",
            "rm -rf ~/*",
            "rm -rf $HOME",
            "rm -rf \"${HOME}/\"",
            "rm -r -f $HOME/*; ls",
        ] {
            assert_eq!(g.evaluate(cmd), Some("rm on home directory"), "{cmd}");
        }
        assert_eq!(g.evaluate("rm -rf ~/projects/old"), None);
        assert_eq!(g.evaluate("rm -rf /tmp/x"), None);
    }

    #[test]
    fn test_system_path_flag_spellings() {
        let g = guard();
        for cmd in [
            "rm -fr /etc",
            "rm -r -f /usr",
            "rm -f -R /opt/app",
            "rm --recursive --force /var/lib",
            "rm -rfv --one-file-system /srv",
            "rm --force -r \"/usr/share\"",
        ] {
            assert_eq!(g.evaluate(cmd), Some("rm -rf on system path"), "{cmd}");
        }
        assert_eq!(g.evaluate("rm -fr /tmp/cache"), None);
        assert_eq!(g.evaluate("rm --recursive --force /var/tmp/x"), None);
        assert_eq!(g.evaluate("rm -r /usr/local/foo"), None);
        assert_eq!(g.evaluate("rm -f /usr/local/bin/tool"), None);
    }

    #[test]
    fn test_system_path_deletion_excludes_temp() {
        let g = guard();
        assert_eq!(g.evaluate("rm -rf /usr/local"), Some("rm -rf on system path"));
        assert_eq!(g.evaluate("rm -rf /tmp/build"), None);
        assert_eq!(g.evaluate("rm -rf /var/tmp/cache"), None);
        assert_eq!(
            g.evaluate("rm -rf /tmp/a && rm -rf /opt/app"),
            Some("rm -rf on system path")
        );
        assert_eq!(g.evaluate("rm -rf ./target"), None);
    }

    #[test]
    fn test_config_overwrite() {
        let g = guard();
        assert_eq!(g.evaluate("echo x > /etc/hosts"), Some("overwriting /etc"));
        assert_eq!(g.evaluate("cat a >/usr/bin/ls"), Some("overwriting /usr"));
        assert_eq!(g.evaluate("echo > /system/x"), Some("overwriting /System"));
    }

    #[test]
    fn test_git_primary_branch() {
        let g = guard();
        assert_eq!(
            g.evaluate("git push --force origin main"),
            Some("force push to main/master")
        );
        assert_eq!(
            g.evaluate("git push -f origin master"),
            Some("force push to main/master")
        );
        assert_eq!(
            g.evaluate("git reset --hard origin/main"),
            Some("hard reset main/master")
        );
        assert_eq!(g.evaluate("git push origin feature"), None);
    }

    #[test]
    fn test_disk_operations() {
        let g = guard();
        assert_eq!(g.evaluate("diskutil eraseDisk APFS x disk2"), Some("erasing disk"));
        assert_eq!(g.evaluate("DISKUTIL ERASEDISK"), Some("erasing disk"));
        assert_eq!(
            g.evaluate("dd if=img.iso of=/dev/disk4 bs=1m"),
            Some("dd to raw device")
        );
    }

    #[test]
    fn test_port_kills() {
        let g = guard();
        assert_eq!(g.evaluate("lsof -ti:3000 | xargs kill -9"), Some(BLIND_PORT_KILL));
        assert_eq!(g.evaluate("kill -9 $(lsof -ti:3000)"), Some(BLIND_PORT_KILL));
        assert_eq!(g.evaluate("kill `lsof -ti:3000`"), Some(BLIND_PORT_KILL));
        assert_eq!(g.evaluate("kill $(lsof -ti:3000 -sTCP:LISTEN)"), None);
        assert_eq!(
            g.evaluate("pkill -f node:3000"),
            Some("pkill by port - use: kill $(lsof -ti:PORT -sTCP:LISTEN)")
        );
    }

    #[test]
    fn test_browser_kills_case_insensitive() {
        let g = guard();
        assert_eq!(
            g.evaluate("pkill -f Firefox"),
            Some("NEVER kill firefox - ask user to restart")
        );
        assert_eq!(
            g.evaluate("killall 'Google Chrome'"),
            Some("NEVER kill chrome - ask user to restart")
        );
        assert_eq!(
            g.evaluate("pkill Electron"),
            Some("NEVER kill electron apps - ask user to restart")
        );
        assert_eq!(
            g.evaluate("pgrep node | xargs kill"),
            Some("NEVER kill processes via pgrep pipe - ask user")
        );
        assert_eq!(
            g.evaluate("osascript -e 'quit app \"Safari\"'"),
            Some("NEVER quit Safari via osascript - ask user")
        );
    }

    #[test]
    fn test_clone_requires_authorization() {
        let g = guard();
        assert_eq!(
            g.evaluate("git clone https://example.com/r.git"),
            Some("NEVER git clone without explicit user authorization")
        );
        assert_eq!(
            g.evaluate("gh repo clone owner/repo"),
            Some("NEVER gh repo clone without explicit user authorization")
        );
    }

    #[test]
    fn test_benign_commands_pass() {
        let g = guard();
        for cmd in ["ls -la", "cargo test", "git status", "echo hello > out.txt", ""] {
            assert_eq!(g.evaluate(cmd), None, "{cmd}");
        }
    }

    #[test]
    fn test_invalid_rule_is_an_error() {
        let rules = [BlockRule::new(r"(unclosed", "broken")];
        assert!(matches!(
            PatternGuard::with_rules(&rules),
            Err(HookwardenError::Guard(_))
        ));
    }

    #[test]
    fn test_custom_rule_table() {
        let rules = [BlockRule::new(r"shutdown\s+-h", "halting the machine")];
        let g = PatternGuard::with_rules(&rules).unwrap();
        assert_eq!(g.evaluate("sudo shutdown -h now"), Some("halting the machine"));
        assert_eq!(g.evaluate("rm -rf /"), None);
    }
}
