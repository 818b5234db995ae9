use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tool names starting with this prefix are provided by an external
/// extension server rather than by the host itself.
pub const PLUGGABLE_TOOL_PREFIX: &str = "mcp__";

/// When in the tool lifecycle a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    /// Before the tool executes; the hook may deny or rewrite the input.
    PreToolUse,
    /// After the tool completed; the hook may only annotate or replace output.
    PostToolUse,
}

impl HookPhase {
    /// The `hookEventName` the host expects in the response envelope.
    pub fn event_name(self) -> &'static str {
        match self {
            HookPhase::PreToolUse => "PreToolUse",
            HookPhase::PostToolUse => "PostToolUse",
        }
    }
}

/// The tool families the mediator distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// `Bash`: shell command execution.
    Shell,
    /// `Read`: file read.
    FileRead,
    /// `Grep`: pattern search over files.
    Search,
    /// `WebFetch`: URL retrieval.
    WebFetch,
    /// Any other host-native or extension-provided tool.
    Other,
}

impl ToolKind {
    /// Classifies a tool by its host name.
    pub fn from_tool_name(name: &str) -> Self {
        match name {
            "Bash" => ToolKind::Shell,
            "Read" => ToolKind::FileRead,
            "Grep" => ToolKind::Search,
            "WebFetch" => ToolKind::WebFetch,
            _ => ToolKind::Other,
        }
    }
}

/// One tool invocation delivered by the host on stdin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookEvent {
    /// Name of the invoked capability (`Bash`, `Read`, `mcp__server__tool`, ...).
    #[serde(default)]
    pub tool_name: String,
    /// Named parameters of the invocation.
    #[serde(default)]
    pub tool_input: Map<String, Value>,
    /// Output of the tool; only present for post-execution events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<Value>,
    /// Host session identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Working directory of the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

impl HookEvent {
    /// Creates an event with the given tool name and input parameters.
    pub fn new(tool_name: impl Into<String>, tool_input: Value) -> Self {
        let tool_input = match tool_input {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            tool_name: tool_name.into(),
            tool_input,
            ..Self::default()
        }
    }

    /// Parses an event from its JSON encoding.
    pub fn from_json(raw: &str) -> crate::HookwardenResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Attaches tool output, turning this into a post-execution event.
    pub fn with_output(mut self, output: Value) -> Self {
        self.tool_output = Some(output);
        self
    }

    /// Sets the session identifier.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Sets the working directory.
    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// The tool family of this event.
    pub fn tool_kind(&self) -> ToolKind {
        ToolKind::from_tool_name(&self.tool_name)
    }

    /// True when the tool comes from an extension server.
    pub fn is_pluggable_tool(&self) -> bool {
        self.tool_name.starts_with(PLUGGABLE_TOOL_PREFIX)
    }

    /// String parameter, or `""` when absent or not a string.
    pub fn input_str(&self, key: &str) -> &str {
        self.tool_input
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Boolean parameter, `None` when absent or not a boolean.
    pub fn input_bool(&self, key: &str) -> Option<bool> {
        self.tool_input.get(key).and_then(Value::as_bool)
    }

    /// Positive numeric parameter. Floats are truncated; zero and negative
    /// values count as absent.
    pub fn input_count(&self, key: &str) -> Option<u64> {
        let value = self.tool_input.get(key)?;
        let n = value
            .as_u64()
            .or_else(|| value.as_f64().filter(|f| *f >= 1.0).map(|f| f as u64))?;
        (n > 0).then_some(n)
    }

    /// The tool output flattened to text: strings verbatim, everything else
    /// as compact JSON, absent output as the empty string.
    pub fn output_text(&self) -> String {
        match &self.tool_output {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}
