use crate::event::HookPhase;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The terminal outcome of mediating one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// No response is emitted; the host proceeds with the original action.
    SilentAllow,
    /// The host proceeds using a replacement input.
    AllowModified {
        /// Replacement tool input.
        updated_input: Map<String, Value>,
        /// Optional explanation shown to the host.
        reason: Option<String>,
    },
    /// The host proceeds, given extra context alongside the original output.
    AllowAnnotated {
        /// Context text attached to the tool result.
        context: String,
    },
    /// The host must not proceed.
    Deny {
        /// Why the action was denied; may carry safe replacement content.
        reason: String,
    },
    /// Post-execution form of a deny: the action already ran, so its output
    /// is swapped for a redacted value of the same shape instead of blocking.
    ReplaceOutput {
        /// Replacement tool output.
        output: Value,
    },
}

impl Decision {
    /// Creates a deny decision.
    pub fn deny(reason: impl Into<String>) -> Self {
        Decision::Deny {
            reason: reason.into(),
        }
    }

    /// Creates an allow decision carrying a replacement input.
    pub fn allow_modified(updated_input: Map<String, Value>, reason: Option<String>) -> Self {
        Decision::AllowModified {
            updated_input,
            reason,
        }
    }

    /// True for [`Decision::SilentAllow`].
    pub fn is_silent(&self) -> bool {
        matches!(self, Decision::SilentAllow)
    }

    /// True for [`Decision::Deny`].
    pub fn is_deny(&self) -> bool {
        matches!(self, Decision::Deny { .. })
    }

    /// Builds the response envelope for this decision. Silent allows produce
    /// no envelope at all.
    pub fn into_response(self, phase: HookPhase) -> Option<HookResponse> {
        let mut out = HookSpecificOutput::new(phase);
        match self {
            Decision::SilentAllow => return None,
            Decision::AllowModified {
                updated_input,
                reason,
            } => {
                out.permission_decision = Some(PermissionDecision::Allow);
                out.permission_decision_reason = reason;
                out.updated_input = Some(updated_input);
            }
            Decision::AllowAnnotated { context } => {
                out.additional_context = Some(context);
            }
            Decision::Deny { reason } => {
                out.permission_decision = Some(PermissionDecision::Deny);
                out.permission_decision_reason = Some(reason);
            }
            Decision::ReplaceOutput { output } => {
                out.updated_mcp_tool_output = Some(output);
            }
        }
        Some(HookResponse {
            hook_specific_output: out,
        })
    }
}

/// Value of `permissionDecision` in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDecision {
    /// Proceed.
    Allow,
    /// Do not proceed.
    Deny,
}

/// Response envelope written to stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResponse {
    /// Hook-specific payload.
    pub hook_specific_output: HookSpecificOutput,
}

/// The payload of a [`HookResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    /// `PreToolUse` or `PostToolUse`.
    pub hook_event_name: String,
    /// Allow or deny; absent for post-execution annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_decision: Option<PermissionDecision>,
    /// Explanation accompanying the permission decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_decision_reason: Option<String>,
    /// Replacement tool input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_input: Option<Map<String, Value>>,
    /// Extra context appended to the tool result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
    /// Replacement output for extension-provided tools.
    #[serde(
        rename = "updatedMCPToolOutput",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_mcp_tool_output: Option<Value>,
}

impl HookSpecificOutput {
    fn new(phase: HookPhase) -> Self {
        Self {
            hook_event_name: phase.event_name().to_string(),
            permission_decision: None,
            permission_decision_reason: None,
            updated_input: None,
            additional_context: None,
            updated_mcp_tool_output: None,
        }
    }
}

impl HookResponse {
    /// Serializes the envelope as a single JSON line.
    pub fn to_json(&self) -> crate::HookwardenResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_silent_allow_has_no_response() {
        assert!(Decision::SilentAllow
            .into_response(HookPhase::PreToolUse)
            .is_none());
    }

    #[test]
    fn test_deny_envelope() {
        let resp = Decision::deny("nope")
            .into_response(HookPhase::PreToolUse)
            .unwrap();
        let value: Value = serde_json::from_str(&resp.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"hookSpecificOutput": {
                "hookEventName": "PreToolUse",
                "permissionDecision": "deny",
                "permissionDecisionReason": "nope"
            }})
        );
    }

    #[test]
    fn test_allow_modified_envelope() {
        let mut input = Map::new();
        input.insert("command".to_string(), json!("bun i"));
        let resp = Decision::allow_modified(input, Some("rewrote".to_string()))
            .into_response(HookPhase::PreToolUse)
            .unwrap();
        let value = serde_json::to_value(&resp).unwrap();
        let out = &value["hookSpecificOutput"];
        assert_eq!(out["permissionDecision"], "allow");
        assert_eq!(out["permissionDecisionReason"], "rewrote");
        assert_eq!(out["updatedInput"], json!({"command": "bun i"}));
        assert!(out.get("additionalContext").is_none());
    }

    #[test]
    fn test_post_execution_envelopes() {
        let annotated = Decision::AllowAnnotated {
            context: "ctx".to_string(),
        }
        .into_response(HookPhase::PostToolUse)
        .unwrap();
        let value = serde_json::to_value(&annotated).unwrap();
        assert_eq!(
            value,
            json!({"hookSpecificOutput": {"hookEventName": "PostToolUse", "additionalContext": "ctx"}})
        );

        let replaced = Decision::ReplaceOutput {
            output: json!({"text": "[FILTERED]"}),
        }
        .into_response(HookPhase::PostToolUse)
        .unwrap();
        let value = serde_json::to_value(&replaced).unwrap();
        assert_eq!(
            value["hookSpecificOutput"]["updatedMCPToolOutput"],
            json!({"text": "[FILTERED]"})
        );
        assert!(value["hookSpecificOutput"]
            .get("permissionDecision")
            .is_none());
    }
}
