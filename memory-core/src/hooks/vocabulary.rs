//! The fixed hook vocabulary (spec §4.4). No other hook ids are accepted;
//! unlike the teacher's MCP tool surface, this set is closed at compile time
//! (spec §9 redesign flag: typed operations over a dynamic registry).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookId {
    SessionStart,
    SessionEnd,
    ConversationTurn,
    UserPromptSubmit,
    AssistantResponse,
    TaskStarted,
    TaskCompleted,
    ErrorOccurred,
    PreToolUse,
    PostToolUse,
    ConsolidationStart,
    ConsolidationComplete,
    PreClear,
}

impl HookId {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HookId::SessionStart => "session_start",
            HookId::SessionEnd => "session_end",
            HookId::ConversationTurn => "conversation_turn",
            HookId::UserPromptSubmit => "user_prompt_submit",
            HookId::AssistantResponse => "assistant_response",
            HookId::TaskStarted => "task_started",
            HookId::TaskCompleted => "task_completed",
            HookId::ErrorOccurred => "error_occurred",
            HookId::PreToolUse => "pre_tool_use",
            HookId::PostToolUse => "post_tool_use",
            HookId::ConsolidationStart => "consolidation_start",
            HookId::ConsolidationComplete => "consolidation_complete",
            HookId::PreClear => "pre_clear",
        }
    }
}

/// The payload passed to `fire` (spec §4.4 "fire(args) -> event_id").
#[derive(Debug, Clone, Default)]
pub struct HookArgs {
    pub session_id: String,
    pub project_id: String,
    pub content: String,
    pub context: crate::types::EventContext,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_hook_id_has_a_stable_wire_name() {
        assert_eq!(HookId::SessionStart.as_str(), "session_start");
        assert_eq!(HookId::PreClear.as_str(), "pre_clear");
    }
}
