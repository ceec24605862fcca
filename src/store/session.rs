//! Session entities reconstructed from conversation logs.
//!
//! A [`Session`] is one tracked execution context, either a top-level
//! conversation or a sub-agent spawned by one. Everything here is plain
//! data; mutation rules live in the store.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::history::BoundedLog;

/// Lifecycle state of a session.
///
/// Removal from the store is deletion, not a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Recently produced log activity.
    Active,
    /// Still tracked but quiet past the idle threshold.
    Idle,
    /// Saw a terminal result record.
    Completed,
    /// Ended with an error.
    Error,
}

/// Terminal state of a tool execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// Invocation seen, no result yet.
    Running,
    /// Result arrived without an error flag.
    Completed,
    /// Result arrived flagged as an error.
    Failed,
}

/// Cumulative token counters for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Input tokens.
    pub input: u64,
    /// Output tokens.
    pub output: u64,
    /// Cache-read input tokens.
    pub cache_read: u64,
    /// Cache-creation input tokens.
    pub cache_creation: u64,
    /// Always `input + output`.
    pub total: u64,
}

/// One assistant turn's worth of token counts, added onto [`TokenUsage`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenDelta {
    /// Input tokens for the turn.
    pub input: u64,
    /// Output tokens for the turn.
    pub output: u64,
    /// Cache-read input tokens for the turn.
    pub cache_read: u64,
    /// Cache-creation input tokens for the turn.
    pub cache_creation: u64,
}

impl TokenDelta {
    /// Whether every counter is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.input == 0 && self.output == 0 && self.cache_read == 0 && self.cache_creation == 0
    }
}

impl TokenUsage {
    /// Add one turn's counts, keeping `total == input + output`.
    pub fn apply(&mut self, delta: TokenDelta) {
        self.input += delta.input;
        self.output += delta.output;
        self.cache_read += delta.cache_read;
        self.cache_creation += delta.cache_creation;
        self.total = self.input + self.output;
    }
}

/// A single tool invocation span.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolExecution {
    /// Tool name as reported by the log ("Bash", "Read", ...).
    pub name: String,
    /// Tool-specific detail (command text, file path, search pattern, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// When the invocation was seen.
    pub start_time: DateTime<Utc>,
    /// When the result was seen, unset while running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Running, completed or failed.
    pub status: ToolStatus,
}

impl ToolExecution {
    /// Start a new running execution.
    #[must_use]
    pub fn started(name: impl Into<String>, detail: Option<String>, at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            detail,
            start_time: at,
            end_time: None,
            status: ToolStatus::Running,
        }
    }
}

/// Who produced a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Human prompt.
    User,
    /// Model text output.
    Assistant,
}

/// One truncated message retained for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEntry {
    /// Message author.
    pub role: MessageRole,
    /// Truncated text content.
    pub content: String,
    /// Record timestamp.
    pub timestamp: DateTime<Utc>,
}

/// State of one task-list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    /// Not started.
    Pending,
    /// Currently being worked.
    InProgress,
    /// Done.
    Completed,
}

/// One entry of a session's task-list snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    /// Task description.
    pub content: String,
    /// Current state.
    pub status: TodoStatus,
    /// Present-tense form shown while in progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_form: Option<String>,
}

/// One tracked execution context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Stable unique id (session id, or agent id for sub-agents).
    pub id: String,
    /// Lifecycle state.
    pub status: SessionStatus,
    /// When the session was first seen.
    pub start_time: DateTime<Utc>,
    /// Timestamp of the most recent record or keep-alive.
    pub last_activity: DateTime<Utc>,
    /// Model id, set once by the first assistant record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Short display form of the model id, derived when `model` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_short: Option<String>,
    /// Working directory, set once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Git branch, set once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    /// Client version, set once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Most recent real user prompt, truncated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_prompt: Option<String>,
    /// Cumulative token counters.
    pub tokens: TokenUsage,
    /// Estimated USD cost, recomputed on every token update.
    pub estimated_cost: f64,
    /// In-flight tool execution, at most one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_tool: Option<ToolExecution>,
    /// Completed tool executions, newest first, bounded.
    pub tool_history: BoundedLog<ToolExecution>,
    /// Retained messages, oldest first, bounded.
    pub messages: BoundedLog<MessageEntry>,
    /// Ids of sub-agents spawned by this session.
    pub sub_agents: BTreeSet<String>,
    /// Parent session id, set for sub-agents only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_session_id: Option<String>,
    /// Agent id, set for sub-agents only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Whether this entity is a sub-agent.
    pub is_sub_agent: bool,
    /// Latest task-list snapshot, replaced wholesale.
    pub todos: Vec<TodoItem>,
}

impl Session {
    /// Create a fresh active session.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        at: DateTime<Utc>,
        max_tool_history: usize,
        max_messages: usize,
    ) -> Self {
        Self {
            id: id.into(),
            status: SessionStatus::Active,
            start_time: at,
            last_activity: at,
            model: None,
            model_short: None,
            cwd: None,
            git_branch: None,
            version: None,
            last_prompt: None,
            tokens: TokenUsage::default(),
            estimated_cost: 0.0,
            current_tool: None,
            tool_history: BoundedLog::new(max_tool_history),
            messages: BoundedLog::new(max_messages),
            sub_agents: BTreeSet::new(),
            parent_session_id: None,
            agent_id: None,
            is_sub_agent: false,
            todos: Vec::new(),
        }
    }

    /// Advance `last_activity`, never moving it backwards.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.last_activity {
            self.last_activity = at;
        }
    }

    /// Time since the last recorded activity.
    #[must_use]
    pub fn inactivity(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_activity
    }

    /// Move the in-flight tool execution into history with the given status.
    ///
    /// Returns `false` when no tool was open.
    pub fn close_current_tool(&mut self, status: ToolStatus, at: DateTime<Utc>) -> bool {
        let Some(mut tool) = self.current_tool.take() else {
            return false;
        };
        tool.status = status;
        tool.end_time = Some(at);
        self.tool_history.prepend(tool);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_token_usage_apply_maintains_total() {
        let mut tokens = TokenUsage::default();
        tokens.apply(TokenDelta {
            input: 100,
            output: 40,
            cache_read: 7,
            cache_creation: 3,
        });
        tokens.apply(TokenDelta {
            input: 10,
            output: 5,
            ..TokenDelta::default()
        });

        assert_eq!(tokens.input, 110);
        assert_eq!(tokens.output, 45);
        assert_eq!(tokens.cache_read, 7);
        assert_eq!(tokens.cache_creation, 3);
        assert_eq!(tokens.total, tokens.input + tokens.output);
    }

    #[test]
    fn test_new_session_defaults() {
        let session = Session::new("abc", ts(1000), 10, 20);

        assert_eq!(session.id, "abc");
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.start_time, session.last_activity);
        assert!(session.model.is_none());
        assert!(session.current_tool.is_none());
        assert!(!session.is_sub_agent);
        assert_eq!(session.tool_history.capacity(), 10);
        assert_eq!(session.messages.capacity(), 20);
    }

    #[test]
    fn test_touch_is_monotonic() {
        let mut session = Session::new("abc", ts(1000), 10, 20);
        session.touch(ts(2000));
        assert_eq!(session.last_activity, ts(2000));

        // Older timestamps never move activity backwards
        session.touch(ts(1500));
        assert_eq!(session.last_activity, ts(2000));
    }

    #[test]
    fn test_inactivity() {
        let session = Session::new("abc", ts(1000), 10, 20);
        assert_eq!(session.inactivity(ts(1090)), Duration::seconds(90));
    }

    #[test]
    fn test_close_current_tool_moves_to_history() {
        let mut session = Session::new("abc", ts(1000), 10, 20);
        session.current_tool = Some(ToolExecution::started(
            "Bash",
            Some("ls".to_string()),
            ts(1001),
        ));

        assert!(session.close_current_tool(ToolStatus::Completed, ts(1002)));
        assert!(session.current_tool.is_none());
        assert_eq!(session.tool_history.len(), 1);

        let entry = session.tool_history.front().unwrap();
        assert_eq!(entry.name, "Bash");
        assert_eq!(entry.status, ToolStatus::Completed);
        assert_eq!(entry.end_time, Some(ts(1002)));
    }

    #[test]
    fn test_close_current_tool_without_open_tool() {
        let mut session = Session::new("abc", ts(1000), 10, 20);
        assert!(!session.close_current_tool(ToolStatus::Failed, ts(1002)));
        assert!(session.tool_history.is_empty());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(
            serde_json::to_string(&ToolStatus::Failed).unwrap(),
            "\"failed\""
        );
    }

    #[test]
    fn test_session_serializes_camel_case() {
        let session = Session::new("abc", ts(1000), 10, 20);
        let json = serde_json::to_value(&session).unwrap();

        assert!(json.get("startTime").is_some());
        assert!(json.get("lastActivity").is_some());
        assert!(json.get("isSubAgent").is_some());
        assert!(json.get("estimatedCost").is_some());
        // Unset options are omitted entirely
        assert!(json.get("model").is_none());
        assert!(json.get("parentSessionId").is_none());
    }

    #[test]
    fn test_todo_item_parses_snapshot_shape() {
        let json = r#"{"content":"Fix tests","status":"in_progress","activeForm":"Fixing tests"}"#;
        let item: TodoItem = serde_json::from_str(json).unwrap();

        assert_eq!(item.content, "Fix tests");
        assert_eq!(item.status, TodoStatus::InProgress);
        assert_eq!(item.active_form.as_deref(), Some("Fixing tests"));
    }
}
