//! JSONL parser for Claude Code conversation files.
//!
//! Parses `~/.claude/projects/<hash>/*.jsonl` session files, the aggregate
//! `~/.claude/history.jsonl` prompt log and `~/.claude/todos/*.json`
//! snapshots. Every field beyond the `type` discriminator is optional:
//! entries written by newer or older clients must still decode.

use serde::Deserialize;

use crate::store::TodoItem;

/// A single entry in a Claude Code JSONL conversation file.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum JournalEntry {
    /// User message, possibly carrying embedded tool results
    User(UserEntry),
    /// Assistant response
    Assistant(AssistantEntry),
    /// Standalone tool result
    #[serde(rename = "tool_result")]
    ToolResult(ToolResultEntry),
    /// Terminal entry marking session completion
    Result(ResultEntry),
    /// Queue operation (headless mode)
    QueueOperation(QueueOperationEntry),
    /// Unknown entry type (forward compatibility)
    #[serde(other)]
    Unknown,
}

/// User message entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    pub session_id: Option<String>,
    pub agent_id: Option<String>,
    pub timestamp: Option<String>,
    pub cwd: Option<String>,
    pub git_branch: Option<String>,
    pub version: Option<String>,
    pub is_sidechain: Option<bool>,
    pub is_meta: Option<bool>,
    pub message: Option<Message>,
    pub tool_use_result: Option<serde_json::Value>,
}

/// Assistant message entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantEntry {
    pub session_id: Option<String>,
    pub agent_id: Option<String>,
    pub timestamp: Option<String>,
    pub cwd: Option<String>,
    pub git_branch: Option<String>,
    pub version: Option<String>,
    pub is_sidechain: Option<bool>,
    pub message: Option<Message>,
}

/// Standalone tool result entry.
///
/// The result payload keys stay snake_case on the wire, unlike the
/// camelCase envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultEntry {
    pub session_id: Option<String>,
    pub agent_id: Option<String>,
    pub timestamp: Option<String>,
    pub cwd: Option<String>,
    pub git_branch: Option<String>,
    #[serde(rename = "tool_use_id")]
    pub tool_use_id: Option<String>,
    #[serde(rename = "is_error")]
    pub is_error: Option<bool>,
    pub content: Option<serde_json::Value>,
}

/// Terminal entry marking session completion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    pub session_id: Option<String>,
    pub agent_id: Option<String>,
    pub timestamp: Option<String>,
    pub cwd: Option<String>,
    pub git_branch: Option<String>,
    pub subtype: Option<String>,
}

/// Queue operation entry (headless mode).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueOperationEntry {
    pub operation: Option<String>,
    pub timestamp: Option<String>,
    pub session_id: Option<String>,
}

/// A message with role and content.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub role: Option<String>,
    pub content: Option<MessageContent>,
    pub model: Option<String>,
    pub usage: Option<Usage>,
}

/// Token usage attached to an assistant message.
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
}

/// Message content - can be plain text or structured blocks.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content
    Text(String),
    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

/// A content block within a message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text { text: String },
    /// Tool use request
    ToolUse {
        id: Option<String>,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    /// Tool result delivered inside a user message
    ToolResult {
        tool_use_id: Option<String>,
        content: Option<serde_json::Value>,
        is_error: Option<bool>,
    },
    /// Thinking block
    Thinking { thinking: String },
    /// Unknown block type
    #[serde(other)]
    Unknown,
}

/// One line of the aggregate prompt history file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub display: Option<String>,
    pub timestamp: Option<HistoryTimestamp>,
    pub project: Option<String>,
    pub session_id: Option<String>,
}

/// History timestamps appear as epoch milliseconds or RFC 3339 text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HistoryTimestamp {
    Millis(i64),
    Rfc3339(String),
}

impl JournalEntry {
    /// Session id from the entry envelope, if present.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::User(entry) => entry.session_id.as_deref(),
            Self::Assistant(entry) => entry.session_id.as_deref(),
            Self::ToolResult(entry) => entry.session_id.as_deref(),
            Self::Result(entry) => entry.session_id.as_deref(),
            Self::QueueOperation(entry) => entry.session_id.as_deref(),
            Self::Unknown => None,
        }
    }

    /// Agent id from the entry envelope, if present.
    #[must_use]
    pub fn agent_id(&self) -> Option<&str> {
        match self {
            Self::User(entry) => entry.agent_id.as_deref(),
            Self::Assistant(entry) => entry.agent_id.as_deref(),
            Self::ToolResult(entry) => entry.agent_id.as_deref(),
            Self::Result(entry) => entry.agent_id.as_deref(),
            Self::QueueOperation(_) | Self::Unknown => None,
        }
    }
}

/// Extract text content from a message.
impl MessageContent {
    /// Get the text content as a string.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Parse JSONL content into journal entries.
///
/// Skips malformed lines with a warning.
#[must_use]
pub fn parse_jsonl_content(content: &str) -> Vec<JournalEntry> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<JournalEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Failed to parse JSONL line: {}", e);
                None
            }
        })
        .collect()
}

/// Parse aggregate history content into entries.
///
/// Skips malformed lines with a warning.
#[must_use]
pub fn parse_history_content(content: &str) -> Vec<HistoryEntry> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<HistoryEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Failed to parse history line: {}", e);
                None
            }
        })
        .collect()
}

/// Parse a todo snapshot file body into items.
#[must_use]
pub fn parse_todo_snapshot(content: &str) -> Option<Vec<TodoItem>> {
    match serde_json::from_str::<Vec<TodoItem>>(content) {
        Ok(items) => Some(items),
        Err(e) => {
            tracing::warn!("Failed to parse todo snapshot: {}", e);
            None
        }
    }
}
