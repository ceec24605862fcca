//! Maps parsed records onto session store mutations.
//!
//! Identity resolution happens here, ahead of any mutation: a record may
//! carry both a session id and an agent id, and sub-agent transcripts live
//! in files whose identity comes from the path when records omit ids.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::store::{MessageRole, SessionStore, TokenDelta};

use super::classify::{classify, RecordOwner};
use super::jsonl::{
    parse_jsonl_content, AssistantEntry, ContentBlock, HistoryEntry, HistoryTimestamp,
    JournalEntry, MessageContent, QueueOperationEntry, ResultEntry, ToolResultEntry, UserEntry,
};

/// Prompt prefixes injected by the CLI rather than typed by a person.
const PLACEHOLDER_PREFIXES: &[&str] = &[
    "<command-name>",
    "<command-message>",
    "<local-command-caveat>",
    "<local-command-stdout>",
    "<task-notification>",
    "<system-reminder>",
    "Caveat:",
    "[Request interrupted",
    "This session is being continued",
];

/// Whether prompt text is system-injected rather than typed by the user.
#[must_use]
pub fn is_placeholder(text: &str) -> bool {
    let trimmed = text.trim_start();
    PLACEHOLDER_PREFIXES
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
}

/// Apply every record in a transcript chunk to the store.
///
/// `file_id` is the identity derived from the file path, used when records
/// omit their own ids. `fallback_time` stamps records without a parseable
/// timestamp; startup backfill passes the file's mtime so replayed history
/// does not look freshly active.
pub fn apply_transcript(
    store: &mut SessionStore,
    file_id: &str,
    sub_agent_file: bool,
    content: &str,
    fallback_time: DateTime<Utc>,
) {
    for entry in parse_jsonl_content(content) {
        apply_record(store, file_id, sub_agent_file, &entry, fallback_time);
    }
}

/// Apply one parsed record to the store.
pub fn apply_record(
    store: &mut SessionStore,
    file_id: &str,
    sub_agent_file: bool,
    entry: &JournalEntry,
    fallback_time: DateTime<Utc>,
) {
    match entry {
        JournalEntry::User(user) => {
            apply_user_entry(store, file_id, sub_agent_file, user, fallback_time);
        }
        JournalEntry::Assistant(assistant) => {
            apply_assistant_entry(store, file_id, sub_agent_file, assistant, fallback_time);
        }
        JournalEntry::ToolResult(result) => {
            apply_tool_result_entry(store, file_id, sub_agent_file, result, fallback_time);
        }
        JournalEntry::Result(result) => {
            apply_result_entry(store, file_id, sub_agent_file, result, fallback_time);
        }
        JournalEntry::QueueOperation(op) => {
            apply_queue_operation(store, file_id, op, fallback_time);
        }
        JournalEntry::Unknown => {}
    }
}

/// Apply one aggregate-history record to the store.
///
/// History records resolve sessions purely by their embedded ids; entries
/// without one have no session to land in and are dropped.
pub fn apply_history(store: &mut SessionStore, entry: &HistoryEntry) {
    let Some(session_id) = entry.session_id.as_deref() else {
        return;
    };
    let at = history_time(entry.timestamp.as_ref()).unwrap_or_else(Utc::now);
    store.keep_alive(session_id, at);
    if let Some(display) = entry.display.as_deref() {
        if !is_placeholder(display) {
            store.set_prompt(session_id, display, at);
        }
    }
}

fn apply_user_entry(
    store: &mut SessionStore,
    file_id: &str,
    sub_agent_file: bool,
    entry: &UserEntry,
    fallback_time: DateTime<Utc>,
) {
    let at = record_time(entry.timestamp.as_deref(), fallback_time);
    let id = resolve_target(
        store,
        file_id,
        sub_agent_file,
        entry.session_id.as_deref(),
        entry.agent_id.as_deref(),
        at,
    );
    apply_envelope(
        store,
        &id,
        entry.cwd.as_deref(),
        entry.git_branch.as_deref(),
        entry.version.as_deref(),
        at,
    );

    // Tool results come back as user records; close the open tool before
    // any text handling.
    let content = entry.message.as_ref().and_then(|m| m.content.as_ref());
    let mut closed_tool = false;
    if let Some(MessageContent::Blocks(blocks)) = content {
        for block in blocks {
            if let ContentBlock::ToolResult { is_error, .. } = block {
                store.complete_tool(&id, is_error.unwrap_or(false), at);
                closed_tool = true;
            }
        }
    }
    if !closed_tool {
        if let Some(result) = &entry.tool_use_result {
            let failed = result.get("is_error").and_then(Value::as_bool) == Some(true);
            store.complete_tool(&id, failed, at);
        }
    }

    // Meta records wrap system-injected context, not a typed prompt.
    if entry.is_meta == Some(true) {
        return;
    }
    let Some(text) = content.map(MessageContent::as_text) else {
        return;
    };
    if text.trim().is_empty() || is_placeholder(&text) {
        return;
    }
    store.set_prompt(&id, &text, at);
    store.append_message(&id, MessageRole::User, &text, at);
}

fn apply_assistant_entry(
    store: &mut SessionStore,
    file_id: &str,
    sub_agent_file: bool,
    entry: &AssistantEntry,
    fallback_time: DateTime<Utc>,
) {
    let at = record_time(entry.timestamp.as_deref(), fallback_time);
    let id = resolve_target(
        store,
        file_id,
        sub_agent_file,
        entry.session_id.as_deref(),
        entry.agent_id.as_deref(),
        at,
    );
    apply_envelope(
        store,
        &id,
        entry.cwd.as_deref(),
        entry.git_branch.as_deref(),
        entry.version.as_deref(),
        at,
    );

    let Some(message) = &entry.message else {
        return;
    };
    if let Some(model) = message.model.as_deref() {
        store.set_model(&id, model, at);
    }
    if let Some(usage) = &message.usage {
        store.add_tokens(
            &id,
            TokenDelta {
                input: usage.input_tokens,
                output: usage.output_tokens,
                cache_read: usage.cache_read_input_tokens,
                cache_creation: usage.cache_creation_input_tokens,
            },
            at,
        );
    }
    match &message.content {
        Some(MessageContent::Text(text)) => {
            store.append_message(&id, MessageRole::Assistant, text, at);
        }
        Some(MessageContent::Blocks(blocks)) => {
            for block in blocks {
                match block {
                    ContentBlock::Text { text } => {
                        store.append_message(&id, MessageRole::Assistant, text, at);
                    }
                    ContentBlock::ToolUse { name, input, .. } => {
                        store.start_tool(&id, name, tool_detail(name, input), at);
                    }
                    _ => {}
                }
            }
        }
        None => {}
    }
}

fn apply_tool_result_entry(
    store: &mut SessionStore,
    file_id: &str,
    sub_agent_file: bool,
    entry: &ToolResultEntry,
    fallback_time: DateTime<Utc>,
) {
    let at = record_time(entry.timestamp.as_deref(), fallback_time);
    let id = resolve_target(
        store,
        file_id,
        sub_agent_file,
        entry.session_id.as_deref(),
        entry.agent_id.as_deref(),
        at,
    );
    apply_envelope(
        store,
        &id,
        entry.cwd.as_deref(),
        entry.git_branch.as_deref(),
        None,
        at,
    );
    store.complete_tool(&id, entry.is_error.unwrap_or(false), at);
}

fn apply_result_entry(
    store: &mut SessionStore,
    file_id: &str,
    sub_agent_file: bool,
    entry: &ResultEntry,
    fallback_time: DateTime<Utc>,
) {
    let at = record_time(entry.timestamp.as_deref(), fallback_time);
    let id = resolve_target(
        store,
        file_id,
        sub_agent_file,
        entry.session_id.as_deref(),
        entry.agent_id.as_deref(),
        at,
    );
    apply_envelope(
        store,
        &id,
        entry.cwd.as_deref(),
        entry.git_branch.as_deref(),
        None,
        at,
    );
    store.complete_session(&id, at);
}

fn apply_queue_operation(
    store: &mut SessionStore,
    file_id: &str,
    entry: &QueueOperationEntry,
    fallback_time: DateTime<Utc>,
) {
    // Only dequeue signals a session actually picking up work.
    if entry.operation.as_deref() != Some("dequeue") {
        return;
    }
    let at = record_time(entry.timestamp.as_deref(), fallback_time);
    let id = entry.session_id.as_deref().unwrap_or(file_id);
    store.keep_alive(id, at);
}

/// Resolve the session a record lands in, creating it if needed.
fn resolve_target(
    store: &mut SessionStore,
    file_id: &str,
    sub_agent_file: bool,
    session_id: Option<&str>,
    agent_id: Option<&str>,
    at: DateTime<Utc>,
) -> String {
    let session_id = session_id.unwrap_or(file_id);
    // Sub-agent files name the agent in their path even when records omit it.
    let agent_id = agent_id.or_else(|| sub_agent_file.then_some(file_id));
    match classify(session_id, agent_id, sub_agent_file) {
        RecordOwner::Session { id } => {
            store.get_or_create(&id, at);
            id
        }
        RecordOwner::SubAgent {
            agent_id,
            parent_id,
        } => {
            store.ensure_sub_agent(&parent_id, &agent_id, at);
            agent_id
        }
    }
}

/// First-writer-wins envelope attributes shared by most record types.
fn apply_envelope(
    store: &mut SessionStore,
    id: &str,
    cwd: Option<&str>,
    git_branch: Option<&str>,
    version: Option<&str>,
    at: DateTime<Utc>,
) {
    if let Some(cwd) = cwd {
        store.set_cwd(id, cwd, at);
    }
    if let Some(branch) = git_branch {
        store.set_git_branch(id, branch, at);
    }
    if let Some(version) = version {
        store.set_version(id, version, at);
    }
}

/// Parse a record's RFC 3339 timestamp, falling back when absent or bad.
fn record_time(timestamp: Option<&str>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map_or(fallback, |ts| ts.with_timezone(&Utc))
}

fn history_time(timestamp: Option<&HistoryTimestamp>) -> Option<DateTime<Utc>> {
    match timestamp? {
        HistoryTimestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms),
        HistoryTimestamp::Rfc3339(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
    }
}

/// Extract a display detail for a tool invocation from its input payload.
#[must_use]
pub fn tool_detail(name: &str, input: &Value) -> Option<String> {
    let field = |key: &str| input.get(key).and_then(Value::as_str).map(str::to_string);
    match name {
        "Bash" => field("command"),
        "Read" | "Write" | "Edit" | "NotebookEdit" => field("file_path"),
        "Grep" | "Glob" => field("pattern"),
        "WebFetch" => field("url"),
        "WebSearch" => field("query"),
        "Task" => field("subagent_type").or_else(|| field("description")),
        "TodoWrite" => input
            .get("todos")
            .and_then(Value::as_array)
            .map(|todos| format!("{} todos", todos.len())),
        _ => field("description").or_else(|| field("path")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SessionStatus, StoreConfig, ToolStatus};
    use serde_json::json;

    const FALLBACK: &str = "2026-02-10T09:00:00Z";

    fn fallback() -> DateTime<Utc> {
        FALLBACK.parse().unwrap()
    }

    fn store() -> SessionStore {
        SessionStore::new(StoreConfig::default())
    }

    fn create_user(session_id: &str, text: &str) -> String {
        format!(
            r#"{{"type":"user","sessionId":"{session_id}","timestamp":"2026-02-10T10:00:00Z","cwd":"/home/dev/app","gitBranch":"main","version":"2.1.25","message":{{"role":"user","content":"{text}"}}}}"#
        )
    }

    fn create_assistant_text(session_id: &str, model: &str, text: &str) -> String {
        format!(
            r#"{{"type":"assistant","sessionId":"{session_id}","timestamp":"2026-02-10T10:00:05Z","message":{{"role":"assistant","model":"{model}","usage":{{"input_tokens":100,"output_tokens":40}},"content":[{{"type":"text","text":"{text}"}}]}}}}"#
        )
    }

    fn create_assistant_tool_use(session_id: &str, tool: &str, input: &str) -> String {
        format!(
            r#"{{"type":"assistant","sessionId":"{session_id}","timestamp":"2026-02-10T10:00:10Z","message":{{"role":"assistant","content":[{{"type":"tool_use","id":"tu-1","name":"{tool}","input":{input}}}]}}}}"#
        )
    }

    fn create_tool_result(session_id: &str, is_error: bool) -> String {
        format!(
            r#"{{"type":"tool_result","sessionId":"{session_id}","timestamp":"2026-02-10T10:00:15Z","tool_use_id":"tu-1","is_error":{is_error}}}"#
        )
    }

    fn create_result(session_id: &str) -> String {
        format!(
            r#"{{"type":"result","sessionId":"{session_id}","timestamp":"2026-02-10T10:00:20Z","subtype":"success"}}"#
        )
    }

    fn parse(json: &str) -> JournalEntry {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_user_record_sets_prompt_and_message() {
        let mut store = store();
        let entry = parse(&create_user("sess-1", "fix the flaky test"));

        apply_record(&mut store, "sess-1", false, &entry, fallback());

        let session = store.get("sess-1").unwrap();
        assert_eq!(session.last_prompt.as_deref(), Some("fix the flaky test"));
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages.front().unwrap().role, MessageRole::User);
        assert_eq!(session.cwd.as_deref(), Some("/home/dev/app"));
        assert_eq!(session.git_branch.as_deref(), Some("main"));
        assert_eq!(session.version.as_deref(), Some("2.1.25"));
    }

    #[test]
    fn test_placeholder_prompts_are_skipped() {
        let mut store = store();
        for text in [
            "<command-name>/compact</command-name>",
            "Caveat: the messages below were generated",
            "[Request interrupted by user]",
        ] {
            let entry = parse(&create_user("sess-1", &text.replace('"', "")));
            apply_record(&mut store, "sess-1", false, &entry, fallback());
        }

        let session = store.get("sess-1").unwrap();
        assert!(session.last_prompt.is_none());
        assert!(session.messages.is_empty());
    }

    #[test]
    fn test_meta_user_record_keeps_content_out() {
        let mut store = store();
        let json = r#"{"type":"user","sessionId":"sess-1","isMeta":true,"message":{"role":"user","content":"injected context"}}"#;

        apply_record(&mut store, "sess-1", false, &parse(json), fallback());

        let session = store.get("sess-1").unwrap();
        assert!(session.last_prompt.is_none());
        assert!(session.messages.is_empty());
    }

    #[test]
    fn test_assistant_record_extracts_model_tokens_and_text() {
        let mut store = store();
        let entry = parse(&create_assistant_text(
            "sess-1",
            "claude-opus-4-20250514",
            "On it.",
        ));

        apply_record(&mut store, "sess-1", false, &entry, fallback());

        let session = store.get("sess-1").unwrap();
        assert_eq!(session.model.as_deref(), Some("claude-opus-4-20250514"));
        assert_eq!(session.model_short.as_deref(), Some("Opus 4"));
        assert_eq!(session.tokens.input, 100);
        assert_eq!(session.tokens.output, 40);
        assert_eq!(session.tokens.total, 140);
        assert_eq!(session.messages.len(), 1);
        assert_eq!(
            session.messages.front().unwrap().role,
            MessageRole::Assistant
        );
    }

    #[test]
    fn test_tool_use_starts_tool_with_detail() {
        let mut store = store();
        let entry = parse(&create_assistant_tool_use(
            "sess-1",
            "Bash",
            r#"{"command":"cargo test"}"#,
        ));

        apply_record(&mut store, "sess-1", false, &entry, fallback());

        let session = store.get("sess-1").unwrap();
        let tool = session.current_tool.as_ref().unwrap();
        assert_eq!(tool.name, "Bash");
        assert_eq!(tool.detail.as_deref(), Some("cargo test"));
        assert_eq!(tool.status, ToolStatus::Running);
    }

    #[test]
    fn test_tool_result_record_completes_tool() {
        let mut store = store();
        apply_record(
            &mut store,
            "sess-1",
            false,
            &parse(&create_assistant_tool_use(
                "sess-1",
                "Bash",
                r#"{"command":"ls"}"#,
            )),
            fallback(),
        );
        apply_record(
            &mut store,
            "sess-1",
            false,
            &parse(&create_tool_result("sess-1", true)),
            fallback(),
        );

        let session = store.get("sess-1").unwrap();
        assert!(session.current_tool.is_none());
        assert_eq!(session.tool_history.len(), 1);
        assert_eq!(
            session.tool_history.front().unwrap().status,
            ToolStatus::Failed
        );
    }

    #[test]
    fn test_embedded_tool_result_block_completes_tool() {
        let mut store = store();
        apply_record(
            &mut store,
            "sess-1",
            false,
            &parse(&create_assistant_tool_use(
                "sess-1",
                "Read",
                r#"{"file_path":"/tmp/a.rs"}"#,
            )),
            fallback(),
        );
        let json = r#"{"type":"user","sessionId":"sess-1","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"tu-1","content":"file contents"}]}}"#;
        apply_record(&mut store, "sess-1", false, &parse(json), fallback());

        let session = store.get("sess-1").unwrap();
        assert!(session.current_tool.is_none());
        assert_eq!(
            session.tool_history.front().unwrap().status,
            ToolStatus::Completed
        );
        // The result payload is not a prompt
        assert!(session.last_prompt.is_none());
    }

    #[test]
    fn test_result_record_completes_session_and_open_tool() {
        let mut store = store();
        apply_record(
            &mut store,
            "sess-1",
            false,
            &parse(&create_assistant_tool_use(
                "sess-1",
                "Bash",
                r#"{"command":"make"}"#,
            )),
            fallback(),
        );
        apply_record(
            &mut store,
            "sess-1",
            false,
            &parse(&create_result("sess-1")),
            fallback(),
        );

        let session = store.get("sess-1").unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.current_tool.is_none());
        assert_eq!(session.tool_history.len(), 1);
        assert_eq!(
            session.tool_history.front().unwrap().status,
            ToolStatus::Completed
        );
    }

    #[test]
    fn test_queue_dequeue_keeps_session_alive() {
        let mut store = store();
        let json = r#"{"type":"queue-operation","operation":"dequeue","sessionId":"sess-1","timestamp":"2026-02-10T10:00:00Z"}"#;

        apply_record(&mut store, "file-id", false, &parse(json), fallback());

        assert!(store.contains("sess-1"));
    }

    #[test]
    fn test_queue_enqueue_is_ignored() {
        let mut store = store();
        let json = r#"{"type":"queue-operation","operation":"enqueue","sessionId":"sess-1"}"#;

        apply_record(&mut store, "file-id", false, &parse(json), fallback());

        assert!(store.is_empty());
    }

    #[test]
    fn test_bare_record_resolves_by_file_id() {
        let mut store = store();
        let json = r#"{"type":"user","message":{"role":"user","content":"hello"}}"#;

        apply_record(&mut store, "sess-9", false, &parse(json), fallback());

        let session = store.get("sess-9").unwrap();
        assert_eq!(session.last_prompt.as_deref(), Some("hello"));
        // No timestamp on the record, so the fallback stamps it
        assert_eq!(session.last_activity, fallback());
    }

    #[test]
    fn test_record_timestamp_sets_activity() {
        let mut store = store();
        let entry = parse(&create_user("sess-1", "hi"));

        apply_record(&mut store, "sess-1", false, &entry, fallback());

        let session = store.get("sess-1").unwrap();
        assert_eq!(
            session.last_activity,
            "2026-02-10T10:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_sub_agent_file_records_link_to_parent() {
        let mut store = store();
        // Records in an agent file carry the parent's session id only
        let json = r#"{"type":"user","sessionId":"parent-1","message":{"role":"user","content":"dig into the parser"}}"#;

        apply_record(&mut store, "agent-7", true, &parse(json), fallback());
        // Second sighting must not duplicate the linkage
        apply_record(&mut store, "agent-7", true, &parse(json), fallback());

        let agent = store.get("agent-7").unwrap();
        assert!(agent.is_sub_agent);
        assert_eq!(agent.parent_session_id.as_deref(), Some("parent-1"));

        let parent = store.get("parent-1").unwrap();
        assert_eq!(parent.sub_agents.len(), 1);
        assert!(parent.sub_agents.contains("agent-7"));
    }

    #[test]
    fn test_divergent_agent_id_creates_sub_agent() {
        let mut store = store();
        let json = r#"{"type":"assistant","sessionId":"parent-1","agentId":"agent-x","message":{"role":"assistant","content":[{"type":"text","text":"scanning"}]}}"#;

        apply_record(&mut store, "parent-1", false, &parse(json), fallback());

        let agent = store.get("agent-x").unwrap();
        assert!(agent.is_sub_agent);
        assert_eq!(agent.parent_session_id.as_deref(), Some("parent-1"));
        assert_eq!(agent.messages.len(), 1);
        // The parent carries no content from the agent's records
        let parent = store.get("parent-1").unwrap();
        assert!(parent.messages.is_empty());
    }

    #[test]
    fn test_tool_detail_extraction() {
        let cases = [
            ("Bash", json!({"command": "cargo test"}), Some("cargo test")),
            ("Read", json!({"file_path": "/a/b.rs"}), Some("/a/b.rs")),
            ("Edit", json!({"file_path": "/a/b.rs"}), Some("/a/b.rs")),
            ("Grep", json!({"pattern": "fn main"}), Some("fn main")),
            ("Glob", json!({"pattern": "**/*.rs"}), Some("**/*.rs")),
            ("WebFetch", json!({"url": "https://example.com"}), Some("https://example.com")),
            ("WebSearch", json!({"query": "rust notify"}), Some("rust notify")),
            ("Task", json!({"subagent_type": "explorer"}), Some("explorer")),
            ("Task", json!({"description": "scan tree"}), Some("scan tree")),
            ("Mystery", json!({"description": "odd"}), Some("odd")),
            ("Mystery", json!({"other": 1}), None),
            ("Bash", json!({}), None),
        ];
        for (name, input, expected) in cases {
            assert_eq!(tool_detail(name, &input).as_deref(), expected, "{name}");
        }

        let todos = json!({"todos": [{"content": "a"}, {"content": "b"}]});
        assert_eq!(tool_detail("TodoWrite", &todos).as_deref(), Some("2 todos"));
    }

    #[test]
    fn test_history_record_sets_prompt_and_keeps_alive() {
        let mut store = store();
        let entry = HistoryEntry {
            display: Some("refactor the config loader".to_string()),
            timestamp: Some(HistoryTimestamp::Millis(1_770_000_000_000)),
            project: Some("/home/dev/app".to_string()),
            session_id: Some("sess-1".to_string()),
        };

        apply_history(&mut store, &entry);

        let session = store.get("sess-1").unwrap();
        assert_eq!(
            session.last_prompt.as_deref(),
            Some("refactor the config loader")
        );
        assert_eq!(
            session.last_activity,
            DateTime::from_timestamp_millis(1_770_000_000_000).unwrap()
        );
    }

    #[test]
    fn test_history_record_without_session_id_is_dropped() {
        let mut store = store();
        let entry = HistoryEntry {
            display: Some("orphan prompt".to_string()),
            timestamp: None,
            project: None,
            session_id: None,
        };

        apply_history(&mut store, &entry);

        assert!(store.is_empty());
    }

    #[test]
    fn test_transcript_survives_malformed_lines() {
        let mut store = store();
        let content = format!(
            "{}\nnot json at all\n{}\n",
            create_user("sess-1", "first"),
            create_assistant_text("sess-1", "claude-sonnet-4-20250514", "second")
        );

        apply_transcript(&mut store, "sess-1", false, &content, fallback());

        let session = store.get("sess-1").unwrap();
        assert_eq!(session.messages.len(), 2);
    }

    #[test]
    fn test_replay_into_fresh_stores_is_deterministic() {
        let content = format!(
            "{}\n{}\n{}\n{}\n",
            create_user("sess-1", "run the suite"),
            create_assistant_tool_use("sess-1", "Bash", r#"{"command":"cargo test"}"#),
            create_tool_result("sess-1", false),
            create_result("sess-1")
        );

        let mut first = store();
        apply_transcript(&mut first, "sess-1", false, &content, fallback());
        let mut second = store();
        apply_transcript(&mut second, "sess-1", false, &content, fallback());

        assert_eq!(first.get("sess-1"), second.get("sess-1"));
    }
}
