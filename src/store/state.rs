//! Authoritative in-memory table of session entities.
//!
//! The store owns every [`Session`] and is the only place session state is
//! mutated. Mutators are plain synchronous methods; callers serialize access
//! through a [`SharedStore`] handle, so the store itself needs no internal
//! locking. Every mutation that changes observable state emits one
//! [`SessionEvent`] through the registered [`ChangeNotifier`] subscribers.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::events::{ChangeNotifier, SessionEvent, SubscriberError};
use super::pricing::{short_model_name, PricingTable};
use super::session::{MessageEntry, MessageRole, Session, SessionStatus, TodoItem, TokenDelta, ToolExecution, ToolStatus};

/// Default cap for completed tool executions kept per session.
pub const DEFAULT_TOOL_HISTORY_LIMIT: usize = 10;
/// Default cap for retained messages per session.
pub const DEFAULT_MESSAGE_LIMIT: usize = 50;
/// Default truncation length for stored message and prompt text, in chars.
pub const DEFAULT_MESSAGE_TRUNCATE_CHARS: usize = 200;
/// Default inactivity before an active session is marked idle.
pub const DEFAULT_IDLE_THRESHOLD_SECS: i64 = 30;
/// Default inactivity before a session is removed entirely.
pub const DEFAULT_REMOVAL_TIMEOUT_SECS: i64 = 300;

/// Store handle shared between the engine (writer) and the transport
/// (readers).
pub type SharedStore = Arc<RwLock<SessionStore>>;

/// Tunable limits and pricing for the store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Cap for `tool_history` entries.
    pub max_tool_history: usize,
    /// Cap for `messages` entries.
    pub max_messages: usize,
    /// Truncation length for message and prompt text, in chars.
    pub max_message_chars: usize,
    /// Inactivity after which an active session without an open tool idles.
    pub idle_threshold: Duration,
    /// Inactivity after which a session is removed.
    pub removal_timeout: Duration,
    /// Rate table for cost estimation.
    pub pricing: PricingTable,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_tool_history: DEFAULT_TOOL_HISTORY_LIMIT,
            max_messages: DEFAULT_MESSAGE_LIMIT,
            max_message_chars: DEFAULT_MESSAGE_TRUNCATE_CHARS,
            idle_threshold: Duration::seconds(DEFAULT_IDLE_THRESHOLD_SECS),
            removal_timeout: Duration::seconds(DEFAULT_REMOVAL_TIMEOUT_SECS),
            pricing: PricingTable::default(),
        }
    }
}

/// In-memory session table plus the change fan-out.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
    notifier: ChangeNotifier,
    config: StoreConfig,
}

impl SessionStore {
    /// Create an empty store with the given limits.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            notifier: ChangeNotifier::new(),
            config,
        }
    }

    /// Wrap a store into the shared handle used across tasks.
    #[must_use]
    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    /// Register a change subscriber; delivery follows registration order.
    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: Fn(&SessionEvent) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        self.notifier.subscribe(subscriber);
    }

    /// Limits currently in effect.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Mutation primitives
    // ------------------------------------------------------------------

    /// Create the session if absent, stamped with `seen_at`.
    ///
    /// `seen_at` is the record timestamp (or file modification time during
    /// backfill), so loading old files does not mark sessions freshly
    /// active. Returns `true` when a session was created.
    pub fn get_or_create(&mut self, id: &str, seen_at: DateTime<Utc>) -> bool {
        if self.sessions.contains_key(id) {
            return false;
        }
        let session = Session::new(
            id,
            seen_at,
            self.config.max_tool_history,
            self.config.max_messages,
        );
        self.sessions.insert(id.to_string(), session);
        tracing::debug!(session = id, "Session created");
        self.notify(id, |session| SessionEvent::Created { session });
        true
    }

    /// Advance `lastActivity` without emitting an event.
    ///
    /// Timestamp-only bookkeeping; the new value rides along with the next
    /// emitted snapshot.
    pub fn touch(&mut self, id: &str, at: DateTime<Utc>) {
        if let Some(session) = self.sessions.get_mut(id) {
            session.touch(at);
        }
    }

    /// Ensure the session exists and counts as alive at `at`.
    ///
    /// Revives an idle session back to active; completed sessions are left
    /// alone.
    pub fn keep_alive(&mut self, id: &str, at: DateTime<Utc>) {
        if self.get_or_create(id, at) {
            return;
        }
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        session.touch(at);
        if session.status == SessionStatus::Idle {
            session.status = SessionStatus::Active;
            self.notify(id, |session| SessionEvent::Updated { session });
        }
    }

    /// Set the model id, first writer wins. Also derives `modelShort`.
    pub fn set_model(&mut self, id: &str, model: &str, at: DateTime<Utc>) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        session.touch(at);
        if session.model.is_some() {
            return;
        }
        session.model = Some(model.to_string());
        session.model_short = Some(short_model_name(model));
        self.notify(id, |session| SessionEvent::Updated { session });
    }

    /// Set the working directory, first writer wins.
    pub fn set_cwd(&mut self, id: &str, cwd: &str, at: DateTime<Utc>) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        session.touch(at);
        if session.cwd.is_some() {
            return;
        }
        session.cwd = Some(cwd.to_string());
        self.notify(id, |session| SessionEvent::Updated { session });
    }

    /// Set the git branch, first writer wins.
    pub fn set_git_branch(&mut self, id: &str, branch: &str, at: DateTime<Utc>) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        session.touch(at);
        if session.git_branch.is_some() {
            return;
        }
        session.git_branch = Some(branch.to_string());
        self.notify(id, |session| SessionEvent::Updated { session });
    }

    /// Set the client version, first writer wins.
    pub fn set_version(&mut self, id: &str, version: &str, at: DateTime<Utc>) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        session.touch(at);
        if session.version.is_some() {
            return;
        }
        session.version = Some(version.to_string());
        self.notify(id, |session| SessionEvent::Updated { session });
    }

    /// Add one turn's token counts and recompute the cost estimate.
    pub fn add_tokens(&mut self, id: &str, delta: TokenDelta, at: DateTime<Utc>) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        session.touch(at);
        if delta.is_empty() {
            return;
        }
        session.tokens.apply(delta);
        session.estimated_cost = self
            .config
            .pricing
            .estimate_cost(session.model.as_deref(), &session.tokens);
        revive(session);
        self.notify(id, |session| SessionEvent::Updated { session });
    }

    /// Replace the prompt summary with truncated `text`.
    pub fn set_prompt(&mut self, id: &str, text: &str, at: DateTime<Utc>) {
        let truncated = truncate_text(text.trim(), self.config.max_message_chars);
        if truncated.is_empty() {
            return;
        }
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        session.touch(at);
        session.last_prompt = Some(truncated);
        revive(session);
        self.notify(id, |session| SessionEvent::Updated { session });
    }

    /// Replace the task-list snapshot wholesale.
    pub fn set_todos(&mut self, id: &str, todos: Vec<TodoItem>, at: DateTime<Utc>) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        session.touch(at);
        if session.todos == todos {
            return;
        }
        session.todos = todos;
        self.notify(id, |session| SessionEvent::Updated { session });
    }

    /// Append a truncated message, suppressing consecutive duplicates.
    pub fn append_message(&mut self, id: &str, role: MessageRole, content: &str, at: DateTime<Utc>) {
        let truncated = truncate_text(content.trim(), self.config.max_message_chars);
        if truncated.is_empty() {
            return;
        }
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        session.touch(at);
        if let Some(last) = session.messages.back() {
            if last.role == role && last.content == truncated {
                return;
            }
        }
        session.messages.append(MessageEntry {
            role,
            content: truncated,
            timestamp: at,
        });
        revive(session);
        self.notify(id, |session| SessionEvent::Updated { session });
    }

    /// Open a tool execution, implicitly completing any previous one.
    pub fn start_tool(&mut self, id: &str, name: &str, detail: Option<String>, at: DateTime<Utc>) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        session.touch(at);
        // A missed result record must not wedge the session.
        let implicit_close = session.close_current_tool(ToolStatus::Completed, at);
        session.current_tool = Some(ToolExecution::started(name, detail, at));
        revive(session);
        if implicit_close {
            self.notify(id, |session| SessionEvent::ToolCompleted { session });
        }
        self.notify(id, |session| SessionEvent::ToolStarted { session });
    }

    /// Close the open tool execution as completed or failed.
    ///
    /// Ignored when the session is unknown or no tool is open.
    pub fn complete_tool(&mut self, id: &str, failed: bool, at: DateTime<Utc>) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        session.touch(at);
        let status = if failed {
            ToolStatus::Failed
        } else {
            ToolStatus::Completed
        };
        if session.close_current_tool(status, at) {
            self.notify(id, |session| SessionEvent::ToolCompleted { session });
        }
    }

    /// Transition the session to completed, closing any open tool first.
    pub fn complete_session(&mut self, id: &str, at: DateTime<Utc>) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        session.touch(at);
        let closed_tool = session.close_current_tool(ToolStatus::Completed, at);
        let transitioned = session.status != SessionStatus::Completed;
        if transitioned {
            session.status = SessionStatus::Completed;
        }
        if closed_tool {
            self.notify(id, |session| SessionEvent::ToolCompleted { session });
        }
        if transitioned {
            self.notify(id, |session| SessionEvent::Completed { session });
        }
    }

    /// Create a sub-agent session and link it under its parent, idempotently.
    ///
    /// The parent is created lazily when it has not been seen yet.
    pub fn ensure_sub_agent(&mut self, parent_id: &str, agent_id: &str, at: DateTime<Utc>) {
        self.get_or_create(parent_id, at);

        if self.sessions.contains_key(agent_id) {
            if let Some(agent) = self.sessions.get_mut(agent_id) {
                agent.touch(at);
            }
        } else {
            let mut agent = Session::new(
                agent_id,
                at,
                self.config.max_tool_history,
                self.config.max_messages,
            );
            agent.is_sub_agent = true;
            agent.parent_session_id = Some(parent_id.to_string());
            agent.agent_id = Some(agent_id.to_string());
            self.sessions.insert(agent_id.to_string(), agent);
            tracing::debug!(agent = agent_id, parent = parent_id, "Sub-agent session created");
            self.notify(agent_id, |session| SessionEvent::Created { session });
        }

        let linked = match self.sessions.get_mut(parent_id) {
            Some(parent) => parent.sub_agents.insert(agent_id.to_string()),
            None => false,
        };
        if linked {
            self.notify(parent_id, |session| SessionEvent::Updated { session });
        }
    }

    /// Idle or remove sessions based on inactivity.
    ///
    /// Sessions inactive past the removal timeout are deleted with a removal
    /// event. Active sessions without an open tool that reach the idle
    /// threshold transition to idle. No other code path deletes or idles a
    /// session.
    pub fn sweep(&mut self, now: DateTime<Utc>) {
        let mut expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.inactivity(now) > self.config.removal_timeout)
            .map(|(id, _)| id.clone())
            .collect();
        expired.sort();
        for id in expired {
            self.sessions.remove(&id);
            tracing::info!(session = %id, "Removed stale session");
            self.notifier.emit(&SessionEvent::Removed { id });
        }

        let mut idled: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, session)| {
                session.status == SessionStatus::Active
                    && session.current_tool.is_none()
                    && session.inactivity(now) >= self.config.idle_threshold
            })
            .map(|(id, _)| id.clone())
            .collect();
        idled.sort();
        for id in idled {
            if let Some(session) = self.sessions.get_mut(&id) {
                session.status = SessionStatus::Idle;
            }
            self.notify(&id, |session| SessionEvent::Updated { session });
        }
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    /// All sessions, most recently active first.
    #[must_use]
    pub fn list_all(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        sessions
    }

    /// Active sessions only, most recently active first.
    #[must_use]
    pub fn list_active(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self
            .sessions
            .values()
            .filter(|session| session.status == SessionStatus::Active)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        sessions
    }

    /// Look up a session by its id or its agent id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id).or_else(|| {
            self.sessions
                .values()
                .find(|session| session.agent_id.as_deref() == Some(id))
        })
    }

    /// Whether a session with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Number of tracked sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn notify<F>(&self, id: &str, build: F)
    where
        F: FnOnce(Session) -> SessionEvent,
    {
        if let Some(session) = self.sessions.get(id) {
            self.notifier.emit(&build(session.clone()));
        }
    }
}

/// New substantive activity flips idle, completed or errored sessions back
/// to active.
fn revive(session: &mut Session) {
    if session.status != SessionStatus::Active {
        session.status = SessionStatus::Active;
    }
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            let mut truncated = text[..byte_index].to_string();
            truncated.push('…');
            truncated
        }
        None => text.to_string(),
    }
}
