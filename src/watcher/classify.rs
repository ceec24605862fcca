//! Sub-agent classification.
//!
//! Sub-agent transcripts live under a `subagents/` directory or carry an
//! `agent-` filename prefix, and their records may name an agent id that
//! differs from the owning session. Both signals feed [`classify`], which
//! decides which session a record belongs to.

use std::path::Path;

/// Filename prefix marking a sub-agent transcript.
pub const AGENT_FILE_PREFIX: &str = "agent-";

/// Directory name holding sub-agent transcripts of a session.
pub const SUBAGENT_DIR: &str = "subagents";

/// Whether a transcript path marks a sub-agent file.
#[must_use]
pub fn is_sub_agent_path(path: &Path) -> bool {
    let in_subagent_dir = path
        .components()
        .any(|c| c.as_os_str() == SUBAGENT_DIR);
    let has_agent_stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.starts_with(AGENT_FILE_PREFIX));
    in_subagent_dir || has_agent_stem
}

/// Which session a parsed record belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOwner {
    /// A top-level session.
    Session {
        /// Session id the record applies to.
        id: String,
    },
    /// A sub-agent spawned by a parent session.
    SubAgent {
        /// The sub-agent's own id, used as its session key.
        agent_id: String,
        /// Id of the session that spawned it.
        parent_id: String,
    },
}

impl RecordOwner {
    /// Session key the record's state lands under.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Session { id } => id,
            Self::SubAgent { agent_id, .. } => agent_id,
        }
    }
}

/// Decide which session a record belongs to.
///
/// A record is attributed to a sub-agent when its ids diverge or when its
/// file lives at a sub-agent path. Everything else belongs to the session
/// named by `session_id`. When ids are equal but the path says sub-agent,
/// the agent is its own parent; the store tolerates the self-link.
#[must_use]
pub fn classify(session_id: &str, agent_id: Option<&str>, sub_agent_path: bool) -> RecordOwner {
    match agent_id {
        Some(agent_id) if sub_agent_path || agent_id != session_id => RecordOwner::SubAgent {
            agent_id: agent_id.to_string(),
            parent_id: session_id.to_string(),
        },
        _ => RecordOwner::Session {
            id: session_id.to_string(),
        },
    }
}
