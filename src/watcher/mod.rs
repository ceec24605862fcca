//! Watcher module for Claude Code conversation files.
//!
//! Tails JSONL transcripts, classifies each record's owning session and
//! reconciles record content into the session store.

mod classify;
mod discovery;
mod engine;
mod error;
mod jsonl;
mod reconciler;
mod tailer;

pub use classify::{classify, is_sub_agent_path, RecordOwner, AGENT_FILE_PREFIX, SUBAGENT_DIR};
pub use discovery::{extract_agent_id, DiscoveredFile, FileDiscovery, ID_SCAN_LINES};
pub use engine::{
    WatchConfig, WatchEngine, DEFAULT_MAX_FILE_AGE_HOURS, DEFAULT_POLL_INTERVAL,
    DEFAULT_SWEEP_INTERVAL,
};
pub use error::WatcherError;
pub use jsonl::*;
pub use reconciler::{apply_history, apply_record, apply_transcript, is_placeholder, tool_detail};
pub use tailer::JsonlTailer;
