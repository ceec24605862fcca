//! Transcript discovery for the watched surfaces.
//!
//! Scans `~/.claude/projects/` recursively for candidate session files,
//! derives a session id for each and filters out files past the age
//! window so long-dead sessions are not resurrected on startup.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use uuid::Uuid;
use walkdir::WalkDir;

use super::classify::is_sub_agent_path;
use super::error::WatcherError;

/// Default number of head lines scanned when deriving a session id.
pub const ID_SCAN_LINES: usize = 10;

/// Fallback stem pattern for session files without an embedded id field:
/// hex groups joined by dashes, uuid-like but not necessarily canonical.
const ID_STEM_PATTERN: &str = r"^[0-9a-fA-F]{6,}(-[0-9a-fA-F]+)*$";

/// A transcript file retained by the startup scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Path to the `.jsonl` file.
    pub path: PathBuf,
    /// Session id derived from head lines or the filename.
    pub session_id: String,
    /// Last modification time.
    pub modified: DateTime<Utc>,
    /// File size in bytes at scan time.
    pub size: u64,
    /// Whether the path marks a sub-agent transcript.
    pub is_sub_agent: bool,
}

/// Scans the project-log tree for recent transcript files.
#[derive(Debug)]
pub struct FileDiscovery {
    root: PathBuf,
    max_age: Duration,
    id_scan_lines: usize,
    id_pattern: Regex,
}

impl FileDiscovery {
    /// Create a scanner over `root` keeping files modified within
    /// `max_age`, probing up to `id_scan_lines` head lines per file.
    ///
    /// # Errors
    ///
    /// Returns an error if the fallback id pattern fails to compile.
    pub fn new(root: PathBuf, max_age: Duration, id_scan_lines: usize) -> Result<Self, WatcherError> {
        Ok(Self {
            root,
            max_age,
            id_scan_lines,
            id_pattern: Regex::new(ID_STEM_PATTERN)?,
        })
    }

    /// Root directory being scanned.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the tree for recent transcript files, newest first.
    #[must_use]
    pub fn scan(&self) -> Vec<DiscoveredFile> {
        self.scan_older_than(Utc::now() - self.max_age)
    }

    fn scan_older_than(&self, cutoff: DateTime<Utc>) -> Vec<DiscoveredFile> {
        if !self.root.is_dir() {
            tracing::debug!(root = %self.root.display(), "Transcript root missing, nothing to scan");
            return Vec::new();
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "jsonl") {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            let modified: DateTime<Utc> = modified.into();
            if modified < cutoff {
                tracing::debug!(path = %path.display(), "Skipping stale transcript");
                continue;
            }
            let Some(session_id) = self.derive_session_id(path) else {
                tracing::debug!(path = %path.display(), "No session id derivable, skipping");
                continue;
            };
            files.push(DiscoveredFile {
                path: path.to_path_buf(),
                session_id,
                modified,
                size: metadata.len(),
                is_sub_agent: is_sub_agent_path(path),
            });
        }

        files.sort_by(|a, b| b.modified.cmp(&a.modified));
        files
    }

    /// Derive the session id for a transcript file.
    ///
    /// Plain session files are identified by an explicit `sessionId` in
    /// their first lines, falling back to a uuid-like filename stem.
    /// Sub-agent files are identified by their filename first: their head
    /// lines carry the parent's session id, not their own.
    #[must_use]
    pub fn derive_session_id(&self, path: &Path) -> Option<String> {
        if is_sub_agent_path(path) {
            if let Some(id) = self.session_id_from_filename(path) {
                return Some(id);
            }
            return session_id_from_head(path, self.id_scan_lines);
        }
        if let Some(id) = session_id_from_head(path, self.id_scan_lines) {
            return Some(id);
        }
        self.session_id_from_filename(path)
    }

    fn session_id_from_filename(&self, path: &Path) -> Option<String> {
        let filename = path.file_name()?.to_str()?;
        if let Some(agent_id) = extract_agent_id(filename) {
            return Some(agent_id);
        }
        let stem = path.file_stem()?.to_str()?;
        if Uuid::parse_str(stem).is_ok() || self.id_pattern.is_match(stem) {
            return Some(stem.to_string());
        }
        None
    }

    /// Session id encoded in a todo snapshot filename.
    ///
    /// Snapshots are named `<sessionId>.json` or
    /// `<sessionId>-agent-<agentId>.json`; the leading identifier selects
    /// the session.
    #[must_use]
    pub fn todo_session_id(&self, path: &Path) -> Option<String> {
        if !path.extension().is_some_and(|ext| ext == "json") {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let lead = stem.split("-agent-").next()?;
        if Uuid::parse_str(lead).is_ok() || self.id_pattern.is_match(lead) {
            Some(lead.to_string())
        } else {
            None
        }
    }
}

/// Scan the first lines of a transcript for an explicit `sessionId` field.
fn session_id_from_head(path: &Path, lines: usize) -> Option<String> {
    let file = std::fs::File::open(path).ok()?;
    let reader = std::io::BufReader::new(file);
    for line in reader.lines().take(lines) {
        let Ok(line) = line else { break };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&line) else {
            continue;
        };
        if let Some(id) = value.get("sessionId").and_then(|v| v.as_str()) {
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
    }
    None
}

/// Extract agent ID from a subagent filename.
///
/// Subagent files are named `agent-<id>.jsonl`. This function extracts
/// the `<id>` portion.
///
/// # Examples
///
/// ```
/// use claude_monitor::watcher::extract_agent_id;
///
/// assert_eq!(extract_agent_id("agent-abc1234.jsonl"), Some("abc1234".to_string()));
/// assert_eq!(extract_agent_id("session.jsonl"), None);
/// ```
#[must_use]
pub fn extract_agent_id(filename: &str) -> Option<String> {
    let stem = filename.strip_suffix(".jsonl")?;
    let id = stem.strip_prefix("agent-")?;
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}
