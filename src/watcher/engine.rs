//! Polling watch engine.
//!
//! Drives the session store from three filesystem surfaces: the recursive
//! project-log tree, the aggregate history file and the todo snapshot
//! directory. Polling keeps change detection correct on virtualized and
//! networked filesystems where inotify silently misses writes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use notify::{EventKind, PollWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::store::SharedStore;

use super::classify::is_sub_agent_path;
use super::discovery::{FileDiscovery, ID_SCAN_LINES};
use super::error::WatcherError;
use super::jsonl::{parse_history_content, parse_todo_snapshot};
use super::reconciler::{apply_history, apply_transcript};
use super::tailer::JsonlTailer;

/// Default notify poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Default interval between staleness sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
/// Default age window for files picked up by discovery.
pub const DEFAULT_MAX_FILE_AGE_HOURS: i64 = 24;

/// Paths and intervals for one engine instance.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Root of the per-project transcript tree.
    pub projects_dir: PathBuf,
    /// The aggregate prompt history file.
    pub history_file: PathBuf,
    /// Directory of per-session todo snapshots.
    pub todos_dir: PathBuf,
    /// Filesystem poll interval.
    pub poll_interval: Duration,
    /// Interval between staleness sweeps.
    pub sweep_interval: Duration,
    /// Files modified longer ago than this are ignored.
    pub max_file_age: chrono::Duration,
    /// Head lines probed per file when deriving session ids.
    pub id_scan_lines: usize,
}

impl WatchConfig {
    /// Standard surface layout under a Claude home directory.
    #[must_use]
    pub fn for_claude_dir(claude_dir: &Path) -> Self {
        Self {
            projects_dir: claude_dir.join("projects"),
            history_file: claude_dir.join("history.jsonl"),
            todos_dir: claude_dir.join("todos"),
            poll_interval: DEFAULT_POLL_INTERVAL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_file_age: chrono::Duration::hours(DEFAULT_MAX_FILE_AGE_HOURS),
            id_scan_lines: ID_SCAN_LINES,
        }
    }
}

/// Which watched surface produced a filesystem event.
#[derive(Debug, Clone, Copy)]
enum Surface {
    Projects,
    History,
    Todos,
}

/// A transcript file with a live tail position.
#[derive(Debug)]
struct TrackedFile {
    tailer: JsonlTailer,
    session_id: String,
    is_sub_agent: bool,
}

/// Tails transcript surfaces and applies their records to the store.
pub struct WatchEngine {
    config: WatchConfig,
    store: SharedStore,
    discovery: FileDiscovery,
    tracked: HashMap<PathBuf, TrackedFile>,
    history_tailer: Option<JsonlTailer>,
    shutdown: CancellationToken,
}

impl WatchEngine {
    /// Create an engine over the given surfaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the discovery id pattern fails to compile.
    pub fn new(
        config: WatchConfig,
        store: SharedStore,
        shutdown: CancellationToken,
    ) -> Result<Self, WatcherError> {
        let discovery = FileDiscovery::new(
            config.projects_dir.clone(),
            config.max_file_age,
            config.id_scan_lines,
        )?;
        Ok(Self {
            config,
            store,
            discovery,
            tracked: HashMap::new(),
            history_tailer: None,
            shutdown,
        })
    }

    /// Run the startup scan: backfill transcripts, load todo snapshots and
    /// position the history tailer at its current end.
    pub async fn bootstrap(&mut self) {
        self.backfill().await;
        self.load_todo_snapshots().await;
        self.prime_history().await;
    }

    /// Bootstrap, then tail all surfaces until the shutdown token fires.
    ///
    /// # Errors
    ///
    /// Returns an error if a filesystem watcher cannot be created for a
    /// surface that exists.
    pub async fn run(mut self) -> Result<(), WatcherError> {
        self.bootstrap().await;

        let (tx, mut rx) = mpsc::channel::<(Surface, notify::Event)>(256);
        let mut watchers = Vec::new();
        for (path, mode, surface) in [
            (
                self.config.projects_dir.clone(),
                RecursiveMode::Recursive,
                Surface::Projects,
            ),
            (
                // The file itself may not exist yet; watch its directory.
                self.config
                    .history_file
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
                RecursiveMode::NonRecursive,
                Surface::History,
            ),
            (
                self.config.todos_dir.clone(),
                RecursiveMode::NonRecursive,
                Surface::Todos,
            ),
        ] {
            if let Some(watcher) =
                watch_surface(&path, mode, surface, self.config.poll_interval, &tx)?
            {
                watchers.push(watcher);
            }
        }
        tracing::info!(surfaces = watchers.len(), "Watch engine running");
        // Keeps rx.recv() pending even when every surface was skipped.
        let _keepalive = tx;

        let start = tokio::time::Instant::now() + self.config.sweep_interval;
        let mut sweep = tokio::time::interval_at(start, self.config.sweep_interval);

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    tracing::info!("Watch engine stopping");
                    return Ok(());
                }
                _ = sweep.tick() => {
                    self.store.write().await.sweep(Utc::now());
                }
                event = rx.recv() => {
                    let Some((surface, event)) = event else {
                        return Ok(());
                    };
                    match surface {
                        Surface::Projects => self.handle_project_event(&event).await,
                        Surface::History => self.handle_history_event(&event).await,
                        Surface::Todos => self.handle_todo_event(&event).await,
                    }
                }
            }
        }
    }

    /// Replay recent transcripts found by the startup scan, oldest first.
    async fn backfill(&mut self) {
        let files = self.discovery.scan();
        for file in files.iter().rev() {
            let mut tailer = JsonlTailer::new(file.path.clone());
            match tailer.read_new_lines().await {
                Ok(content) if !content.is_empty() => {
                    let mut store = self.store.write().await;
                    apply_transcript(
                        &mut store,
                        &file.session_id,
                        file.is_sub_agent,
                        &content,
                        file.modified,
                    );
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(path = %file.path.display(), %error, "Backfill read failed");
                }
            }
            self.tracked.insert(
                file.path.clone(),
                TrackedFile {
                    tailer,
                    session_id: file.session_id.clone(),
                    is_sub_agent: file.is_sub_agent,
                },
            );
        }

        // The most recent transcript is presumed to be the one on screen.
        if let Some(newest) = files.iter().find(|file| file.size > 0) {
            self.store
                .write()
                .await
                .keep_alive(&newest.session_id, Utc::now());
        }
        tracing::info!(files = files.len(), "Backfill complete");
    }

    /// Apply every recent todo snapshot in the todos directory.
    async fn load_todo_snapshots(&self) {
        let entries = match std::fs::read_dir(&self.config.todos_dir) {
            Ok(entries) => entries,
            Err(_) => {
                tracing::debug!(path = %self.config.todos_dir.display(), "No todos directory");
                return;
            }
        };
        for entry in entries.flatten() {
            self.apply_todo_snapshot(&entry.path()).await;
        }
    }

    /// Position the history tailer at the file's end; history is a
    /// live-only surface, its past is never replayed.
    async fn prime_history(&mut self) {
        if !self.config.history_file.is_file() {
            return;
        }
        let mut tailer = JsonlTailer::new(self.config.history_file.clone());
        match tailer.skip_to_end().await {
            Ok(offset) => {
                tracing::debug!(offset, "History primed at end");
                self.history_tailer = Some(tailer);
            }
            Err(error) => {
                tracing::warn!(%error, "Could not prime history file");
            }
        }
    }

    async fn handle_project_event(&mut self, event: &notify::Event) {
        for path in &event.paths {
            if !path.extension().is_some_and(|ext| ext == "jsonl") {
                continue;
            }
            match event.kind {
                EventKind::Create(_) => self.track_new_file(path).await,
                EventKind::Modify(_) => {
                    if self.tracked.contains_key(path) {
                        self.ingest(path).await;
                    } else {
                        self.track_without_replay(path).await;
                    }
                }
                EventKind::Remove(_) => {
                    if self.tracked.remove(path).is_some() {
                        tracing::debug!(path = %path.display(), "Stopped tracking removed file");
                    }
                }
                _ => {}
            }
        }
    }

    async fn handle_history_event(&mut self, event: &notify::Event) {
        if !event.paths.iter().any(|p| p == &self.config.history_file) {
            return;
        }
        if matches!(event.kind, EventKind::Remove(_)) {
            self.history_tailer = None;
            return;
        }
        let tailer = self
            .history_tailer
            .get_or_insert_with(|| JsonlTailer::new(self.config.history_file.clone()));
        match tailer.read_new_lines().await {
            Ok(content) if !content.is_empty() => {
                let entries = parse_history_content(&content);
                let mut store = self.store.write().await;
                for entry in &entries {
                    apply_history(&mut store, entry);
                }
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(%error, "History read failed, retrying next cycle");
            }
        }
    }

    async fn handle_todo_event(&mut self, event: &notify::Event) {
        if matches!(event.kind, EventKind::Remove(_)) {
            return;
        }
        for path in &event.paths {
            self.apply_todo_snapshot(path).await;
        }
    }

    /// A freshly created transcript: tail it from the start if it is
    /// within the age window.
    async fn track_new_file(&mut self, path: &Path) {
        if self.tracked.contains_key(path) {
            return;
        }
        if !self.is_young(path) {
            tracing::debug!(path = %path.display(), "Ignoring stale file");
            return;
        }
        let Some(session_id) = self.discovery.derive_session_id(path) else {
            tracing::debug!(path = %path.display(), "No session id derivable, ignoring");
            return;
        };
        self.tracked.insert(
            path.to_path_buf(),
            TrackedFile {
                tailer: JsonlTailer::new(path.to_path_buf()),
                session_id,
                is_sub_agent: is_sub_agent_path(path),
            },
        );
        self.ingest(path).await;
    }

    /// A modified transcript with no tracked offset was previously too old
    /// to replay; start at its current end so history is never re-applied.
    async fn track_without_replay(&mut self, path: &Path) {
        let Some(session_id) = self.discovery.derive_session_id(path) else {
            return;
        };
        let mut tailer = JsonlTailer::new(path.to_path_buf());
        match tailer.skip_to_end().await {
            Ok(offset) => {
                tracing::debug!(
                    path = %path.display(),
                    offset,
                    "Tracking previously unseen file from its end"
                );
                self.tracked.insert(
                    path.to_path_buf(),
                    TrackedFile {
                        tailer,
                        session_id,
                        is_sub_agent: is_sub_agent_path(path),
                    },
                );
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "Could not position on file");
            }
        }
    }

    /// Read a tracked file's unread tail and apply it.
    async fn ingest(&mut self, path: &Path) {
        let Some(tracked) = self.tracked.get_mut(path) else {
            return;
        };
        match tracked.tailer.read_new_lines().await {
            Ok(content) if !content.is_empty() => {
                let mut store = self.store.write().await;
                apply_transcript(
                    &mut store,
                    &tracked.session_id,
                    tracked.is_sub_agent,
                    &content,
                    Utc::now(),
                );
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "Read failed, retrying next cycle");
            }
        }
    }

    /// Parse one todo snapshot file and replace the session's task list.
    async fn apply_todo_snapshot(&self, path: &Path) {
        let Some(session_id) = self.discovery.todo_session_id(path) else {
            return;
        };
        if !self.is_young(path) {
            return;
        }
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "Todo snapshot unreadable");
                return;
            }
        };
        let Some(todos) = parse_todo_snapshot(&content) else {
            return;
        };
        self.store
            .write()
            .await
            .set_todos(&session_id, todos, Utc::now());
    }

    fn is_young(&self, path: &Path) -> bool {
        let Ok(metadata) = std::fs::metadata(path) else {
            return false;
        };
        let Ok(modified) = metadata.modified() else {
            return false;
        };
        let modified: DateTime<Utc> = modified.into();
        modified >= Utc::now() - self.config.max_file_age
    }
}

/// Start one polling watcher; a missing surface is skipped, not fatal.
fn watch_surface(
    path: &Path,
    mode: RecursiveMode,
    surface: Surface,
    poll_interval: Duration,
    tx: &mpsc::Sender<(Surface, notify::Event)>,
) -> Result<Option<PollWatcher>, WatcherError> {
    if !path.is_dir() {
        tracing::warn!(path = %path.display(), "Watch surface missing, skipping");
        return Ok(None);
    }
    let tx = tx.clone();
    let mut watcher = PollWatcher::new(
        move |result: Result<notify::Event, notify::Error>| match result {
            Ok(event) => {
                let _ = tx.blocking_send((surface, event));
            }
            Err(error) => {
                tracing::warn!(%error, "File watcher error");
            }
        },
        notify::Config::default().with_poll_interval(poll_interval),
    )?;
    watcher.watch(path, mode)?;
    Ok(Some(watcher))
}
