//! Incremental JSONL file tailer.
//!
//! Reads new entries from a JSONL file as they are appended.

use std::path::PathBuf;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

use super::error::WatcherError;
use super::jsonl::{parse_jsonl_content, JournalEntry};

/// Incremental JSONL file reader that tracks read position.
///
/// Reads only new lines appended since the last read, making it suitable
/// for watching growing log files. Offsets live only in memory; after a
/// restart the startup scan re-derives them.
#[derive(Debug)]
pub struct JsonlTailer {
    /// Path to the JSONL file.
    path: PathBuf,
    /// Current byte offset in the file.
    offset: u64,
}

impl JsonlTailer {
    /// Create a new tailer for the given path.
    ///
    /// Starts at offset 0 (beginning of file).
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path, offset: 0 }
    }

    /// Create a new tailer starting at a specific offset.
    #[must_use]
    pub fn with_offset(path: PathBuf, offset: u64) -> Self {
        Self { path, offset }
    }

    /// Get the current byte offset.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Get the path being tailed.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read new complete lines since the last read.
    ///
    /// Only whole lines are consumed: a trailing line without its newline
    /// is left unread until the writer finishes it. If the file shrank
    /// since the last read (truncation or rotation), the offset resets to
    /// zero and this cycle reports nothing; the next read starts from the
    /// beginning.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, stat'd or read.
    pub async fn read_new_lines(&mut self) -> Result<String, WatcherError> {
        let file = File::open(&self.path)
            .await
            .map_err(|source| WatcherError::Read {
                path: self.path.clone(),
                source,
            })?;

        let metadata = file.metadata().await.map_err(|source| WatcherError::Stat {
            path: self.path.clone(),
            source,
        })?;
        let file_len = metadata.len();

        // Detect truncation (file is now smaller than our offset)
        if file_len < self.offset {
            tracing::warn!(
                path = %self.path.display(),
                old_offset = self.offset,
                new_len = file_len,
                "File truncated, resetting offset to 0"
            );
            self.offset = 0;
            return Ok(String::new());
        }

        // If file hasn't grown, no new content
        if file_len == self.offset {
            return Ok(String::new());
        }

        let mut file = file;
        file.seek(std::io::SeekFrom::Start(self.offset))
            .await
            .map_err(|source| WatcherError::Read {
                path: self.path.clone(),
                source,
            })?;

        let mut reader = BufReader::new(file);
        let mut content = String::new();
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read =
                reader
                    .read_line(&mut line)
                    .await
                    .map_err(|source| WatcherError::Read {
                        path: self.path.clone(),
                        source,
                    })?;

            if bytes_read == 0 {
                // EOF reached
                break;
            }

            if !line.ends_with('\n') {
                // Partial tail still being written; re-read it next cycle
                break;
            }

            self.offset += bytes_read as u64;
            content.push_str(&line);
        }

        Ok(content)
    }

    /// Read new entries since the last read.
    ///
    /// Returns entries parsed from new complete lines. Malformed lines are
    /// skipped with a warning logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, stat'd or read.
    pub async fn read_new_entries(&mut self) -> Result<Vec<JournalEntry>, WatcherError> {
        let content = self.read_new_lines().await?;
        Ok(parse_jsonl_content(&content))
    }

    /// Mark everything currently in the file as consumed.
    ///
    /// Used for files that surface without a tracked offset: their
    /// historical content must never be replayed, only genuinely new
    /// lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be stat'd.
    pub async fn skip_to_end(&mut self) -> Result<u64, WatcherError> {
        let metadata =
            tokio::fs::metadata(&self.path)
                .await
                .map_err(|source| WatcherError::Stat {
                    path: self.path.clone(),
                    source,
                })?;
        self.offset = metadata.len();
        Ok(self.offset)
    }

    /// Reset the offset to the beginning of the file.
    pub fn reset(&mut self) {
        self.offset = 0;
    }
}
