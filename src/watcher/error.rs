//! Watcher error types.

use std::path::PathBuf;

/// Errors that can occur while watching and reading transcript files.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// Failed to stat a watched file.
    #[error("Failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read new content from a watched file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Notify watcher error.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// Invalid file-identifier pattern.
    #[error("Invalid identifier pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_display_includes_path() {
        let err = WatcherError::Stat {
            path: PathBuf::from("/tmp/session.jsonl"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("Failed to stat"));
        assert!(err.to_string().contains("/tmp/session.jsonl"));
    }

    #[test]
    fn test_read_display_includes_path() {
        let err = WatcherError::Read {
            path: PathBuf::from("/tmp/history.jsonl"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("Failed to read"));
        assert!(err.to_string().contains("/tmp/history.jsonl"));
    }

    #[test]
    fn test_from_notify_error() {
        let notify_err = notify::Error::generic("test error");
        let watcher_err: WatcherError = notify_err.into();
        assert!(matches!(watcher_err, WatcherError::Notify(_)));
        assert!(watcher_err.to_string().contains("File watcher error"));
    }
}
