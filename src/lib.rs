//! Claude Monitor - live session state reconstructed from Claude Code logs.
//!
//! The watcher tails the JSONL log surfaces under a Claude home directory,
//! the reconciler folds each record into the session store, and the server
//! exposes the resulting state over HTTP and SSE.

pub mod config;
pub mod display;
pub mod server;
pub mod store;
pub mod watcher;
