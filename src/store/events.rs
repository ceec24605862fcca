//! Change events emitted by the session store.
//!
//! Every store mutation that changes observable state produces one
//! [`SessionEvent`], fanned out synchronously to registered subscribers in
//! registration order. A failing subscriber is logged and skipped; it never
//! rolls back the mutation or starves later subscribers.

use std::fmt;

use serde::Serialize;

use super::session::Session;

/// A state change, tagged for the transport layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SessionEvent {
    /// A session entity appeared in the store.
    Created {
        /// Snapshot after creation.
        session: Session,
    },
    /// Observable fields of a session changed.
    Updated {
        /// Snapshot after the change.
        session: Session,
    },
    /// A tool execution opened.
    ToolStarted {
        /// Snapshot with `currentTool` set.
        session: Session,
    },
    /// A tool execution closed.
    ToolCompleted {
        /// Snapshot with the execution moved into history.
        session: Session,
    },
    /// The session reached a terminal result.
    Completed {
        /// Snapshot after completion.
        session: Session,
    },
    /// The staleness sweep deleted the session.
    Removed {
        /// Id of the deleted session.
        id: String,
    },
}

impl SessionEvent {
    /// Wire name of the event type.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Updated { .. } => "updated",
            Self::ToolStarted { .. } => "tool-started",
            Self::ToolCompleted { .. } => "tool-completed",
            Self::Completed { .. } => "completed",
            Self::Removed { .. } => "removed",
        }
    }

    /// Id of the affected session.
    #[must_use]
    pub fn session_id(&self) -> &str {
        match self {
            Self::Created { session }
            | Self::Updated { session }
            | Self::ToolStarted { session }
            | Self::ToolCompleted { session }
            | Self::Completed { session } => &session.id,
            Self::Removed { id } => id,
        }
    }
}

/// Error a subscriber may surface; logged, never propagated.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync>;

type Subscriber = Box<dyn Fn(&SessionEvent) -> Result<(), SubscriberError> + Send + Sync>;

/// Ordered synchronous fan-out of session events.
#[derive(Default)]
pub struct ChangeNotifier {
    subscribers: Vec<Subscriber>,
}

impl ChangeNotifier {
    /// Create a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber; delivery follows registration order.
    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: Fn(&SessionEvent) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Deliver one event to every subscriber, isolating failures.
    pub fn emit(&self, event: &SessionEvent) {
        for (index, subscriber) in self.subscribers.iter().enumerate() {
            if let Err(e) = subscriber(event) {
                tracing::warn!(
                    subscriber = index,
                    event = event.kind(),
                    session = event.session_id(),
                    error = %e,
                    "Event subscriber failed"
                );
            }
        }
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
