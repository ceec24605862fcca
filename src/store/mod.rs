//! Session state: the data model, the bounded history buffers, pricing,
//! change events and the store that ties them together.

pub mod events;
pub mod history;
pub mod pricing;
pub mod session;
pub mod state;

pub use events::{ChangeNotifier, SessionEvent, SubscriberError};
pub use history::BoundedLog;
pub use pricing::{short_model_name, ModelRates, PricingTable, PricingTier};
pub use session::{
    MessageEntry, MessageRole, Session, SessionStatus, TodoItem, TodoStatus, TokenDelta,
    TokenUsage, ToolExecution, ToolStatus,
};
pub use state::{
    SessionStore, SharedStore, StoreConfig, DEFAULT_IDLE_THRESHOLD_SECS, DEFAULT_MESSAGE_LIMIT,
    DEFAULT_MESSAGE_TRUNCATE_CHARS, DEFAULT_REMOVAL_TIMEOUT_SECS, DEFAULT_TOOL_HISTORY_LIMIT,
};
