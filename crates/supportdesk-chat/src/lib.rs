//! Client-side chat core for supportdesk.
//!
//! - [`store`]: the durable key-value seam (`MemoryStore`, `FileStore`)
//! - [`session`]: the persistent session identifier
//! - [`conversation`]: per-session message log stored as full snapshots
//! - [`panel`]: the single-flight submission flow tying them to a [`SupportBackend`](supportdesk_api::SupportBackend)

pub mod conversation;
pub mod notify;
pub mod panel;
pub mod session;
pub mod store;

pub use conversation::ConversationStore;
pub use notify::{LogNotifier, Notification, NotificationLevel, Notifier, RecordingNotifier};
pub use panel::{ChatPanel, IgnoreReason, PanelOptions, PanelState, SubmitOutcome};
pub use session::SessionIdentity;
pub use store::{FileStore, KeyValueStore, MemoryStore};
