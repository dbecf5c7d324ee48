//! Background synchronization: every surface that refreshes on a timer

pub mod connections;
pub mod conversation;
pub mod notifications;
pub mod poller;

pub use connections::{ConnectionsState, ConnectionsSync};
pub use conversation::{Conversation, ConversationSync, TimelineEntry};
pub use notifications::NotificationBadge;
pub use poller::{PollHandle, Poller};
