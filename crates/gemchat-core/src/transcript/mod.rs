//! Transcript data model.
//!
//! The transcript is the ordered list of conversation messages. Order is the
//! only ordering signal; messages carry no load-bearing timestamps.

pub mod attachment;
pub mod history;
pub mod message;

pub use attachment::{Attachment, Fingerprint, PendingAttachmentSet};
pub use history::Transcript;
pub use message::{ContentPart, ConversationMessage, MessageContent, MessageRole};
