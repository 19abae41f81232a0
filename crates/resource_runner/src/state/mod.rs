//! State Module - data structures for the operator pattern
//!
//! - **desired**: what the manifest declares
//! - **observed**: what was last confirmed remotely, persisted between runs
//! - **document**: the on-disk state file holding observed records

mod desired;
mod document;
mod observed;

pub use desired::{unique_entries, ConversationSpec, UserGroupSpec};
pub use document::{ResourceRecord, StateDocument, StateError, STATE_FILE, STATE_VERSION};
pub use observed::{ObservedConversation, ObservedUserGroup};
