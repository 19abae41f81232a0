//! Typed records exchanged with the remote API.
//!
//! Conversations arrive as one polymorphic wire object; [`RawConversation`]
//! captures that shape and is mapped exhaustively into [`Conversation`] with
//! an explicit [`ConversationKind`], so nothing downstream probes fields.

use serde::{Deserialize, Serialize};

/// What kind of conversation a remote conversation object describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationKind {
    /// Public or private channel
    Channel,
    /// One-to-one direct message with `user`
    DirectMessage { user: String },
    /// Multi-person direct message
    GroupDirectMessage,
}

impl ConversationKind {
    /// Direct messages are closed on delete, channels are archived.
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::DirectMessage { .. } | Self::GroupDirectMessage)
    }
}

/// Topic or purpose text together with its author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextValue {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub creator: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
    pub name: String,
    pub kind: ConversationKind,
    pub creator: String,
    pub is_private: bool,
    pub is_archived: bool,
    pub topic: TextValue,
    pub purpose: TextValue,
    pub connected_team_ids: Vec<String>,
    pub shared_team_ids: Vec<String>,
    pub internal_team_ids: Vec<String>,
}

impl Conversation {
    /// A plain channel with the given id and name, everything else empty.
    pub fn channel(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: ConversationKind::Channel,
            creator: String::new(),
            is_private: false,
            is_archived: false,
            topic: TextValue::default(),
            purpose: TextValue::default(),
            connected_team_ids: Vec::new(),
            shared_team_ids: Vec::new(),
            internal_team_ids: Vec::new(),
        }
    }

    /// The direct-message partner, if this is a one-to-one conversation.
    pub fn user(&self) -> Option<&str> {
        match &self.kind {
            ConversationKind::DirectMessage { user } => Some(user),
            _ => None,
        }
    }
}

/// Conversation as the remote encodes it.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawConversation {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub is_im: bool,
    #[serde(default)]
    pub is_mpim: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub topic: TextValue,
    #[serde(default)]
    pub purpose: TextValue,
    #[serde(default)]
    pub connected_team_ids: Vec<String>,
    #[serde(default)]
    pub shared_team_ids: Vec<String>,
    #[serde(default)]
    pub internal_team_ids: Vec<String>,
}

impl From<RawConversation> for Conversation {
    fn from(raw: RawConversation) -> Self {
        let kind = match (raw.user.filter(|u| !u.is_empty()), raw.is_im, raw.is_mpim) {
            (Some(user), _, _) => ConversationKind::DirectMessage { user },
            (None, true, _) => ConversationKind::DirectMessage {
                user: String::new(),
            },
            (None, false, true) => ConversationKind::GroupDirectMessage,
            (None, false, false) => ConversationKind::Channel,
        };

        Self {
            id: raw.id,
            name: raw.name,
            kind,
            creator: raw.creator,
            is_private: raw.is_private,
            is_archived: raw.is_archived,
            topic: raw.topic,
            purpose: raw.purpose,
            connected_team_ids: raw.connected_team_ids,
            shared_team_ids: raw.shared_team_ids,
            internal_team_ids: raw.internal_team_ids,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroupPrefs {
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroup {
    pub id: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub is_usergroup: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default)]
    pub auto_type: Option<String>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub updated_by: String,
    #[serde(default)]
    pub deleted_by: Option<String>,
    /// Non-zero once the group has been disabled
    #[serde(default)]
    pub date_delete: i64,
    #[serde(default)]
    pub prefs: UserGroupPrefs,
    #[serde(default)]
    pub user_count: u64,
    #[serde(default)]
    pub users: Vec<String>,
}

impl UserGroup {
    pub fn is_enabled(&self) -> bool {
        self.date_delete == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub real_name: String,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub is_primary_owner: bool,
    #[serde(default)]
    pub is_restricted: bool,
    #[serde(default)]
    pub is_ultra_restricted: bool,
    #[serde(default)]
    pub is_stranger: bool,
    #[serde(default)]
    pub is_app_user: bool,
    #[serde(default)]
    pub is_invited_user: bool,
    #[serde(default)]
    pub has_2fa: bool,
    #[serde(default)]
    pub two_factor_type: Option<String>,
    #[serde(default)]
    pub has_files: bool,
    #[serde(default)]
    pub presence: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub profile: UserProfile,
}

/// Parameters for `conversations.create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConversation {
    pub name: String,
    pub is_private: bool,
}

/// Parameters for `usergroups.create`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUserGroup {
    pub name: String,
    pub channels: Vec<String>,
    pub description: String,
    pub handle: String,
    pub team_id: String,
}

/// Combined attribute update for `usergroups.update`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserGroupPatch {
    pub name: String,
    pub handle: String,
    pub channels: Vec<String>,
    pub description: Option<String>,
}

/// Listing options for `usergroups.list`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListUserGroups {
    pub include_users: bool,
    pub include_count: bool,
    pub include_disabled: bool,
}

impl ListUserGroups {
    /// Everything, disabled groups included.
    pub fn full() -> Self {
        Self {
            include_users: true,
            include_count: true,
            include_disabled: true,
        }
    }
}

/// Result of `conversations.close`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct CloseOutcome {
    #[serde(default)]
    pub no_op: bool,
    #[serde(default)]
    pub already_closed: bool,
}
