//! Observed State - what was last confirmed remotely
//!
//! Observed records are what gets persisted between runs. Their `id` is the
//! remote identifier and is never derived from the desired name.

use serde::{Deserialize, Serialize};
use slackctl_api::{Conversation, UserGroup};
use std::collections::BTreeSet;

use super::desired::{ConversationSpec, UserGroupSpec};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedConversation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub is_archived: bool,
}

impl ObservedConversation {
    pub fn from_remote(conversation: Conversation, members: Vec<String>) -> Self {
        Self {
            id: conversation.id,
            name: conversation.name,
            topic: conversation.topic.value,
            purpose: conversation.purpose.value,
            is_private: conversation.is_private,
            members,
            creator: conversation.creator,
            is_archived: conversation.is_archived,
        }
    }

    /// Declared values carried over onto a known remote id.
    pub fn from_plan(id: impl Into<String>, plan: &ConversationSpec) -> Self {
        Self {
            id: id.into(),
            name: plan.name.clone(),
            topic: plan.topic.clone().unwrap_or_default(),
            purpose: plan.purpose.clone().unwrap_or_default(),
            is_private: plan.is_private,
            members: plan.unique_members(),
            creator: String::new(),
            is_archived: false,
        }
    }

    /// Whether applying `desired` would change anything.
    pub fn satisfies(&self, desired: &ConversationSpec) -> bool {
        self.name == desired.name
            && self.topic == desired.topic.clone().unwrap_or_default()
            && self.purpose == desired.purpose.clone().unwrap_or_default()
            && self.is_private == desired.is_private
            && as_set(&self.members) == as_set(&desired.members)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedUserGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub user_count: u64,
}

impl ObservedUserGroup {
    pub fn from_remote(group: UserGroup, enabled: bool) -> Self {
        Self {
            id: group.id,
            name: group.name,
            channels: group.prefs.channels,
            users: group.users,
            description: group.description,
            handle: group.handle,
            team_id: group.team_id,
            enabled,
            user_count: group.user_count,
        }
    }

    /// Attributes left unset in `desired` are whatever the remote chose and
    /// never count as drift. A group that is disabled and declared disabled
    /// is frozen: nothing else is compared.
    pub fn satisfies(&self, desired: &UserGroupSpec) -> bool {
        if !desired.enabled && !self.enabled {
            return true;
        }

        let optional_matches =
            |want: &Option<String>, have: &str| want.as_deref().map_or(true, |w| w == have);

        self.name == desired.name
            && self.enabled == desired.enabled
            && as_set(&self.channels) == as_set(&desired.channels)
            && as_set(&self.users) == as_set(&desired.users)
            && optional_matches(&desired.description, &self.description)
            && optional_matches(&desired.handle, &self.handle)
            && optional_matches(&desired.team_id, &self.team_id)
    }
}

fn as_set(entries: &[String]) -> BTreeSet<&str> {
    entries.iter().map(String::as_str).collect()
}
