//! Desired State - what the manifest declares for one resource
//!
//! Both specs are decoded from the block body with unknown fields rejected,
//! so a typo in a manifest surfaces as a decode diagnostic instead of being
//! silently ignored.

use serde::Deserialize;

use crate::RunnerError;

/// Declared attributes of a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationSpec {
    pub name: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub members: Vec<String>,
}

impl ConversationSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn private(mut self) -> Self {
        self.is_private = true;
        self
    }

    pub fn with_members(mut self, members: &[&str]) -> Self {
        self.members = members.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Members with duplicates removed, first occurrence wins.
    pub fn unique_members(&self) -> Vec<String> {
        unique_entries(&self.members)
    }

    /// Rejects member ids that cannot travel in a comma separated list.
    pub fn validate(&self) -> Result<(), RunnerError> {
        validate_entries("members", &self.members)
    }
}

fn default_enabled() -> bool {
    true
}

/// Declared attributes of a user group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserGroupSpec {
    pub name: String,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl UserGroupSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: Vec::new(),
            users: Vec::new(),
            description: None,
            handle: None,
            team_id: None,
            enabled: true,
        }
    }

    pub fn with_users(mut self, users: &[&str]) -> Self {
        self.users = users.iter().map(|u| u.to_string()).collect();
        self
    }

    pub fn with_channels(mut self, channels: &[&str]) -> Self {
        self.channels = channels.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn unique_users(&self) -> Vec<String> {
        unique_entries(&self.users)
    }

    pub fn validate(&self) -> Result<(), RunnerError> {
        validate_entries("users", &self.users)?;
        validate_entries("channels", &self.channels)
    }
}

/// Deduplicates while keeping declaration order.
pub fn unique_entries(entries: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    entries
        .iter()
        .filter(|entry| seen.insert(entry.as_str()))
        .cloned()
        .collect()
}

fn validate_entries(field: &'static str, entries: &[String]) -> Result<(), RunnerError> {
    for entry in entries {
        let reason = if entry.is_empty() {
            Some("entry is empty")
        } else if entry.contains(',') {
            Some("entry contains a comma")
        } else if entry.chars().any(char::is_whitespace) {
            Some("entry contains whitespace")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(RunnerError::InvalidMember {
                field,
                entry: entry.clone(),
                reason,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conversation_defaults() {
        let spec: ConversationSpec = serde_json::from_value(json!({ "name": "eng" })).unwrap();
        assert_eq!(spec, ConversationSpec::new("eng"));
        assert!(!spec.is_private);
        assert!(spec.members.is_empty());
        assert_eq!(spec.topic, None);
    }

    #[test]
    fn test_usergroup_enabled_by_default() {
        let spec: UserGroupSpec = serde_json::from_value(json!({ "name": "oncall" })).unwrap();
        assert!(spec.enabled);
        assert!(spec.users.is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ConversationSpec, _> =
            serde_json::from_value(json!({ "name": "eng", "member": ["U1"] }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unique_members_keeps_first_occurrence() {
        let spec = ConversationSpec::new("eng").with_members(&["U2", "U1", "U2", "U3", "U1"]);
        assert_eq!(spec.unique_members(), vec!["U2", "U1", "U3"]);
    }

    #[test]
    fn test_validate_rejects_comma_entry() {
        let spec = ConversationSpec::new("eng").with_members(&["U1", "U2,U3"]);
        match spec.validate() {
            Err(RunnerError::InvalidMember { field, entry, .. }) => {
                assert_eq!(field, "members");
                assert_eq!(entry, "U2,U3");
            }
            other => panic!("expected invalid member, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_empty_and_whitespace() {
        assert!(ConversationSpec::new("eng").with_members(&[""]).validate().is_err());
        assert!(UserGroupSpec::new("g").with_users(&["U1 "]).validate().is_err());
        assert!(UserGroupSpec::new("g").with_channels(&["C 1"]).validate().is_err());
        assert!(UserGroupSpec::new("g").with_users(&["U1", "U2"]).validate().is_ok());
    }
}
