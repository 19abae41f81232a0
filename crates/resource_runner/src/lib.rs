//! Lifecycle controllers for Slack conversations and user groups.
//!
//! The crate follows an operator layout: declared attributes are decoded
//! into typed desired state, a pure reconciler computes membership deltas,
//! and controllers issue the resulting remote calls one at a time through
//! a [`controller::OpContext`] that observes cancellation.
//!
//! Controllers never log. Failures travel back as [`RunnerError`] values and
//! are rendered into [`diagnostics::Diagnostics`] at the lifecycle boundary;
//! the [`apply`] host functions report progress through `tracing`.

use slackctl_api::ApiError;
use thiserror::Error;

pub mod apply;
pub mod binding;
pub mod controller;
pub mod datasource;
pub mod diagnostics;
pub mod reconcile;
pub mod registry;
pub mod state;

pub use binding::{Binding, ManagedResource, PlannedChange};
pub use controller::{ConversationController, OpContext, ResourceController, UserGroupController};
pub use datasource::DataSource;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use reconcile::{reconcile, MembershipDelta, MembershipStep};
pub use registry::LifecycleRegistry;

#[derive(Debug, Error)]
pub enum RunnerError {
    /// A remote call was made and failed.
    #[error("{action}: {source}")]
    Remote {
        action: String,
        #[source]
        source: ApiError,
    },

    #[error("{summary}")]
    NotFound { summary: String, detail: String },

    #[error("Operation cancelled before remote call ({action})")]
    Cancelled { action: String },

    #[error("Invalid entry {entry:?} in {field}: {reason}")]
    InvalidMember {
        field: &'static str,
        entry: String,
        reason: &'static str,
    },

    #[error("Failed to decode {type_name}: {message}")]
    Decode { type_name: String, message: String },

    #[error("Unknown {kind} type '{type_name}'")]
    UnknownType {
        kind: &'static str,
        type_name: String,
    },
}

impl RunnerError {
    pub fn not_found(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::NotFound {
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    /// Turns a remote failure whose code means "no such entity" into
    /// [`RunnerError::NotFound`]; everything else is returned unchanged.
    pub fn or_not_found(self, summary: impl Into<String>) -> Self {
        match self {
            Self::Remote { source, .. } if source.is_not_found() => Self::NotFound {
                summary: summary.into(),
                detail: source.to_string(),
            },
            other => other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The underlying remote error, if a call was actually made.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Remote { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ============================================================================
// Test Utilities - in-memory Slack for controller tests
// ============================================================================

/// In-memory stand-in for the remote API, shared by unit and integration tests.
pub mod test_utils {
    use async_trait::async_trait;
    use slackctl_api::{
        ApiError, CloseOutcome, Conversation, ConversationKind, ListUserGroups, NewConversation,
        NewUserGroup, SlackApi, User, UserGroup, UserGroupPatch, UserProfile,
    };
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    /// One recorded remote call with its arguments.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ApiCall {
        LookupUserByEmail(String),
        CreateUserGroup(NewUserGroup),
        ListUserGroups(ListUserGroups),
        UpdateUserGroup(String, UserGroupPatch),
        SetUserGroupMembers(String, String),
        EnableUserGroup(String),
        DisableUserGroup(String),
        ConversationInfo(String),
        ConversationMembers(String),
        CreateConversation(NewConversation),
        SetTopic(String, String),
        SetPurpose(String, String),
        Invite(String, String),
        Kick(String, String),
        Archive(String),
        Close(String),
    }

    impl ApiCall {
        /// Remote method name, used for failure injection.
        pub fn method(&self) -> &'static str {
            match self {
                Self::LookupUserByEmail(_) => "users.lookupByEmail",
                Self::CreateUserGroup(_) => "usergroups.create",
                Self::ListUserGroups(_) => "usergroups.list",
                Self::UpdateUserGroup(..) => "usergroups.update",
                Self::SetUserGroupMembers(..) => "usergroups.users.update",
                Self::EnableUserGroup(_) => "usergroups.enable",
                Self::DisableUserGroup(_) => "usergroups.disable",
                Self::ConversationInfo(_) => "conversations.info",
                Self::ConversationMembers(_) => "conversations.members",
                Self::CreateConversation(_) => "conversations.create",
                Self::SetTopic(..) => "conversations.setTopic",
                Self::SetPurpose(..) => "conversations.setPurpose",
                Self::Invite(..) => "conversations.invite",
                Self::Kick(..) => "conversations.kick",
                Self::Archive(_) => "conversations.archive",
                Self::Close(_) => "conversations.close",
            }
        }
    }

    pub fn conversation(id: &str, name: &str) -> Conversation {
        Conversation::channel(id, name)
    }

    pub fn direct_message(id: &str, user: &str) -> Conversation {
        Conversation {
            kind: ConversationKind::DirectMessage {
                user: user.to_string(),
            },
            ..Conversation::channel(id, "")
        }
    }

    pub fn group_direct_message(id: &str) -> Conversation {
        Conversation {
            kind: ConversationKind::GroupDirectMessage,
            ..Conversation::channel(id, "")
        }
    }

    pub fn user_group(id: &str, name: &str, users: &[&str]) -> UserGroup {
        UserGroup {
            id: id.to_string(),
            team_id: "T1".to_string(),
            is_usergroup: true,
            name: name.to_string(),
            handle: name.to_lowercase(),
            user_count: users.len() as u64,
            users: users.iter().map(|u| u.to_string()).collect(),
            ..UserGroup::default()
        }
    }

    pub fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            team_id: "T1".to_string(),
            name: id.to_lowercase(),
            profile: UserProfile {
                email: email.to_string(),
            },
            ..User::default()
        }
    }

    /// Mock Slack backend: keeps conversations, members, user groups and
    /// users in memory and records every call in order.
    #[derive(Default)]
    pub struct MockSlack {
        conversations: Mutex<BTreeMap<String, Conversation>>,
        members: Mutex<BTreeMap<String, Vec<String>>>,
        closed: Mutex<BTreeSet<String>>,
        user_groups: Mutex<Vec<UserGroup>>,
        users: Mutex<Vec<User>>,
        failures: Mutex<BTreeMap<&'static str, ApiError>>,
        cancel_on: Mutex<Option<(&'static str, CancellationToken)>>,
        calls: Mutex<Vec<ApiCall>>,
        next_id: Mutex<u32>,
    }

    impl MockSlack {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_conversation(&self, conversation: Conversation) {
            self.conversations
                .lock()
                .unwrap()
                .insert(conversation.id.clone(), conversation);
        }

        pub fn set_members(&self, conversation_id: &str, members: &[&str]) {
            self.members.lock().unwrap().insert(
                conversation_id.to_string(),
                members.iter().map(|m| m.to_string()).collect(),
            );
        }

        pub fn add_user_group(&self, group: UserGroup) {
            self.user_groups.lock().unwrap().push(group);
        }

        pub fn add_user(&self, user: User) {
            self.users.lock().unwrap().push(user);
        }

        /// Every call to `method` fails with `error` from now on.
        pub fn fail_on(&self, method: &'static str, error: ApiError) {
            self.failures.lock().unwrap().insert(method, error);
        }

        /// Cancels `token` when `method` is called; the call itself succeeds.
        pub fn cancel_on(&self, method: &'static str, token: CancellationToken) {
            *self.cancel_on.lock().unwrap() = Some((method, token));
        }

        pub fn calls(&self) -> Vec<ApiCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn calls_to(&self, method: &str) -> Vec<ApiCall> {
            self.calls()
                .into_iter()
                .filter(|call| call.method() == method)
                .collect()
        }

        pub fn clear_calls(&self) {
            self.calls.lock().unwrap().clear();
        }

        pub fn members_of(&self, conversation_id: &str) -> Vec<String> {
            self.members
                .lock()
                .unwrap()
                .get(conversation_id)
                .cloned()
                .unwrap_or_default()
        }

        pub fn conversation_by_id(&self, conversation_id: &str) -> Option<Conversation> {
            self.conversations
                .lock()
                .unwrap()
                .get(conversation_id)
                .cloned()
        }

        pub fn user_group_by_id(&self, group_id: &str) -> Option<UserGroup> {
            self.user_groups
                .lock()
                .unwrap()
                .iter()
                .find(|g| g.id == group_id)
                .cloned()
        }

        fn record(&self, call: ApiCall) -> Result<(), ApiError> {
            let method = call.method();
            self.calls.lock().unwrap().push(call);

            if let Some((cancel_method, token)) = self.cancel_on.lock().unwrap().as_ref() {
                if *cancel_method == method {
                    token.cancel();
                }
            }

            match self.failures.lock().unwrap().get(method) {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        }

        fn next_id(&self, prefix: &str) -> String {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("{}{:04}", prefix, *next)
        }

        fn with_conversation<T>(
            &self,
            method: &'static str,
            id: &str,
            f: impl FnOnce(&mut Conversation) -> T,
        ) -> Result<T, ApiError> {
            let mut conversations = self.conversations.lock().unwrap();
            match conversations.get_mut(id) {
                Some(conversation) => Ok(f(conversation)),
                None => Err(ApiError::platform(method, "channel_not_found")),
            }
        }

        fn with_user_group(
            &self,
            method: &'static str,
            id: &str,
            f: impl FnOnce(&mut UserGroup),
        ) -> Result<UserGroup, ApiError> {
            let mut groups = self.user_groups.lock().unwrap();
            match groups.iter_mut().find(|g| g.id == id) {
                Some(group) => {
                    f(group);
                    Ok(group.clone())
                }
                None => Err(ApiError::platform(method, "no_such_subteam")),
            }
        }
    }

    fn split_users(users: &str) -> Vec<String> {
        users
            .split(',')
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[async_trait]
    impl SlackApi for MockSlack {
        async fn lookup_user_by_email(&self, email: &str) -> Result<User, ApiError> {
            self.record(ApiCall::LookupUserByEmail(email.to_string()))?;
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.profile.email == email)
                .cloned()
                .ok_or_else(|| ApiError::platform("users.lookupByEmail", "users_not_found"))
        }

        async fn create_user_group(&self, group: &NewUserGroup) -> Result<UserGroup, ApiError> {
            self.record(ApiCall::CreateUserGroup(group.clone()))?;
            let created = UserGroup {
                id: self.next_id("S"),
                team_id: if group.team_id.is_empty() {
                    "T1".to_string()
                } else {
                    group.team_id.clone()
                },
                is_usergroup: true,
                name: group.name.clone(),
                description: group.description.clone(),
                handle: group.handle.clone(),
                prefs: slackctl_api::UserGroupPrefs {
                    channels: group.channels.clone(),
                    groups: Vec::new(),
                },
                ..UserGroup::default()
            };
            self.user_groups.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn list_user_groups(
            &self,
            options: ListUserGroups,
        ) -> Result<Vec<UserGroup>, ApiError> {
            self.record(ApiCall::ListUserGroups(options))?;
            Ok(self
                .user_groups
                .lock()
                .unwrap()
                .iter()
                .filter(|g| options.include_disabled || g.is_enabled())
                .map(|g| {
                    let mut g = g.clone();
                    if !options.include_users {
                        g.users.clear();
                    }
                    g
                })
                .collect())
        }

        async fn update_user_group(
            &self,
            group_id: &str,
            patch: &UserGroupPatch,
        ) -> Result<UserGroup, ApiError> {
            self.record(ApiCall::UpdateUserGroup(group_id.to_string(), patch.clone()))?;
            self.with_user_group("usergroups.update", group_id, |g| {
                g.name = patch.name.clone();
                g.handle = patch.handle.clone();
                g.prefs.channels = patch.channels.clone();
                if let Some(description) = &patch.description {
                    g.description = description.clone();
                }
            })
        }

        async fn set_user_group_members(
            &self,
            group_id: &str,
            users: &str,
        ) -> Result<UserGroup, ApiError> {
            self.record(ApiCall::SetUserGroupMembers(
                group_id.to_string(),
                users.to_string(),
            ))?;
            let users = split_users(users);
            self.with_user_group("usergroups.users.update", group_id, |g| {
                g.user_count = users.len() as u64;
                g.users = users;
            })
        }

        async fn enable_user_group(&self, group_id: &str) -> Result<UserGroup, ApiError> {
            self.record(ApiCall::EnableUserGroup(group_id.to_string()))?;
            self.with_user_group("usergroups.enable", group_id, |g| {
                g.date_delete = 0;
                g.deleted_by = None;
            })
        }

        async fn disable_user_group(&self, group_id: &str) -> Result<UserGroup, ApiError> {
            self.record(ApiCall::DisableUserGroup(group_id.to_string()))?;
            self.with_user_group("usergroups.disable", group_id, |g| {
                g.date_delete = 1_700_000_000;
                g.deleted_by = Some("U0".to_string());
            })
        }

        async fn conversation_info(&self, channel_id: &str) -> Result<Conversation, ApiError> {
            self.record(ApiCall::ConversationInfo(channel_id.to_string()))?;
            self.with_conversation("conversations.info", channel_id, |c| c.clone())
        }

        async fn conversation_members(&self, channel_id: &str) -> Result<Vec<String>, ApiError> {
            self.record(ApiCall::ConversationMembers(channel_id.to_string()))?;
            self.with_conversation("conversations.members", channel_id, |_| ())?;
            Ok(self.members_of(channel_id))
        }

        async fn create_conversation(
            &self,
            params: &NewConversation,
        ) -> Result<Conversation, ApiError> {
            self.record(ApiCall::CreateConversation(params.clone()))?;
            let mut conversation = Conversation::channel(self.next_id("C"), params.name.clone());
            conversation.is_private = params.is_private;
            conversation.creator = "U0".to_string();
            self.add_conversation(conversation.clone());
            self.members
                .lock()
                .unwrap()
                .insert(conversation.id.clone(), Vec::new());
            Ok(conversation)
        }

        async fn set_conversation_topic(
            &self,
            channel_id: &str,
            topic: &str,
        ) -> Result<Conversation, ApiError> {
            self.record(ApiCall::SetTopic(channel_id.to_string(), topic.to_string()))?;
            self.with_conversation("conversations.setTopic", channel_id, |c| {
                c.topic.value = topic.to_string();
                c.clone()
            })
        }

        async fn set_conversation_purpose(
            &self,
            channel_id: &str,
            purpose: &str,
        ) -> Result<Conversation, ApiError> {
            self.record(ApiCall::SetPurpose(
                channel_id.to_string(),
                purpose.to_string(),
            ))?;
            self.with_conversation("conversations.setPurpose", channel_id, |c| {
                c.purpose.value = purpose.to_string();
                c.clone()
            })
        }

        async fn invite_to_conversation(
            &self,
            channel_id: &str,
            users: &str,
        ) -> Result<Conversation, ApiError> {
            self.record(ApiCall::Invite(channel_id.to_string(), users.to_string()))?;
            let conversation =
                self.with_conversation("conversations.invite", channel_id, |c| c.clone())?;
            let mut members = self.members.lock().unwrap();
            let current = members.entry(channel_id.to_string()).or_default();
            for user in split_users(users) {
                if !current.contains(&user) {
                    current.push(user);
                }
            }
            Ok(conversation)
        }

        async fn kick_from_conversation(&self, channel_id: &str, user: &str) -> Result<(), ApiError> {
            self.record(ApiCall::Kick(channel_id.to_string(), user.to_string()))?;
            self.with_conversation("conversations.kick", channel_id, |_| ())?;
            let mut members = self.members.lock().unwrap();
            let current = members.entry(channel_id.to_string()).or_default();
            match current.iter().position(|m| m == user) {
                Some(index) => {
                    current.remove(index);
                    Ok(())
                }
                None => Err(ApiError::platform("conversations.kick", "not_in_channel")),
            }
        }

        async fn archive_conversation(&self, channel_id: &str) -> Result<(), ApiError> {
            self.record(ApiCall::Archive(channel_id.to_string()))?;
            let already = self.with_conversation("conversations.archive", channel_id, |c| {
                let already = c.is_archived;
                c.is_archived = true;
                already
            })?;
            if already {
                return Err(ApiError::platform("conversations.archive", "already_archived"));
            }
            Ok(())
        }

        async fn close_conversation(&self, channel_id: &str) -> Result<CloseOutcome, ApiError> {
            self.record(ApiCall::Close(channel_id.to_string()))?;
            self.with_conversation("conversations.close", channel_id, |_| ())?;
            let newly_closed = self.closed.lock().unwrap().insert(channel_id.to_string());
            Ok(CloseOutcome {
                no_op: !newly_closed,
                already_closed: !newly_closed,
            })
        }
    }
}
