use async_trait::async_trait;

mod error;
pub mod http;
pub mod types;

pub use error::ApiError;
pub use http::HttpSlackClient;
pub use types::{
    CloseOutcome, Conversation, ConversationKind, ListUserGroups, NewConversation, NewUserGroup,
    TextValue, User, UserGroup, UserGroupPatch, UserGroupPrefs, UserProfile,
};

// ============================================================================
// SlackApi Trait - one method per remote action
// ============================================================================

/// Remote operations against the collaboration platform.
///
/// Every method performs exactly one remote action. Calls are independent:
/// there is no batching, no transaction and no retry behind this trait.
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn lookup_user_by_email(&self, email: &str) -> Result<User, ApiError>;

    // User groups
    async fn create_user_group(&self, group: &NewUserGroup) -> Result<UserGroup, ApiError>;

    async fn list_user_groups(&self, options: ListUserGroups) -> Result<Vec<UserGroup>, ApiError>;

    async fn update_user_group(
        &self,
        group_id: &str,
        patch: &UserGroupPatch,
    ) -> Result<UserGroup, ApiError>;

    /// Replaces the full member list; `users` is comma separated.
    async fn set_user_group_members(
        &self,
        group_id: &str,
        users: &str,
    ) -> Result<UserGroup, ApiError>;

    async fn enable_user_group(&self, group_id: &str) -> Result<UserGroup, ApiError>;

    async fn disable_user_group(&self, group_id: &str) -> Result<UserGroup, ApiError>;

    // Conversations
    async fn conversation_info(&self, channel_id: &str) -> Result<Conversation, ApiError>;

    /// All member ids, following pagination to the end.
    async fn conversation_members(&self, channel_id: &str) -> Result<Vec<String>, ApiError>;

    async fn create_conversation(&self, params: &NewConversation)
        -> Result<Conversation, ApiError>;

    async fn set_conversation_topic(
        &self,
        channel_id: &str,
        topic: &str,
    ) -> Result<Conversation, ApiError>;

    async fn set_conversation_purpose(
        &self,
        channel_id: &str,
        purpose: &str,
    ) -> Result<Conversation, ApiError>;

    /// Invites every user in the comma separated `users` list.
    async fn invite_to_conversation(
        &self,
        channel_id: &str,
        users: &str,
    ) -> Result<Conversation, ApiError>;

    async fn kick_from_conversation(&self, channel_id: &str, user: &str) -> Result<(), ApiError>;

    async fn archive_conversation(&self, channel_id: &str) -> Result<(), ApiError>;

    async fn close_conversation(&self, channel_id: &str) -> Result<CloseOutcome, ApiError>;
}
