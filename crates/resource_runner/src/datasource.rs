//! Read-only lookups: a conversation by id, a user by email, a user group by id.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use slackctl_api::{SlackApi, TextValue, UserGroupPrefs};

use crate::binding::{decode, encode};
use crate::controller::{find_user_group, OpContext};
use crate::diagnostics::Diagnostics;
use crate::RunnerError;

pub const CONVERSATION_DATA: &str = "slack_conversation";
pub const USER_DATA: &str = "slack_user";
pub const USERGROUP_DATA: &str = "slack_usergroup";

#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    /// Resolves the query in `config` to a full attribute document.
    async fn read(&self, ctx: &OpContext, config: &Value) -> Result<Value, Diagnostics>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ByIdQuery {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ByEmailQuery {
    email: String,
}

// ============================================================================
// Conversation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationData {
    pub id: String,
    pub name: String,
    pub creator: String,
    pub is_archived: bool,
    pub is_private: bool,
    /// Direct-message partner, empty for channels
    pub user: String,
    pub topic: TextValue,
    pub purpose: TextValue,
    pub members: Vec<String>,
    pub connected_team_ids: Vec<String>,
    pub shared_team_ids: Vec<String>,
    pub internal_team_ids: Vec<String>,
}

pub struct ConversationDataSource {
    api: Arc<dyn SlackApi>,
}

impl ConversationDataSource {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }

    pub async fn lookup(&self, ctx: &OpContext, id: &str) -> Result<ConversationData, RunnerError> {
        let conversation = ctx
            .call("failed to get conversation", self.api.conversation_info(id))
            .await
            .map_err(|e| e.or_not_found(format!("the conversation with the id {} does not exist", id)))?;

        let members = ctx
            .call(
                format!("failed to get users in conversation with the id {}", id),
                self.api.conversation_members(id),
            )
            .await?;

        let user = conversation.user().unwrap_or_default().to_string();
        Ok(ConversationData {
            id: conversation.id,
            name: conversation.name,
            creator: conversation.creator,
            is_archived: conversation.is_archived,
            is_private: conversation.is_private,
            user,
            topic: conversation.topic,
            purpose: conversation.purpose,
            members,
            connected_team_ids: conversation.connected_team_ids,
            shared_team_ids: conversation.shared_team_ids,
            internal_team_ids: conversation.internal_team_ids,
        })
    }
}

#[async_trait]
impl DataSource for ConversationDataSource {
    fn type_name(&self) -> &'static str {
        CONVERSATION_DATA
    }

    async fn read(&self, ctx: &OpContext, config: &Value) -> Result<Value, Diagnostics> {
        let query: ByIdQuery = decode(CONVERSATION_DATA, config)?;
        let data = self.lookup(ctx, &query.id).await?;
        Ok(encode(CONVERSATION_DATA, &data)?)
    }
}

// ============================================================================
// User
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub id: String,
    pub email: String,
    pub team_id: String,
    pub name: String,
    pub real_name: String,
    pub deleted: bool,
    pub is_bot: bool,
    pub is_admin: bool,
    pub is_owner: bool,
    pub is_primary_owner: bool,
    pub is_restricted: bool,
    pub is_ultra_restricted: bool,
    pub is_stranger: bool,
    pub is_app_user: bool,
    pub is_invited_user: bool,
    pub has_2fa: bool,
    pub two_factor_type: Option<String>,
    pub has_files: bool,
    pub presence: String,
    pub locale: String,
}

pub struct UserDataSource {
    api: Arc<dyn SlackApi>,
}

impl UserDataSource {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }

    pub async fn lookup(&self, ctx: &OpContext, email: &str) -> Result<UserData, RunnerError> {
        let user = ctx
            .call(
                "failed to look up user by email",
                self.api.lookup_user_by_email(email),
            )
            .await
            .map_err(|e| e.or_not_found(format!("the user that has the email {} does not exist", email)))?;

        Ok(UserData {
            id: user.id,
            email: email.to_string(),
            team_id: user.team_id,
            name: user.name,
            real_name: user.real_name,
            deleted: user.deleted,
            is_bot: user.is_bot,
            is_admin: user.is_admin,
            is_owner: user.is_owner,
            is_primary_owner: user.is_primary_owner,
            is_restricted: user.is_restricted,
            is_ultra_restricted: user.is_ultra_restricted,
            is_stranger: user.is_stranger,
            is_app_user: user.is_app_user,
            is_invited_user: user.is_invited_user,
            has_2fa: user.has_2fa,
            two_factor_type: user.two_factor_type,
            has_files: user.has_files,
            presence: user.presence,
            locale: user.locale,
        })
    }
}

#[async_trait]
impl DataSource for UserDataSource {
    fn type_name(&self) -> &'static str {
        USER_DATA
    }

    async fn read(&self, ctx: &OpContext, config: &Value) -> Result<Value, Diagnostics> {
        let query: ByEmailQuery = decode(USER_DATA, config)?;
        let data = self.lookup(ctx, &query.email).await?;
        Ok(encode(USER_DATA, &data)?)
    }
}

// ============================================================================
// User group
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroupData {
    pub id: String,
    pub team_id: String,
    pub is_user_group: bool,
    pub name: String,
    pub description: String,
    pub handle: String,
    pub is_external: bool,
    pub auto_type: String,
    pub created_by: String,
    pub updated_by: String,
    pub deleted_by: String,
    pub enabled: bool,
    pub prefs: UserGroupPrefs,
    pub user_count: u64,
    pub users: Vec<String>,
}

pub struct UserGroupDataSource {
    api: Arc<dyn SlackApi>,
}

impl UserGroupDataSource {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }

    pub async fn lookup(&self, ctx: &OpContext, id: &str) -> Result<UserGroupData, RunnerError> {
        let group = find_user_group(self.api.as_ref(), ctx, id).await?;
        let enabled = group.is_enabled();

        Ok(UserGroupData {
            id: group.id,
            team_id: group.team_id,
            is_user_group: group.is_usergroup,
            name: group.name,
            description: group.description,
            handle: group.handle,
            is_external: group.is_external,
            auto_type: group.auto_type.unwrap_or_default(),
            created_by: group.created_by,
            updated_by: group.updated_by,
            deleted_by: group.deleted_by.unwrap_or_default(),
            enabled,
            prefs: group.prefs,
            user_count: group.user_count,
            users: group.users,
        })
    }
}

#[async_trait]
impl DataSource for UserGroupDataSource {
    fn type_name(&self) -> &'static str {
        USERGROUP_DATA
    }

    async fn read(&self, ctx: &OpContext, config: &Value) -> Result<Value, Diagnostics> {
        let query: ByIdQuery = decode(USERGROUP_DATA, config)?;
        let data = self.lookup(ctx, &query.id).await?;
        Ok(encode(USERGROUP_DATA, &data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{direct_message, user, user_group, MockSlack};
    use serde_json::json;

    #[tokio::test]
    async fn test_conversation_lookup_includes_dm_partner() {
        let mock = Arc::new(MockSlack::new());
        mock.add_conversation(direct_message("D1", "U7"));
        mock.set_members("D1", &["U7", "U0"]);

        let data = ConversationDataSource::new(mock.clone())
            .lookup(&OpContext::new(), "D1")
            .await
            .unwrap();

        assert_eq!(data.user, "U7");
        assert_eq!(data.members, vec!["U7", "U0"]);
    }

    #[tokio::test]
    async fn test_user_lookup_by_email() {
        let mock = Arc::new(MockSlack::new());
        mock.add_user(user("U1", "alice@example.com"));

        let value = UserDataSource::new(mock.clone())
            .read(&OpContext::new(), &json!({ "email": "alice@example.com" }))
            .await
            .unwrap();

        assert_eq!(value["id"], json!("U1"));
        assert_eq!(value["email"], json!("alice@example.com"));
        assert_eq!(value["two_factor_type"], json!(null));
    }

    #[tokio::test]
    async fn test_unknown_email_is_not_found() {
        let mock = Arc::new(MockSlack::new());
        let err = UserDataSource::new(mock.clone())
            .lookup(&OpContext::new(), "nobody@example.com")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "the user that has the email nobody@example.com does not exist"
        );
    }

    #[tokio::test]
    async fn test_usergroup_lookup_scans_listing() {
        let mock = Arc::new(MockSlack::new());
        mock.add_user_group(user_group("S1", "a", &[]));
        mock.add_user_group(user_group("S2", "b", &["U1", "U2"]));

        let data = UserGroupDataSource::new(mock.clone())
            .lookup(&OpContext::new(), "S2")
            .await
            .unwrap();

        assert_eq!(data.name, "b");
        assert_eq!(data.user_count, 2);
        assert!(data.enabled);
    }

    #[tokio::test]
    async fn test_query_with_unknown_field_is_rejected() {
        let mock = Arc::new(MockSlack::new());
        let diagnostics = UserGroupDataSource::new(mock.clone())
            .read(&OpContext::new(), &json!({ "id": "S1", "name": "x" }))
            .await
            .unwrap_err();

        assert!(diagnostics.has_error());
        assert!(mock.calls().is_empty());
    }
}
