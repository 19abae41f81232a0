//! Web API client over HTTP.
//!
//! Every method is a form-encoded POST authenticated with the bot token. The
//! remote answers with an `{"ok": bool, "error": code}` envelope; `ok: false`
//! becomes [`ApiError::Platform`] carrying the code.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::types::RawConversation;
use crate::{
    ApiError, CloseOutcome, Conversation, ListUserGroups, NewConversation, NewUserGroup, SlackApi,
    User, UserGroup, UserGroupPatch,
};

pub const DEFAULT_BASE_URL: &str = "https://slack.com/api";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size for `conversations.members`.
const MEMBERS_PAGE_LIMIT: u32 = 200;

pub struct HttpSlackClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl HttpSlackClient {
    pub fn new(token: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Client against a different endpoint (tests, proxies).
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Http(e.to_string()))?;

        Ok(Self {
            http,
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        form: &[(&str, String)],
    ) -> Result<T, ApiError> {
        debug!(method, "calling web api");

        let response = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .bearer_auth(&self.token)
            .form(form)
            .send()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;

        let envelope: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
                method,
                message: e.to_string(),
            })?;

        let ok = envelope.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
        if !ok {
            let code = envelope
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown_error");
            debug!(method, code, "web api call failed");
            return Err(ApiError::platform(method, code));
        }

        trace!(method, "web api call succeeded");
        serde_json::from_value(envelope).map_err(|e| ApiError::Decode {
            method,
            message: e.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct UserResponse {
    user: User,
}

#[derive(Deserialize)]
struct UserGroupResponse {
    usergroup: UserGroup,
}

#[derive(Deserialize)]
struct UserGroupsResponse {
    #[serde(default)]
    usergroups: Vec<UserGroup>,
}

#[derive(Deserialize)]
struct ChannelResponse {
    channel: RawConversation,
}

#[derive(Deserialize)]
struct MembersPage {
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Deserialize)]
struct Empty {}

fn flag(value: bool) -> String {
    value.to_string()
}

#[async_trait]
impl SlackApi for HttpSlackClient {
    async fn lookup_user_by_email(&self, email: &str) -> Result<User, ApiError> {
        let response: UserResponse = self
            .call("users.lookupByEmail", &[("email", email.to_string())])
            .await?;
        Ok(response.user)
    }

    async fn create_user_group(&self, group: &NewUserGroup) -> Result<UserGroup, ApiError> {
        let mut form = vec![("name", group.name.clone())];
        if !group.channels.is_empty() {
            form.push(("channels", group.channels.join(",")));
        }
        if !group.description.is_empty() {
            form.push(("description", group.description.clone()));
        }
        if !group.handle.is_empty() {
            form.push(("handle", group.handle.clone()));
        }
        if !group.team_id.is_empty() {
            form.push(("team_id", group.team_id.clone()));
        }

        let response: UserGroupResponse = self.call("usergroups.create", &form).await?;
        Ok(response.usergroup)
    }

    async fn list_user_groups(&self, options: ListUserGroups) -> Result<Vec<UserGroup>, ApiError> {
        let response: UserGroupsResponse = self
            .call(
                "usergroups.list",
                &[
                    ("include_users", flag(options.include_users)),
                    ("include_count", flag(options.include_count)),
                    ("include_disabled", flag(options.include_disabled)),
                ],
            )
            .await?;
        Ok(response.usergroups)
    }

    async fn update_user_group(
        &self,
        group_id: &str,
        patch: &UserGroupPatch,
    ) -> Result<UserGroup, ApiError> {
        let mut form = vec![
            ("usergroup", group_id.to_string()),
            ("name", patch.name.clone()),
            ("channels", patch.channels.join(",")),
        ];
        if !patch.handle.is_empty() {
            form.push(("handle", patch.handle.clone()));
        }
        if let Some(description) = &patch.description {
            form.push(("description", description.clone()));
        }

        let response: UserGroupResponse = self.call("usergroups.update", &form).await?;
        Ok(response.usergroup)
    }

    async fn set_user_group_members(
        &self,
        group_id: &str,
        users: &str,
    ) -> Result<UserGroup, ApiError> {
        let response: UserGroupResponse = self
            .call(
                "usergroups.users.update",
                &[("usergroup", group_id.to_string()), ("users", users.to_string())],
            )
            .await?;
        Ok(response.usergroup)
    }

    async fn enable_user_group(&self, group_id: &str) -> Result<UserGroup, ApiError> {
        let response: UserGroupResponse = self
            .call("usergroups.enable", &[("usergroup", group_id.to_string())])
            .await?;
        Ok(response.usergroup)
    }

    async fn disable_user_group(&self, group_id: &str) -> Result<UserGroup, ApiError> {
        let response: UserGroupResponse = self
            .call("usergroups.disable", &[("usergroup", group_id.to_string())])
            .await?;
        Ok(response.usergroup)
    }

    async fn conversation_info(&self, channel_id: &str) -> Result<Conversation, ApiError> {
        let response: ChannelResponse = self
            .call("conversations.info", &[("channel", channel_id.to_string())])
            .await?;
        Ok(response.channel.into())
    }

    async fn conversation_members(&self, channel_id: &str) -> Result<Vec<String>, ApiError> {
        let mut members = Vec::new();
        let mut cursor = String::new();

        loop {
            let mut form = vec![
                ("channel", channel_id.to_string()),
                ("limit", MEMBERS_PAGE_LIMIT.to_string()),
            ];
            if !cursor.is_empty() {
                form.push(("cursor", cursor.clone()));
            }

            let page: MembersPage = self.call("conversations.members", &form).await?;
            members.extend(page.members);

            cursor = page
                .response_metadata
                .map(|m| m.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                return Ok(members);
            }
        }
    }

    async fn create_conversation(
        &self,
        params: &NewConversation,
    ) -> Result<Conversation, ApiError> {
        let response: ChannelResponse = self
            .call(
                "conversations.create",
                &[
                    ("name", params.name.clone()),
                    ("is_private", flag(params.is_private)),
                ],
            )
            .await?;
        Ok(response.channel.into())
    }

    async fn set_conversation_topic(
        &self,
        channel_id: &str,
        topic: &str,
    ) -> Result<Conversation, ApiError> {
        let response: ChannelResponse = self
            .call(
                "conversations.setTopic",
                &[("channel", channel_id.to_string()), ("topic", topic.to_string())],
            )
            .await?;
        Ok(response.channel.into())
    }

    async fn set_conversation_purpose(
        &self,
        channel_id: &str,
        purpose: &str,
    ) -> Result<Conversation, ApiError> {
        let response: ChannelResponse = self
            .call(
                "conversations.setPurpose",
                &[("channel", channel_id.to_string()), ("purpose", purpose.to_string())],
            )
            .await?;
        Ok(response.channel.into())
    }

    async fn invite_to_conversation(
        &self,
        channel_id: &str,
        users: &str,
    ) -> Result<Conversation, ApiError> {
        let response: ChannelResponse = self
            .call(
                "conversations.invite",
                &[("channel", channel_id.to_string()), ("users", users.to_string())],
            )
            .await?;
        Ok(response.channel.into())
    }

    async fn kick_from_conversation(&self, channel_id: &str, user: &str) -> Result<(), ApiError> {
        let _: Empty = self
            .call(
                "conversations.kick",
                &[("channel", channel_id.to_string()), ("user", user.to_string())],
            )
            .await?;
        Ok(())
    }

    async fn archive_conversation(&self, channel_id: &str) -> Result<(), ApiError> {
        let _: Empty = self
            .call("conversations.archive", &[("channel", channel_id.to_string())])
            .await?;
        Ok(())
    }

    async fn close_conversation(&self, channel_id: &str) -> Result<CloseOutcome, ApiError> {
        self.call("conversations.close", &[("channel", channel_id.to_string())])
            .await
    }
}
