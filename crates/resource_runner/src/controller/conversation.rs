use std::sync::Arc;

use async_trait::async_trait;
use slackctl_api::{NewConversation, SlackApi};

use super::membership::{apply_delta, IncrementalMembership};
use super::{OpContext, ResourceController};
use crate::reconcile::reconcile;
use crate::state::{ConversationSpec, ObservedConversation};
use crate::RunnerError;

pub const CONVERSATION_TYPE: &str = "slack_conversation";

/// Manages channels: creation, topic and purpose, incremental membership,
/// and archive or close on delete.
pub struct ConversationController {
    api: Arc<dyn SlackApi>,
}

impl ConversationController {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IncrementalMembership for ConversationController {
    async fn add(
        &self,
        ctx: &OpContext,
        target: &str,
        members: &[String],
    ) -> Result<(), RunnerError> {
        let users = members.join(",");
        ctx.call(
            "failed to invite users to conversation",
            self.api.invite_to_conversation(target, &users),
        )
        .await?;
        Ok(())
    }

    async fn remove(&self, ctx: &OpContext, target: &str, member: &str) -> Result<(), RunnerError> {
        ctx.call(
            format!("failed to kick user {} from conversation", member),
            self.api.kick_from_conversation(target, member),
        )
        .await
    }
}

#[async_trait]
impl ResourceController for ConversationController {
    type Desired = ConversationSpec;
    type Observed = ObservedConversation;

    fn type_name(&self) -> &'static str {
        CONVERSATION_TYPE
    }

    fn matches(&self, desired: &ConversationSpec, observed: &ObservedConversation) -> bool {
        observed.satisfies(desired)
    }

    /// Creates the conversation, then sets topic and purpose when declared,
    /// then invites the declared members in one call.
    ///
    /// Membership is recorded as declared once the invite succeeds; it is
    /// not read back.
    async fn create(
        &self,
        ctx: &OpContext,
        desired: &ConversationSpec,
    ) -> Result<ObservedConversation, RunnerError> {
        desired.validate()?;

        let params = NewConversation {
            name: desired.name.clone(),
            is_private: desired.is_private,
        };
        let mut channel = ctx
            .call(
                "failed to create conversation",
                self.api.create_conversation(&params),
            )
            .await?;

        if let Some(topic) = &desired.topic {
            channel = ctx
                .call(
                    "failed to set topic of conversation",
                    self.api.set_conversation_topic(&channel.id, topic),
                )
                .await?;
        }

        if let Some(purpose) = &desired.purpose {
            channel = ctx
                .call(
                    "failed to set purpose of conversation",
                    self.api.set_conversation_purpose(&channel.id, purpose),
                )
                .await?;
        }

        let members = desired.unique_members();
        if !members.is_empty() {
            self.add(ctx, &channel.id, &members).await?;
        }

        Ok(ObservedConversation::from_remote(channel, members))
    }

    async fn read(
        &self,
        _ctx: &OpContext,
        prior: &ObservedConversation,
    ) -> Result<ObservedConversation, RunnerError> {
        Ok(prior.clone())
    }

    /// Sets topic and purpose unconditionally (empty when undeclared), then
    /// reconciles membership against a fresh member listing.
    async fn update(
        &self,
        ctx: &OpContext,
        plan: &ConversationSpec,
        prior: &ObservedConversation,
    ) -> Result<ObservedConversation, RunnerError> {
        plan.validate()?;
        let id = prior.id.as_str();

        ctx.call(
            "failed to set topic of conversation",
            self.api
                .set_conversation_topic(id, plan.topic.as_deref().unwrap_or_default()),
        )
        .await?;

        ctx.call(
            "failed to set purpose of conversation",
            self.api
                .set_conversation_purpose(id, plan.purpose.as_deref().unwrap_or_default()),
        )
        .await?;

        let current = ctx
            .call(
                "failed to get users in conversation",
                self.api.conversation_members(id),
            )
            .await?;

        let delta = reconcile(&plan.members, &current);
        apply_delta(self, ctx, id, &delta).await?;

        Ok(ObservedConversation {
            creator: prior.creator.clone(),
            is_archived: prior.is_archived,
            ..ObservedConversation::from_plan(id, plan)
        })
    }

    /// Channels are archived; direct messages are closed, and one that is
    /// already closed counts as deleted.
    async fn delete(&self, ctx: &OpContext, prior: &ObservedConversation) -> Result<(), RunnerError> {
        let id = prior.id.as_str();
        let conversation = ctx
            .call("failed to get conversation", self.api.conversation_info(id))
            .await
            .map_err(|e| e.or_not_found(format!("the conversation with the id {} does not exist", id)))?;

        if !conversation.kind.is_direct() {
            return ctx
                .call(
                    "failed to archive conversation",
                    self.api.archive_conversation(id),
                )
                .await;
        }

        match ctx
            .call("failed to close conversation", self.api.close_conversation(id))
            .await
        {
            Ok(_) => Ok(()),
            Err(RunnerError::Remote { source, .. }) if source.is_already_closed() => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn import(&self, ctx: &OpContext, id: &str) -> Result<ObservedConversation, RunnerError> {
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

        Ok(ObservedConversation::from_remote(conversation, members))
    }
}
