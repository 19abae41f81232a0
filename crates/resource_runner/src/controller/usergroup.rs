use std::sync::Arc;

use async_trait::async_trait;
use slackctl_api::{ListUserGroups, NewUserGroup, SlackApi, UserGroup, UserGroupPatch};

use super::membership::ReplaceableMembership;
use super::{OpContext, ResourceController};
use crate::state::{ObservedUserGroup, UserGroupSpec};
use crate::RunnerError;

pub const USERGROUP_TYPE: &str = "slack_usergroup";

/// Looks a group up by id in the full listing, disabled groups included.
pub async fn find_user_group(
    api: &dyn SlackApi,
    ctx: &OpContext,
    id: &str,
) -> Result<UserGroup, RunnerError> {
    let groups = ctx
        .call(
            "failed to list user groups",
            api.list_user_groups(ListUserGroups::full()),
        )
        .await?;

    groups.into_iter().find(|group| group.id == id).ok_or_else(|| {
        RunnerError::not_found(
            format!("the usergroup that has the id {} does not exist", id),
            format!("no user group with id {} in the workspace listing", id),
        )
    })
}

/// Manages user groups. Membership is always replaced as a whole, and a
/// disabled group is left untouched apart from the disable call itself.
pub struct UserGroupController {
    api: Arc<dyn SlackApi>,
}

impl UserGroupController {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ReplaceableMembership for UserGroupController {
    type Snapshot = UserGroup;

    async fn set_all(
        &self,
        ctx: &OpContext,
        target: &str,
        members: &[String],
    ) -> Result<UserGroup, RunnerError> {
        let users = members.join(",");
        ctx.call(
            "failed to set users of user group",
            self.api.set_user_group_members(target, &users),
        )
        .await
    }
}

#[async_trait]
impl ResourceController for UserGroupController {
    type Desired = UserGroupSpec;
    type Observed = ObservedUserGroup;

    fn type_name(&self) -> &'static str {
        USERGROUP_TYPE
    }

    fn matches(&self, desired: &UserGroupSpec, observed: &ObservedUserGroup) -> bool {
        observed.satisfies(desired)
    }

    async fn create(
        &self,
        ctx: &OpContext,
        desired: &UserGroupSpec,
    ) -> Result<ObservedUserGroup, RunnerError> {
        desired.validate()?;

        let params = NewUserGroup {
            name: desired.name.clone(),
            channels: desired.channels.clone(),
            description: desired.description.clone().unwrap_or_default(),
            handle: desired.handle.clone().unwrap_or_default(),
            team_id: desired.team_id.clone().unwrap_or_default(),
        };
        let group = ctx
            .call(
                "failed to create user group",
                self.api.create_user_group(&params),
            )
            .await?;

        if !desired.enabled {
            let disabled = ctx
                .call(
                    "failed to disable user group",
                    self.api.disable_user_group(&group.id),
                )
                .await?;
            return Ok(ObservedUserGroup::from_remote(disabled, false));
        }

        // Runs even for an empty list so the remote matches the manifest.
        let group = self.set_all(ctx, &group.id, &desired.unique_users()).await?;
        Ok(ObservedUserGroup::from_remote(group, true))
    }

    async fn read(
        &self,
        _ctx: &OpContext,
        prior: &ObservedUserGroup,
    ) -> Result<ObservedUserGroup, RunnerError> {
        Ok(prior.clone())
    }

    /// Enables or disables first. Disabling short-circuits: the group keeps
    /// its previous attributes and members.
    async fn update(
        &self,
        ctx: &OpContext,
        plan: &UserGroupSpec,
        prior: &ObservedUserGroup,
    ) -> Result<ObservedUserGroup, RunnerError> {
        plan.validate()?;
        let id = prior.id.as_str();

        if !plan.enabled {
            ctx.call(
                "failed to disable user group",
                self.api.disable_user_group(id),
            )
            .await?;
            return Ok(ObservedUserGroup {
                enabled: false,
                ..prior.clone()
            });
        }

        ctx.call("failed to enable user group", self.api.enable_user_group(id))
            .await?;

        let patch = UserGroupPatch {
            name: plan.name.clone(),
            handle: plan.handle.clone().unwrap_or_default(),
            channels: plan.channels.clone(),
            description: plan.description.clone(),
        };
        ctx.call(
            "failed to update user group",
            self.api.update_user_group(id, &patch),
        )
        .await?;

        let group = self.set_all(ctx, id, &plan.unique_users()).await?;
        Ok(ObservedUserGroup::from_remote(group, true))
    }

    /// Groups cannot be removed remotely; deleting disables.
    async fn delete(&self, ctx: &OpContext, prior: &ObservedUserGroup) -> Result<(), RunnerError> {
        ctx.call(
            "failed to delete user group",
            self.api.disable_user_group(&prior.id),
        )
        .await?;
        Ok(())
    }

    async fn import(&self, ctx: &OpContext, id: &str) -> Result<ObservedUserGroup, RunnerError> {
        let group = find_user_group(self.api.as_ref(), ctx, id).await?;
        let enabled = group.is_enabled();
        Ok(ObservedUserGroup::from_remote(group, enabled))
    }
}
