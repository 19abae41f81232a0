//! Controller Module - lifecycle operations per resource type
//!
//! - **context**: cancellation-aware wrapper around every remote call
//! - **membership**: capability traits and the step executor
//! - **conversation** / **usergroup**: the two managed resource kinds

mod context;
mod conversation;
mod membership;
mod usergroup;

pub use context::OpContext;
pub use conversation::ConversationController;
pub use membership::{apply_delta, IncrementalMembership, ReplaceableMembership};
pub use usergroup::{find_user_group, UserGroupController};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::RunnerError;

/// Lifecycle operations for one resource type.
///
/// Every operation runs its remote calls strictly in sequence and stops at
/// the first failure; there is no rollback of calls that already succeeded.
#[async_trait]
pub trait ResourceController: Send + Sync {
    type Desired: DeserializeOwned + Send + Sync;
    type Observed: Serialize + DeserializeOwned + Clone + Send + Sync;

    /// Type name as it appears in manifests and state.
    fn type_name(&self) -> &'static str;

    /// True when `observed` already reflects `desired`.
    fn matches(&self, desired: &Self::Desired, observed: &Self::Observed) -> bool;

    async fn create(
        &self,
        ctx: &OpContext,
        desired: &Self::Desired,
    ) -> Result<Self::Observed, RunnerError>;

    async fn read(
        &self,
        ctx: &OpContext,
        prior: &Self::Observed,
    ) -> Result<Self::Observed, RunnerError>;

    async fn update(
        &self,
        ctx: &OpContext,
        plan: &Self::Desired,
        prior: &Self::Observed,
    ) -> Result<Self::Observed, RunnerError>;

    async fn delete(&self, ctx: &OpContext, prior: &Self::Observed) -> Result<(), RunnerError>;

    async fn import(&self, ctx: &OpContext, id: &str) -> Result<Self::Observed, RunnerError>;
}
