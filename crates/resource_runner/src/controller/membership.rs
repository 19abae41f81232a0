//! Membership capabilities.
//!
//! Conversations change membership one step at a time (bulk invite, single
//! kick); user groups only support replacing the whole list. Each controller
//! implements the capability its resource has, and only conversations go
//! through the reconciler.

use async_trait::async_trait;

use super::OpContext;
use crate::reconcile::{MembershipDelta, MembershipStep};
use crate::RunnerError;

#[async_trait]
pub trait IncrementalMembership: Send + Sync {
    /// Adds every entry of `members` in one call.
    async fn add(&self, ctx: &OpContext, target: &str, members: &[String])
        -> Result<(), RunnerError>;

    async fn remove(&self, ctx: &OpContext, target: &str, member: &str) -> Result<(), RunnerError>;
}

#[async_trait]
pub trait ReplaceableMembership: Send + Sync {
    /// What the remote answers after replacing the list.
    type Snapshot: Send;

    async fn set_all(
        &self,
        ctx: &OpContext,
        target: &str,
        members: &[String],
    ) -> Result<Self::Snapshot, RunnerError>;
}

/// Executes the steps of `delta` in order and stops at the first failure.
///
/// Steps that already ran stay applied.
pub async fn apply_delta<M>(
    membership: &M,
    ctx: &OpContext,
    target: &str,
    delta: &MembershipDelta,
) -> Result<(), RunnerError>
where
    M: IncrementalMembership + ?Sized,
{
    for step in delta.steps() {
        match step {
            MembershipStep::Invite { members } => membership.add(ctx, target, &members).await?,
            MembershipStep::Kick { member } => membership.remove(ctx, target, &member).await?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl IncrementalMembership for Recorder {
        async fn add(
            &self,
            _ctx: &OpContext,
            target: &str,
            members: &[String],
        ) -> Result<(), RunnerError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("add {} {}", target, members.join(",")));
            Ok(())
        }

        async fn remove(
            &self,
            _ctx: &OpContext,
            target: &str,
            member: &str,
        ) -> Result<(), RunnerError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("remove {} {}", target, member));
            if self.fail_on.as_deref() == Some(member) {
                return Err(RunnerError::not_found("gone", member));
            }
            Ok(())
        }
    }

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_apply_delta_order() {
        let recorder = Recorder::default();
        let delta = reconcile(&list(&["a", "d"]), &list(&["a", "b", "c"]));

        apply_delta(&recorder, &OpContext::new(), "C1", &delta)
            .await
            .unwrap();

        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec!["add C1 d", "remove C1 b", "remove C1 c"]
        );
    }

    #[tokio::test]
    async fn test_apply_delta_stops_at_first_failure() {
        let recorder = Recorder {
            fail_on: Some("b".to_string()),
            ..Recorder::default()
        };
        let delta = reconcile(&list(&["a"]), &list(&["a", "b", "c"]));

        let result = apply_delta(&recorder, &OpContext::new(), "C1", &delta).await;

        assert!(result.is_err());
        assert_eq!(*recorder.calls.lock().unwrap(), vec!["remove C1 b"]);
    }
}
