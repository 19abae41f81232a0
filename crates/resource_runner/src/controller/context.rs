use std::future::Future;

use slackctl_api::ApiError;
use tokio_util::sync::CancellationToken;

use crate::RunnerError;

/// Per-operation context: every remote call goes through [`OpContext::call`].
///
/// Once the token is cancelled no further call is started, and a call in
/// flight is abandoned at its next await point.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    cancel: CancellationToken,
}

impl OpContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs one remote call. `action` is the summary reported if it fails.
    pub async fn call<T, F>(&self, action: impl Into<String>, request: F) -> Result<T, RunnerError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(RunnerError::Cancelled {
                action: action.into(),
            });
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(RunnerError::Cancelled { action: action.into() }),
            result = request => result.map_err(|source| RunnerError::Remote {
                action: action.into(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_call_passes_result_through() {
        let ctx = OpContext::new();
        let value = ctx.call("noop", async { Ok::<_, ApiError>(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_call_maps_remote_error() {
        let ctx = OpContext::new();
        let err = ctx
            .call("failed to archive conversation", async {
                Err::<(), _>(ApiError::platform("conversations.archive", "not_authed"))
            })
            .await
            .unwrap_err();

        match err {
            RunnerError::Remote { action, source } => {
                assert_eq!(action, "failed to archive conversation");
                assert_eq!(source.code(), Some("not_authed"));
            }
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancelled_context_never_polls_request() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ctx = OpContext::with_cancellation(cancel);

        let polled = AtomicBool::new(false);
        let err = ctx
            .call("failed to create conversation", async {
                polled.store(true, Ordering::SeqCst);
                Ok::<_, ApiError>(())
            })
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_during_call_abandons_it() {
        let ctx = OpContext::new();
        let cancel = ctx.token().clone();

        let err = ctx
            .call("slow", async move {
                cancel.cancel();
                std::future::pending::<Result<(), ApiError>>().await
            })
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
    }
}
