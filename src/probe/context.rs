//! Cancellation and deadline handling for a single probe.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error_handling::{FetchError, ProbeError};

/// Cancellable context bounding every HTTP round trip of one probe.
///
/// Cancelling the token or passing the deadline aborts the in-flight request
/// and surfaces as a `ProbeError`.
#[derive(Debug, Clone, Default)]
pub struct ProbeContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ProbeContext {
    /// Context with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Context driven by an externally owned cancellation token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Cancels every probe sharing this context.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Runs `fut` unless the context is cancelled or its deadline passes first.
    pub(crate) async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, ProbeError> {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ProbeError::Cancelled),
            _ = deadline => Err(ProbeError::DeadlineExceeded),
            output = fut => Ok(output),
        }
    }

    /// Like `guard`, for a fetch whose own failure is also a probe failure.
    pub(crate) async fn run<T, F>(&self, fut: F) -> Result<T, ProbeError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        self.guard(fut).await?.map_err(ProbeError::from)
    }
}
