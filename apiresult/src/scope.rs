use crate::{ApiResult, Cancelled, IntoApiResult};
use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::trace;

impl<T> ApiResult<T> {
    /// Awaits `operation` and captures its outcome.
    ///
    /// Cancelling the caller drops `operation` along with this future, so
    /// cancellation never shows up as a value.
    pub async fn invoke_async<R, Fut>(operation: Fut) -> Self
    where
        Fut: Future<Output = R>,
        R: IntoApiResult<T>,
    {
        operation.await.into_api_result()
    }

    /// Awaits `operation` unless `token` is cancelled first.
    ///
    /// Cancellation is reported as `Err(Cancelled)` for the caller to
    /// propagate; it is never turned into `ApiResult::Error`.
    pub async fn invoke_cancellable<R, Fut>(
        token: &CancellationToken,
        operation: Fut,
    ) -> Result<Self, Cancelled>
    where
        Fut: Future<Output = R>,
        R: IntoApiResult<T>,
    {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(Cancelled),
            result = operation => Ok(result.into_api_result()),
        }
    }
}

/// Runs `operation` in a supervised scope.
///
/// Children spawned through the [`Supervisor`] are isolated from each other
/// and from the scope: a child failing or panicking does not cancel its
/// siblings, and the scope only sees a child's outcome when it joins it. The
/// outcome of `operation` itself is captured into the returned result, while
/// a `Cancelled` it returns (usually by `?` on [`SupervisedTask::join`]) is
/// passed through untouched.
///
/// The scope waits for every child before returning. Dropping the scope's
/// future cancels the children that are still running.
///
/// ```
/// use apiresult::{supervise, ApiResult, Cancelled, Failure};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Cancelled> {
/// let result: ApiResult<i32> = supervise(|scope| async move {
///     let failing = scope.spawn(async { Err::<i32, _>(Failure::msg("boom")) });
///     let working = scope.spawn(async { Ok::<_, Failure>(2) });
///
///     assert!(failing.join().await?.is_error());
///     Ok::<_, Cancelled>(working.join().await?)
/// })
/// .await?;
///
/// assert_eq!(result, ApiResult::success(2));
/// # Ok(())
/// # }
/// ```
pub async fn supervise<T, R, F, Fut>(operation: F) -> Result<ApiResult<T>, Cancelled>
where
    F: FnOnce(Supervisor) -> Fut,
    Fut: Future<Output = Result<R, Cancelled>>,
    R: IntoApiResult<T>,
{
    let supervisor = Supervisor::new();
    let _cancel_on_drop = supervisor.token.clone().drop_guard();

    let outcome = operation(supervisor.clone()).await;

    supervisor.tracker.close();
    supervisor.tracker.wait().await;
    outcome.map(IntoApiResult::into_api_result)
}

/// Spawns the children of a [`supervise`] scope.
#[derive(Debug, Clone)]
pub struct Supervisor {
    tracker: TaskTracker,
    token: CancellationToken,
}

impl Supervisor {
    fn new() -> Self {
        Supervisor {
            tracker: TaskTracker::new(),
            token: CancellationToken::new(),
        }
    }

    /// Spawns a child onto the tokio runtime.
    pub fn spawn<T, R, Fut>(&self, child: Fut) -> SupervisedTask<T>
    where
        T: Send + 'static,
        R: IntoApiResult<T> + Send + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let token = self.token.clone();
        let handle = self.tracker.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(Cancelled),
                result = child => Ok(result.into_api_result()),
            }
        });
        SupervisedTask { handle }
    }

    /// Cancels every child that has not finished yet.
    pub fn cancel(&self) {
        trace!("supervisor: cancelling children");
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// A child of a supervised scope.
#[derive(Debug)]
pub struct SupervisedTask<T> {
    handle: JoinHandle<Result<ApiResult<T>, Cancelled>>,
}

impl<T> SupervisedTask<T> {
    /// Waits for the child.
    ///
    /// Returns `Err(Cancelled)` if the child was cancelled or aborted. A
    /// panic in the child resumes in the joining task.
    pub async fn join(self) -> Result<ApiResult<T>, Cancelled> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
            Err(_) => Err(Cancelled),
        }
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
