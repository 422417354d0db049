use crate::{ApiResult, IntoApiResult};
use futures_core::stream::Stream;
use futures_signals::signal::{Mutable, MutableSignal, SignalExt, SignalStream};
use pin_project::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, trace};

/// Re-runs a cold stream producer on demand.
///
/// The trigger is a single conflated slot: calls to [`retry`](Self::retry)
/// that arrive before a consumer has reacted to the previous one collapse
/// into a single re-subscription. A fresh trigger counts as already fired, so
/// the first subscription starts as soon as a [`retrying`](Self::retrying)
/// stream is polled.
///
/// Clones share the same slot.
///
/// ```
/// use apiresult::{ApiResult, Failure, RetryTrigger};
/// use futures::StreamExt;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let trigger = RetryTrigger::new();
/// let profile = trigger.retrying_result(|| async { Ok::<_, Failure>("profile") });
/// let mut profile = std::pin::pin!(profile);
///
/// assert_eq!(profile.next().await, Some(ApiResult::Loading));
/// assert_eq!(profile.next().await, Some(ApiResult::success("profile")));
///
/// trigger.retry();
/// assert_eq!(profile.next().await, Some(ApiResult::Loading));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RetryTrigger {
    trigger: Mutable<u64>,
}

impl RetryTrigger {
    pub fn new() -> Self {
        RetryTrigger {
            trigger: Mutable::new(0),
        }
    }

    /// Asks every `retrying` stream to subscribe to its producer again.
    pub fn retry(&self) {
        let mut attempt = self.trigger.lock_mut();
        *attempt += 1;
        debug!(attempt = *attempt, "retry trigger: fired");
    }

    /// Number of times [`retry`](Self::retry) was called.
    pub fn attempts(&self) -> u64 {
        self.trigger.get()
    }

    /// A stream of subscriptions to `producer`, restarted on every trigger.
    ///
    /// On each observed trigger the current subscription is dropped and
    /// `producer` is called again. The stream ends once every handle to the
    /// trigger is gone and the last subscription has ended.
    pub fn retrying<F, S>(&self, producer: F) -> Retrying<F, S>
    where
        F: FnMut() -> S,
        S: Stream,
    {
        Retrying {
            triggers: self.trigger.signal().to_stream(),
            producer,
            current: None,
            triggers_done: false,
        }
    }

    /// Re-runs an async operation on every trigger, emitting `Loading` before
    /// each outcome. See [`ApiResult::flow`].
    pub fn retrying_result<T, R, F, Fut>(
        &self,
        mut producer: F,
    ) -> impl Stream<Item = ApiResult<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = R>,
        R: IntoApiResult<T>,
    {
        self.retrying(move || {
            let operation = producer();
            ApiResult::flow(move || operation)
        })
    }
}

impl Default for RetryTrigger {
    fn default() -> Self {
        Self::new()
    }
}

/// The stream returned by [`RetryTrigger::retrying`].
#[pin_project(project = RetryingProj)]
#[must_use = "Streams do nothing unless polled"]
pub struct Retrying<F, S> {
    #[pin]
    triggers: SignalStream<MutableSignal<u64>>,
    producer: F,
    #[pin]
    current: Option<S>,
    triggers_done: bool,
}

impl<F, S> Stream for Retrying<F, S>
where
    F: FnMut() -> S,
    S: Stream,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        // The signal only reports the latest value, so a burst of retries is
        // seen here as one.
        while !*this.triggers_done {
            match this.triggers.as_mut().poll_next(cx) {
                Poll::Ready(Some(attempt)) => {
                    trace!(attempt, "retry trigger: subscribing");
                    this.current.set(Some((this.producer)()));
                }
                Poll::Ready(None) => *this.triggers_done = true,
                Poll::Pending => break,
            }
        }

        if let Some(stream) = this.current.as_mut().as_pin_mut() {
            match stream.poll_next(cx) {
                Poll::Ready(Some(item)) => return Poll::Ready(Some(item)),
                Poll::Ready(None) => this.current.set(None),
                Poll::Pending => return Poll::Pending,
            }
        }

        if *this.triggers_done {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }
}
