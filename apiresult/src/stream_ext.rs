use crate::{ApiResult, Failure, IntoApiResult};
use futures_core::stream::Stream;
use pin_project::pin_project;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Extension trait lifting plain streams into streams of [`ApiResult`]s.
///
/// This trait is implemented for all types that implement the `Stream` trait.
pub trait ApiResultStreamExt: Stream {
    /// Lifts a stream of `Result`s into a stream of `ApiResult`s.
    ///
    /// The returned stream emits `Loading` first, then a `Success` for every
    /// `Ok` item of the source. The first `Err` is emitted as a terminal
    /// `Error`, after which the stream ends. Dropping the stream drops the
    /// source; nothing is emitted for it.
    ///
    /// ## Examples
    ///
    /// ```
    /// use apiresult::{ApiResult, ApiResultStreamExt, Failure};
    /// use futures::StreamExt;
    ///
    /// # futures::executor::block_on(async {
    /// let items = futures::stream::iter(vec![Ok(1), Err(Failure::msg("boom")), Ok(3)])
    ///     .into_api_results()
    ///     .collect::<Vec<_>>()
    ///     .await;
    ///
    /// assert_eq!(items[0], ApiResult::Loading);
    /// assert_eq!(items[1], ApiResult::success(1));
    /// assert!(items[2].is_error());
    /// assert_eq!(items.len(), 3);
    /// # });
    /// ```
    fn into_api_results<T, E>(self) -> IntoApiResults<Self>
    where
        Self: Stream<Item = Result<T, E>> + Sized,
        E: Into<Failure>,
    {
        IntoApiResults {
            stream: self,
            started: false,
            stopped: false,
        }
    }
}
impl<S: ?Sized> ApiResultStreamExt for S where S: Stream {}

/// A stream of `ApiResult`s built from a stream of `Result`s.
///
/// This stream is created by the `into_api_results` method on
/// `ApiResultStreamExt`.
#[pin_project(project = IntoApiResultsProj)]
#[derive(Debug)]
#[must_use = "Streams do nothing unless polled"]
pub struct IntoApiResults<S> {
    #[pin]
    stream: S,
    started: bool,
    stopped: bool,
}

impl<S, T, E> Stream for IntoApiResults<S>
where
    S: Stream<Item = Result<T, E>>,
    E: Into<Failure>,
{
    type Item = ApiResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let IntoApiResultsProj {
            stream,
            started,
            stopped,
        } = self.project();

        if *stopped {
            return Poll::Ready(None);
        }
        if !*started {
            *started = true;
            return Poll::Ready(Some(ApiResult::Loading));
        }

        match stream.poll_next(cx) {
            Poll::Ready(Some(Ok(value))) => Poll::Ready(Some(ApiResult::success(value))),
            Poll::Ready(Some(Err(error))) => {
                *stopped = true;
                Poll::Ready(Some(ApiResult::error(error)))
            }
            Poll::Ready(None) => {
                *stopped = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> ApiResult<T> {
    /// A cold stream running `producer` once.
    ///
    /// Nothing happens until the stream is polled. It then emits `Loading`,
    /// calls `producer`, awaits the future and emits its outcome as the
    /// single terminal `Success` or `Error`.
    pub fn flow<R, F, Fut>(producer: F) -> ResultFlow<F, Fut, T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
        R: IntoApiResult<T>,
    {
        ResultFlow {
            producer: Some(producer),
            pending: None,
            stage: FlowStage::Idle,
            _marker: PhantomData,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlowStage {
    Idle,
    Running,
    Done,
}

/// The stream returned by [`ApiResult::flow`].
#[pin_project(project = ResultFlowProj)]
#[must_use = "Streams do nothing unless polled"]
pub struct ResultFlow<F, Fut, T> {
    producer: Option<F>,
    #[pin]
    pending: Option<Fut>,
    stage: FlowStage,
    _marker: PhantomData<fn() -> T>,
}

impl<F, Fut, T> Stream for ResultFlow<F, Fut, T>
where
    F: FnOnce() -> Fut,
    Fut: Future,
    Fut::Output: IntoApiResult<T>,
{
    type Item = ApiResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        match *this.stage {
            FlowStage::Idle => {
                *this.stage = FlowStage::Running;
                return Poll::Ready(Some(ApiResult::Loading));
            }
            FlowStage::Done => return Poll::Ready(None),
            FlowStage::Running => {}
        }

        if this.pending.is_none() {
            if let Some(producer) = this.producer.take() {
                this.pending.set(Some(producer()));
            }
        }

        let outcome = match this.pending.as_mut().as_pin_mut() {
            Some(future) => match future.poll(cx) {
                Poll::Ready(outcome) => outcome,
                Poll::Pending => return Poll::Pending,
            },
            None => {
                *this.stage = FlowStage::Done;
                return Poll::Ready(None);
            }
        };

        this.pending.set(None);
        *this.stage = FlowStage::Done;
        Poll::Ready(Some(outcome.into_api_result()))
    }
}
