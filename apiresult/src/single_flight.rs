use crate::{ApiResult, Failure};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::PoisonError;
use tracing::debug;

type Producer<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, Failure>> + Send + Sync>;
type Attempt<T> = Shared<BoxFuture<'static, Result<T, Failure>>>;

/// How a [`SingleFlight`] keeps concurrent callers on a single computation.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum Policy {
    /// Callers swap a shared handle to the running computation in and out of
    /// a slot and await it outside any lock. A warm cache is read without
    /// waiting on anyone.
    #[default]
    Exchange,
    /// One lock is held from the cache check to the end of the computation.
    /// Every access is serialized, including reads of a warm cache.
    Mutex,
}

/// A lazily computed asynchronous value, computed at most once at a time.
///
/// - The first [`get`](Self::get) starts the producer; callers arriving while
///   it runs await that same computation instead of starting another.
/// - A success is cached and handed out without calling the producer again.
/// - A failure reaches every caller awaiting that attempt, and is not cached:
///   the next call runs the producer again.
/// - [`invalidate`](Self::invalidate) forgets the cached value so the next
///   call recomputes.
///
/// ```
/// use apiresult::{Failure, SingleFlight};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Failure> {
/// let config = SingleFlight::exchange(|| async { Ok::<_, Failure>("loaded".to_string()) });
///
/// assert_eq!(config.get().await?, "loaded");
/// assert_eq!(config.cached(), Some("loaded".to_string()));
/// # Ok(())
/// # }
/// ```
pub struct SingleFlight<T> {
    producer: Producer<T>,
    slot: Slot<T>,
}

enum Slot<T> {
    Exchange(std::sync::Mutex<Option<Attempt<T>>>),
    Mutex {
        memo: tokio::sync::Mutex<Memo<T>>,
        // Bumped by `invalidate`; cached values stamped with an older
        // generation are stale.
        generation: AtomicU64,
        // Number of attempts that ran to completion.
        attempts: AtomicU64,
    },
}

struct Memo<T> {
    value: Option<(u64, T)>,
    failure: Option<(u64, Failure)>,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new<E, F, Fut>(policy: Policy, producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<Failure> + 'static,
    {
        let producer: Producer<T> =
            Box::new(move || producer().map(|outcome| outcome.map_err(Into::into)).boxed());
        let slot = match policy {
            Policy::Exchange => Slot::Exchange(std::sync::Mutex::new(None)),
            Policy::Mutex => Slot::Mutex {
                memo: tokio::sync::Mutex::new(Memo {
                    value: None,
                    failure: None,
                }),
                generation: AtomicU64::new(0),
                attempts: AtomicU64::new(0),
            },
        };
        SingleFlight { producer, slot }
    }

    pub fn exchange<E, F, Fut>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<Failure> + 'static,
    {
        Self::new(Policy::Exchange, producer)
    }

    pub fn mutex<E, F, Fut>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<Failure> + 'static,
    {
        Self::new(Policy::Mutex, producer)
    }

    /// Returns the value, computing it if needed.
    ///
    /// The returned failure is the producer's own, shared by every caller of
    /// the failed attempt.
    pub async fn get(&self) -> Result<T, Failure> {
        match &self.slot {
            Slot::Exchange(slot) => self.get_exchanged(slot).await,
            Slot::Mutex {
                memo,
                generation,
                attempts,
            } => self.get_serialized(memo, generation, attempts).await,
        }
    }

    pub async fn get_result(&self) -> ApiResult<T> {
        self.get().await.into()
    }

    /// The cached value, if one is ready. Never waits and never computes.
    pub fn cached(&self) -> Option<T> {
        match &self.slot {
            Slot::Exchange(slot) => {
                let installed = slot.lock().unwrap_or_else(PoisonError::into_inner);
                let value = installed
                    .as_ref()
                    .and_then(Shared::peek)
                    .and_then(|outcome| outcome.as_ref().ok())
                    .cloned();
                value
            }
            Slot::Mutex {
                memo, generation, ..
            } => {
                let memo = memo.try_lock().ok()?;
                let current = generation.load(Ordering::Acquire);
                let value = match &memo.value {
                    Some((stamp, value)) if *stamp == current => Some(value.clone()),
                    _ => None,
                };
                value
            }
        }
    }

    /// Forgets the cached value and any computation in flight.
    ///
    /// Callers already awaiting a running computation still receive its
    /// outcome; the next call to [`get`](Self::get) starts a new one.
    pub fn invalidate(&self) {
        debug!("single-flight: invalidated");
        match &self.slot {
            Slot::Exchange(slot) => {
                slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            }
            Slot::Mutex { generation, .. } => {
                generation.fetch_add(1, Ordering::AcqRel);
            }
        }
    }

    async fn get_exchanged(
        &self,
        slot: &std::sync::Mutex<Option<Attempt<T>>>,
    ) -> Result<T, Failure> {
        let attempt = {
            let mut installed = slot.lock().unwrap_or_else(PoisonError::into_inner);
            installed
                .get_or_insert_with(|| {
                    debug!("single-flight: starting computation");
                    (self.producer)().shared()
                })
                .clone()
        };

        let outcome = attempt.clone().await;

        if let Err(failure) = &outcome {
            let mut installed = slot.lock().unwrap_or_else(PoisonError::into_inner);
            if installed
                .as_ref()
                .is_some_and(|current| current.ptr_eq(&attempt))
            {
                debug!(%failure, "single-flight: computation failed, not cached");
                installed.take();
            }
        }
        outcome
    }

    async fn get_serialized(
        &self,
        memo: &tokio::sync::Mutex<Memo<T>>,
        generation: &AtomicU64,
        attempts: &AtomicU64,
    ) -> Result<T, Failure> {
        let arrived_after = attempts.load(Ordering::Acquire);
        let mut memo = memo.lock().await;
        let current = generation.load(Ordering::Acquire);

        if let Some((stamp, value)) = &memo.value {
            if *stamp == current {
                return Ok(value.clone());
            }
        }
        // An attempt that finished while this caller was queued already
        // answered it.
        if let Some((attempt, failure)) = &memo.failure {
            if *attempt > arrived_after {
                return Err(failure.clone());
            }
        }

        debug!("single-flight: starting computation");
        let outcome = (self.producer)().await;
        let attempt = attempts.fetch_add(1, Ordering::AcqRel) + 1;

        match &outcome {
            Ok(value) => {
                memo.value = Some((current, value.clone()));
                memo.failure = None;
            }
            Err(failure) => {
                debug!(%failure, "single-flight: computation failed, not cached");
                memo.value = None;
                memo.failure = Some((attempt, failure.clone()));
            }
        }
        outcome
    }
}

impl<T> SingleFlight<T> {
    pub fn policy(&self) -> Policy {
        match self.slot {
            Slot::Exchange(_) => Policy::Exchange,
            Slot::Mutex { .. } => Policy::Mutex,
        }
    }
}

impl<T> fmt::Debug for SingleFlight<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight")
            .field("policy", &self.policy())
            .finish_non_exhaustive()
    }
}
