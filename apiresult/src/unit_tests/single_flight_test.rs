use crate::unit_tests::TestError;
use crate::{ApiResult, Failure, Policy, SingleFlight};
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

const POLICIES: [Policy; 2] = [Policy::Exchange, Policy::Mutex];

fn counting(policy: Policy, calls: Arc<AtomicUsize>) -> SingleFlight<usize> {
    SingleFlight::new(policy, move || {
        let calls = calls.clone();
        async move {
            sleep(Duration::from_millis(20)).await;
            Ok::<_, Failure>(calls.fetch_add(1, Ordering::SeqCst) + 1)
        }
    })
}

/// Fails on the first call, succeeds afterwards.
fn flaky(policy: Policy, calls: Arc<AtomicUsize>) -> SingleFlight<&'static str> {
    SingleFlight::new(policy, move || {
        let calls = calls.clone();
        async move {
            sleep(Duration::from_millis(20)).await;
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(TestError::Network)
            } else {
                Ok("recovered")
            }
        }
    })
}

#[test]
fn test_default_policy_is_exchange() {
    assert_eq!(Policy::default(), Policy::Exchange);

    let flight = SingleFlight::exchange(|| async { Ok::<_, Failure>(1) });
    assert_eq!(flight.policy(), Policy::Exchange);
    let flight = SingleFlight::mutex(|| async { Ok::<_, Failure>(1) });
    assert_eq!(flight.policy(), Policy::Mutex);
    assert_eq!(format!("{:?}", flight), "SingleFlight { policy: Mutex, .. }");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_computation() {
    for policy in POLICIES {
        let calls = Arc::new(AtomicUsize::new(0));
        let flight = Arc::new(counting(policy, calls.clone()));

        let handles = (0..8).map(|_| {
            let flight = flight.clone();
            tokio::spawn(async move { flight.get().await })
        });
        let outcomes = join_all(handles).await;

        for outcome in outcomes {
            assert_eq!(outcome.unwrap().unwrap(), 1, "{:?}", policy);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1, "{:?}", policy);
    }
}

#[tokio::test]
async fn test_success_is_cached() {
    for policy in POLICIES {
        let calls = Arc::new(AtomicUsize::new(0));
        let flight = counting(policy, calls.clone());

        assert_eq!(flight.cached(), None);
        assert_eq!(flight.get().await.unwrap(), 1);
        assert_eq!(flight.get().await.unwrap(), 1);
        assert_eq!(flight.get_result().await, ApiResult::success(1));
        assert_eq!(flight.cached(), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1, "{:?}", policy);
    }
}

#[tokio::test]
async fn test_failure_is_not_cached() {
    for policy in POLICIES {
        let calls = Arc::new(AtomicUsize::new(0));
        let flight = flaky(policy, calls.clone());

        let failure = flight.get().await.unwrap_err();
        assert_eq!(failure.downcast_ref::<TestError>(), Some(&TestError::Network));
        assert_eq!(flight.cached(), None);

        assert_eq!(flight.get().await.unwrap(), "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2, "{:?}", policy);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_the_same_failure() {
    for policy in POLICIES {
        let calls = Arc::new(AtomicUsize::new(0));
        let flight = Arc::new(flaky(policy, calls.clone()));

        let handles = (0..4).map(|_| {
            let flight = flight.clone();
            tokio::spawn(async move { flight.get().await })
        });
        let failures: Vec<Failure> = join_all(handles)
            .await
            .into_iter()
            .map(|outcome| outcome.unwrap().unwrap_err())
            .collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1, "{:?}", policy);
        for failure in &failures[1..] {
            assert!(Failure::ptr_eq(failure, &failures[0]), "{:?}", policy);
        }

        assert_eq!(flight.get().await.unwrap(), "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2, "{:?}", policy);
    }
}

#[tokio::test]
async fn test_invalidate_forces_recomputation() {
    for policy in POLICIES {
        let calls = Arc::new(AtomicUsize::new(0));
        let flight = counting(policy, calls.clone());

        assert_eq!(flight.get().await.unwrap(), 1);
        flight.invalidate();
        assert_eq!(flight.cached(), None);

        assert_eq!(flight.get().await.unwrap(), 2);
        assert_eq!(flight.get().await.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2, "{:?}", policy);
    }
}

#[tokio::test]
async fn test_invalidate_before_first_get() {
    for policy in POLICIES {
        let calls = Arc::new(AtomicUsize::new(0));
        let flight = counting(policy, calls.clone());

        flight.invalidate();
        assert_eq!(flight.get().await.unwrap(), 1, "{:?}", policy);
    }
}

#[tokio::test]
async fn test_get_result_reports_errors() {
    for policy in POLICIES {
        let flight = SingleFlight::new(policy, || async { Err::<i32, _>(TestError::Network) });
        assert_eq!(flight.get_result().await, ApiResult::error(TestError::Network));
    }
}

#[tokio::test]
async fn test_cached_never_starts_a_computation() {
    for policy in POLICIES {
        let calls = Arc::new(AtomicUsize::new(0));
        let flight = counting(policy, calls.clone());

        assert_eq!(flight.cached(), None);
        assert_eq!(flight.cached(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0, "{:?}", policy);
    }
}

/// Numbers computations in the order they start.
fn numbering(policy: Policy, starts: Arc<AtomicUsize>) -> Arc<SingleFlight<usize>> {
    Arc::new(SingleFlight::new(policy, move || {
        let start = starts.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            sleep(Duration::from_millis(20)).await;
            Ok::<_, Failure>(start)
        }
    }))
}

fn spawn_get(flight: &Arc<SingleFlight<usize>>) -> tokio::task::JoinHandle<Result<usize, Failure>> {
    let flight = flight.clone();
    tokio::spawn(async move { flight.get().await })
}

#[tokio::test]
async fn test_exchange_caller_leaving_keeps_the_computation_for_others() {
    let starts = Arc::new(AtomicUsize::new(0));
    let flight = numbering(Policy::Exchange, starts.clone());

    let first = spawn_get(&flight);
    let second = spawn_get(&flight);
    sleep(Duration::from_millis(5)).await;
    first.abort();

    assert_eq!(second.await.unwrap().unwrap(), 1);
    assert!(first.await.unwrap_err().is_cancelled());
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(flight.cached(), Some(1));
}

#[tokio::test]
async fn test_mutex_waiter_recomputes_when_the_holder_leaves() {
    let starts = Arc::new(AtomicUsize::new(0));
    let flight = numbering(Policy::Mutex, starts.clone());

    let first = spawn_get(&flight);
    let second = spawn_get(&flight);
    sleep(Duration::from_millis(5)).await;
    first.abort();

    assert_eq!(second.await.unwrap().unwrap(), 2);
    assert!(first.await.unwrap_err().is_cancelled());
    assert_eq!(starts.load(Ordering::SeqCst), 2);
    assert_eq!(flight.cached(), Some(2));
}

#[tokio::test]
async fn test_invalidate_does_not_cancel_running_computation() {
    // (policy, second awaiter, next call)
    let expected = [(Policy::Exchange, 1, 2), (Policy::Mutex, 2, 2)];

    for (policy, second_value, next_value) in expected {
        let starts = Arc::new(AtomicUsize::new(0));
        let flight = numbering(policy, starts.clone());

        let first = spawn_get(&flight);
        let second = spawn_get(&flight);
        sleep(Duration::from_millis(5)).await;
        flight.invalidate();

        assert_eq!(first.await.unwrap().unwrap(), 1, "{:?}", policy);
        assert_eq!(second.await.unwrap().unwrap(), second_value, "{:?}", policy);
        assert_eq!(flight.get().await.unwrap(), next_value, "{:?}", policy);
        assert_eq!(starts.load(Ordering::SeqCst), 2, "{:?}", policy);
    }
}
