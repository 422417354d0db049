use crate::tracing_setup::tracing_init;
use apiresult::{Failure, Policy, SingleFlight};
use futures::future::join_all;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

mod tracing_setup;

#[derive(Debug, Clone)]
struct Session {
    token: String,
}

/// Pretends to log in against a slow backend; the first login is rejected.
async fn login(logins: Arc<AtomicU32>) -> Result<Session, Failure> {
    let attempt = logins.fetch_add(1, Ordering::SeqCst) + 1;
    debug!("Worker thread | login attempt {}", attempt);
    sleep(Duration::from_millis(100)).await;
    if attempt == 1 {
        return Err(Failure::msg("backend is warming up"));
    }
    Ok(Session {
        token: format!("token-{}", attempt),
    })
}

async fn burst(session: &Arc<SingleFlight<Session>>, callers: usize) {
    let handles = (0..callers).map(|caller| {
        let session = session.clone();
        tokio::spawn(async move { (caller, session.get().await) })
    });
    for handle in join_all(handles).await {
        match handle {
            Ok((caller, Ok(session))) => info!("  caller {} | {}", caller, session.token),
            Ok((caller, Err(failure))) => warn!("  caller {} | {}", caller, failure),
            Err(error) => warn!("  caller task failed: {}", error),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_init()?;

    for policy in [Policy::Exchange, Policy::Mutex] {
        info!("==========================================");
        info!("  Main thread | policy {:?}", policy);

        let logins = Arc::new(AtomicU32::new(0));
        let counter = logins.clone();
        let session = Arc::new(SingleFlight::new(policy, move || login(counter.clone())));

        warn!("five callers arrive together and share the first, failing login");
        burst(&session, 5).await;

        warn!("the failure was not cached, so the next burst logs in again");
        burst(&session, 5).await;

        info!("  Main thread | cached: {:?}", session.cached().map(|s| s.token));

        session.invalidate();
        let refreshed = session.get_result().await;
        info!("  Main thread | after invalidate: {:?}", refreshed.map(|s| s.token));
        info!("  Main thread | backend saw {} logins", logins.load(Ordering::SeqCst));
    }

    info!("  Main thread | Finish");
    Ok(())
}
