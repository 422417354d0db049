use crate::tracing_setup::tracing_init;
use apiresult::{ApiResult, Failure, RetryTrigger};
use futures::StreamExt;
use std::pin::pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

mod tracing_setup;

/// A weather lookup that only succeeds on its third call.
async fn forecast(calls: Arc<AtomicU32>) -> Result<String, Failure> {
    let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
    sleep(Duration::from_millis(80)).await;
    if call < 3 {
        return Err(Failure::msg(format!("station offline (call {})", call)));
    }
    Ok("sunny, 21°C".to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_init()?;

    let calls = Arc::new(AtomicU32::new(0));
    let trigger = RetryTrigger::new();

    let counter = calls.clone();
    let weather = trigger.retrying_result(move || forecast(counter.clone()));
    let mut weather = pin!(weather);

    // Stands in for a "retry" button that a user hammers.
    let button = trigger.clone();
    tokio::spawn(async move {
        for _ in 0..2 {
            sleep(Duration::from_millis(200)).await;
            warn!("Worker thread | retry pressed three times");
            button.retry();
            button.retry();
            button.retry();
        }
    });

    info!("==========================================");
    while let Some(state) = weather.next().await {
        match state {
            ApiResult::Loading => info!("  Main thread | loading..."),
            ApiResult::Error { error } => warn!("  Main thread | failed: {}", error),
            ApiResult::Success { value } => {
                info!("  Main thread | forecast: {}", value);
                break;
            }
        }
    }

    info!("==========================================");
    info!(
        "  Main thread | {} retries requested, {} lookups made",
        trigger.attempts(),
        calls.load(Ordering::SeqCst)
    );
    info!("  Main thread | Finish");
    Ok(())
}
