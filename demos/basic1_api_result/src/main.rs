use crate::tracing_setup::tracing_init;
use apiresult::{ApiResult, ApiResultIterExt, Failure};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

mod tracing_setup;

#[derive(Debug, Clone)]
struct Order {
    id: u32,
    items: Vec<String>,
    total_cents: u64,
}

async fn fetch_order(id: u32) -> Result<Order, Failure> {
    sleep(Duration::from_millis(50)).await;
    match id {
        1 => Ok(Order {
            id,
            items: vec!["keyboard".to_string(), "mouse".to_string()],
            total_cents: 12_900,
        }),
        2 => Ok(Order {
            id,
            items: Vec::new(),
            total_cents: 0,
        }),
        _ => Err(Failure::msg(format!("order {} does not exist", id))),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_init()?;

    info!("==========================================");
    let mut results: Vec<ApiResult<Order>> = Vec::new();
    for id in 1..=3 {
        let result = ApiResult::<Order>::invoke_async(fetch_order(id))
            .await
            .on_error(|failure| warn!("order {} failed: {}", id, failure));
        results.push(result);
    }

    info!("==========================================");
    for result in &results {
        let summary = result
            .clone()
            .map(|order| order.items)
            .error_if_empty()
            .fold(
                |items| format!("ships {}", items.join(", ")),
                |failure| format!("nothing to ship ({})", failure),
            );
        info!("  Main thread | {}", summary);
    }

    info!("==========================================");
    let revenue: u64 = results
        .iter()
        .cloned()
        .successes()
        .map(|order| order.total_cents)
        .sum();
    info!("  Main thread | revenue: {}.{:02}", revenue / 100, revenue % 100);

    let failed = results.iter().cloned().errors().count();
    info!("  Main thread | failed requests: {}", failed);

    info!("==========================================");
    let all: ApiResult<Vec<u32>> = results
        .into_iter()
        .map_values(|order| order.id)
        .collect();
    match all.into_result() {
        Ok(ids) => info!("  Main thread | every order loaded: {:?}", ids),
        Err(failure) => warn!("  Main thread | batch rejected: {}", failure),
    }

    let pending: ApiResult<Order> = ApiResult::Loading;
    let label = pending.fold_with_loading(|_| "done", |_| "failed", || "still loading");
    info!("  Main thread | a fresh request is {}", label);

    info!("  Main thread | Finish");
    Ok(())
}
