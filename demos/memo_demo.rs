//! Memo Demo Application
//!
//! Walks through life-based expiry and tag invalidation with a simulated
//! slow lookup.
//!
//! Usage:
//!   cargo run --example memo_demo
//!
//! Environment variables:
//!   RUST_LOG                   - log filter (default: info,ouroboros_memo=debug)
//!   MEMO_DEFAULT_LIFE_SECS     - life for entries that never set one
//!   MEMO_MISSING_CONTEXT       - recompute | fail

use ouroboros_memo::{add_tags, invalidate_by_tag, set_life, wrap_named, MemoStore};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn fetch_price(symbol: &str) -> anyhow::Result<Option<f64>> {
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Tagged from a helper, not from the memoized closure itself
    add_tags(["prices".to_string(), format!("symbol:{}", symbol)])?;

    Ok(match symbol {
        "ACME" => Some(101.25),
        "INIT" => Some(7.5),
        _ => None,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,ouroboros_memo=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Memo Demo ===");

    let price = wrap_named("prices", |symbol: String| async move {
        set_life(Duration::from_secs(2))?;
        fetch_price(&symbol).await
    });

    for attempt in 1..=2 {
        let started = Instant::now();
        let value = price.call("ACME".to_string()).await?;
        info!("ACME attempt {}: {:?} in {:?}", attempt, value, started.elapsed());
    }

    let unknown = price.call("NOPE".to_string()).await?;
    info!("Unknown symbol: {:?} (not cached, {} entries)", unknown, price.len());

    info!("\n--- Waiting past the 2s life ---");
    tokio::time::sleep(Duration::from_millis(2100)).await;
    let started = Instant::now();
    price.call("ACME".to_string()).await?;
    info!("ACME after expiry recomputed in {:?}", started.elapsed());

    info!("\n--- Tag invalidation ---");
    price.call("INIT".to_string()).await?;
    let removed = invalidate_by_tag("prices");
    info!("Invalidated {} entries tagged 'prices'", removed);

    info!("Final stats: {}", MemoStore::global().stats());
    Ok(())
}
