// BillKeeper - local bill tracking
// Headless entry point: restores the store and logs the dashboard

use billkeeper::config::{AppConfig, RECENT_BILLS_LIMIT};
use billkeeper::services::{notifications, reports};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "billkeeper=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting BillKeeper");

    let config = AppConfig::from_env();
    let state = billkeeper::app::setup(&config).await?;
    let store = &state.store;

    let summary = reports::summary(store);
    tracing::info!(
        "{} bills: total {}, paid {}, pending {}",
        summary.bill_count,
        summary.total,
        summary.paid,
        summary.pending
    );

    for bill in reports::recent_bills(store, RECENT_BILLS_LIMIT) {
        tracing::info!(
            "Recent: {} {} due {} [{}]",
            store.category_name_for(&bill),
            bill.amount,
            bill.due_date.format("%Y-%m-%d"),
            bill.status.as_str()
        );
    }

    for notification in notifications::pending_notifications(store, chrono::Utc::now()) {
        tracing::info!("{}: {}", notification.title, notification.message);
    }

    state.shutdown().await?;
    Ok(())
}
