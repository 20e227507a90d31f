use std::time::Duration;

use chrono::Utc;
use log::*;
use rx_order_engine::{db_types::OrderKey, ReminderApi, SqliteDatabase};
use tokio::task::JoinHandle;

use crate::notifier::Notifier;

/// Starts the reminder worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_reminder_worker(
    db: SqliteDatabase,
    notifier: Notifier,
    interval: Duration,
    threshold: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = ReminderApi::new(db);
        info!("🕰️ Reminder worker started. Orders untouched for {}m will be flagged", threshold.as_secs() / 60);
        loop {
            timer.tick().await;
            trace!("🕰️ Running reminder scan");
            run_reminder_scan(&api, &notifier, threshold).await;
        }
    })
}

/// Sends one reminder per overdue order and returns the orders reminded about.
pub async fn run_reminder_scan(
    api: &ReminderApi<SqliteDatabase>,
    notifier: &Notifier,
    threshold: Duration,
) -> Vec<OrderKey> {
    match api.overdue_orders(threshold, Utc::now()).await {
        Ok(keys) => {
            if !keys.is_empty() {
                info!("🕰️ {} orders are waiting for a shop: {}", keys.len(), order_list(&keys));
            }
            for key in &keys {
                notifier.notify_reminder(key);
            }
            keys
        },
        Err(e) => {
            error!("🕰️ Error running the reminder scan: {e}");
            Vec::new()
        },
    }
}

fn order_list(keys: &[OrderKey]) -> String {
    keys.iter().map(OrderKey::to_string).collect::<Vec<String>>().join(", ")
}
