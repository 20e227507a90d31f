//! Consumers of [`OrdersReceivedEvent`]s.
//!
//! Each consumer gets its own [`EventHandlers`] (and so its own channel and tasks). A failure or a slow-down in one of
//! them never affects the others.
use std::sync::Arc;

use booking_tools::StateLabels;
use futures::future::BoxFuture;
use log::*;
use rx_order_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    IngestApi,
    OrderBuffer,
    SqliteDatabase,
};

use crate::{integrations::booking::booking_order_from_new_order, notifier::Notifier};

pub const EVENT_BUFFER_SIZE: usize = 25;

/// Feeds the per-shop new-order buffer.
pub fn create_buffer_handlers(buffer: OrderBuffer) -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_orders_received(move |ev| {
        buffer.enqueue(&ev.shop_id, ev.orders);
        no_op()
    });
    EventHandlers::new("new-order buffer", EVENT_BUFFER_SIZE, hooks)
}

/// Records every received order as a new state.
pub fn create_persistence_handlers(db: SqliteDatabase) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let api = Arc::new(IngestApi::new(db));
    hooks.on_orders_received(move |ev| {
        let api = Arc::clone(&api);
        Box::pin(async move {
            let summary = api.ingest(&ev.orders).await;
            if summary.rejected() > 0 {
                warn!(
                    "🗃️ {} of {} orders received for shop {} could not be saved",
                    summary.rejected(),
                    ev.orders.len(),
                    ev.shop_id
                );
            }
        })
    });
    EventHandlers::new("persistence", EVENT_BUFFER_SIZE, hooks)
}

/// Forwards each received order to the notifier. The raw payloads are sent when the event carries them; otherwise the
/// orders are re-encoded in the booking system's format.
pub fn create_notification_handlers(notifier: Notifier, labels: StateLabels) -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_orders_received(move |ev| {
        if ev.payloads.is_empty() {
            for order in &ev.orders {
                notifier.notify_order_received(&booking_order_from_new_order(order, &labels));
            }
        } else {
            for payload in &ev.payloads {
                notifier.notify_raw_order(&ev.shop_id, payload);
            }
        }
        no_op()
    });
    EventHandlers::new("notifier", EVENT_BUFFER_SIZE, hooks)
}

/// The producers of all three consumers merged, so that one publish reaches each of them.
pub fn merged_producers(handlers: &[&EventHandlers]) -> EventProducers {
    let mut producers = EventProducers::default();
    for h in handlers {
        producers.extend(h.producers());
    }
    producers
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
