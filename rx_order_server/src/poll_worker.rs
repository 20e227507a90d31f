use std::{sync::Arc, time::Duration};

use log::*;
use rx_order_engine::{
    db_types::Shop,
    events::{EventProducers, OrdersReceivedEvent},
    traits::ShopManagement,
    CredentialCache,
    SqliteDatabase,
};
use tokio::{sync::Semaphore, task::JoinHandle};

use crate::integrations::booking::BookingGateway;

/// Everything a single shop poll needs. Cheap to clone.
#[derive(Clone)]
pub struct Poller {
    pub db: SqliteDatabase,
    pub gateway: BookingGateway,
    pub credentials: Arc<CredentialCache<SqliteDatabase>>,
    pub producers: EventProducers,
}

/// Starts the poll worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// On every tick, each logged-in shop is polled in its own task. At most `concurrency` polls run at once; the rest
/// wait for a slot. A tick never waits for the previous tick's polls to finish.
pub fn start_poll_worker(poller: Poller, interval: Duration, concurrency: usize) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let permits = Arc::new(Semaphore::new(concurrency.max(1)));
        info!("🕰️ Order poll worker started");
        loop {
            timer.tick().await;
            let polls = poll_logged_in_shops(&poller, &permits).await;
            trace!("🕰️ {} shop polls dispatched", polls.len());
        }
    })
}

/// Dispatches one poll per logged-in shop and returns their handles. Each handle yields the number of orders
/// published for its shop.
pub async fn poll_logged_in_shops(poller: &Poller, permits: &Arc<Semaphore>) -> Vec<JoinHandle<usize>> {
    let shops = match poller.db.fetch_logged_in_shops().await {
        Ok(shops) => shops,
        Err(e) => {
            error!("🕰️ Could not fetch the logged-in shops. Skipping this poll. {e}");
            return Vec::new();
        },
    };
    debug!("🕰️ Polling {} logged-in shops", shops.len());
    shops
        .into_iter()
        .map(|shop| {
            let poller = poller.clone();
            let permits = Arc::clone(permits);
            tokio::spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return 0;
                };
                poll_shop(&poller, &shop).await
            })
        })
        .collect()
}

/// Pulls the new orders for one shop and publishes them. Errors are logged; the next tick retries naturally.
pub async fn poll_shop(poller: &Poller, shop: &Shop) -> usize {
    let credentials = match poller.credentials.credentials_for_corporation(shop.corporation_id).await {
        Ok(c) => c,
        Err(e) => {
            error!("🕰️ No credentials to poll shop {}. {e}", shop.id);
            return 0;
        },
    };
    match poller.gateway.pull_new_orders(&credentials, &shop.id).await {
        Ok(orders) if orders.is_empty() => {
            trace!("🕰️ Nothing new for shop {}", shop.id);
            0
        },
        Ok(pulled) => {
            let count = pulled.len();
            info!("🕰️ {count} new orders for shop {}", shop.id);
            let (orders, payloads) = pulled.into_iter().unzip();
            let event = OrdersReceivedEvent::new(shop.id.clone(), orders).with_payloads(payloads);
            poller.producers.publish_orders_received(event).await;
            count
        },
        Err(e) => {
            warn!("🕰️ Could not poll shop {}. {e}", shop.id);
            0
        },
    }
}

#[cfg(test)]
mod test {
    use booking_tools::{BookingApi, BookingConfig};
    use rx_order_engine::{
        events::{EventHandlers, EventHooks},
        test_utils::prepare_env::{fresh_database, seed_shop},
    };
    use serde_json::json;
    use tokio::sync::mpsc;
    use wiremock::{
        matchers::{basic_auth, body_json, method, path},
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::*;

    fn order_json(shop: &str, id: &str) -> serde_json::Value {
        json!({
            "shopId": shop, "orderId": id, "phone": "+70000000000", "createdAt": 1700000000,
            "shipping": "pickup", "agent": "web", "extShopId": format!("ext-{shop}"), "status": "New",
            "items": [{ "drugId": "D1", "extDrugId": "X1", "quantity": 1, "price": 10.5 }]
        })
    }

    /// A consumer that forwards every event it receives to a channel.
    fn recording_handlers() -> (EventHandlers, mpsc::UnboundedReceiver<OrdersReceivedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut hooks = EventHooks::default();
        hooks.on_orders_received(move |ev| {
            let _ = tx.send(ev);
            Box::pin(async {})
        });
        (EventHandlers::new("recorder", 10, hooks), rx)
    }

    #[tokio::test]
    async fn polls_every_logged_in_shop_independently() {
        let _ = env_logger::try_init();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders/pull"))
            .and(basic_auth("corp-1", "secret-1"))
            .and(body_json(json!({"shopId": "S1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([order_json("S1", "O1")])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/orders/pull"))
            .and(body_json(json!({"shopId": "S2"})))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/orders/pull"))
            .and(body_json(json!({"shopId": "S3"})))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let db = fresh_database().await;
        seed_shop(&db, "S1", 1, true).await;
        seed_shop(&db, "S2", 2, true).await;
        seed_shop(&db, "S3", 2, true).await;
        seed_shop(&db, "S4", 2, false).await;

        let (handlers, mut events) = recording_handlers();
        let producers = handlers.producers();
        handlers.start_handlers().await;
        let config = BookingConfig { base_url: server.uri(), ..BookingConfig::default() };
        let poller = Poller {
            db: db.clone(),
            gateway: BookingGateway::new(BookingApi::new(config).unwrap()),
            credentials: Arc::new(CredentialCache::new(db.clone())),
            producers,
        };

        let polls = poll_logged_in_shops(&poller, &Arc::new(Semaphore::new(2))).await;
        assert_eq!(polls.len(), 3);
        let mut published = 0;
        for p in polls {
            published += p.await.unwrap();
        }
        assert_eq!(published, 1);

        let event = events.recv().await.unwrap();
        assert_eq!(event.shop_id, "S1");
        assert_eq!(event.orders.len(), 1);
        assert_eq!(event.orders[0].order_id, "O1");
        assert_eq!(event.payloads, vec![order_json("S1", "O1")]);
        assert!(events.try_recv().is_err());
    }
}
