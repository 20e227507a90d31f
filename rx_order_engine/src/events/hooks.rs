use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{EventHandler, EventProducer, Handler, OrdersReceivedEvent};

/// The sending side of every registered consumer. Publishing an event delivers a copy to each of them.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub orders_received_producer: Vec<EventProducer<OrdersReceivedEvent>>,
}

impl EventProducers {
    /// Merges the producers of another set of handlers into this one, so that a single publish reaches both.
    pub fn extend(&mut self, other: EventProducers) {
        self.orders_received_producer.extend(other.orders_received_producer);
    }

    pub async fn publish_orders_received(&self, event: OrdersReceivedEvent) {
        trace!(
            "📬️ Publishing {} received orders for shop {} to {} consumers",
            event.orders.len(),
            event.shop_id,
            self.orders_received_producer.len()
        );
        for producer in &self.orders_received_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_orders_received: Option<EventHandler<OrdersReceivedEvent>>,
}

impl EventHandlers {
    pub fn new(name: &'static str, buffer_size: usize, hooks: EventHooks) -> Self {
        let on_orders_received = hooks.on_orders_received.map(|f| EventHandler::new(name, buffer_size, f));
        Self { on_orders_received }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_orders_received {
            result.orders_received_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_orders_received {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_orders_received: Option<Handler<OrdersReceivedEvent>>,
}

impl EventHooks {
    pub fn on_orders_received<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrdersReceivedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_orders_received = Some(Arc::new(f));
        self
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    fn counting_handlers(name: &'static str, counter: Arc<AtomicUsize>) -> EventHandlers {
        let mut hooks = EventHooks::default();
        hooks.on_orders_received(move |ev| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(ev.orders.len() + 1, Ordering::SeqCst);
            })
        });
        EventHandlers::new(name, 4, hooks)
    }

    #[tokio::test]
    async fn one_publish_reaches_every_consumer() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let h1 = counting_handlers("first", first.clone());
        let h2 = counting_handlers("second", second.clone());
        let mut producers = h1.producers();
        producers.extend(h2.producers());
        assert_eq!(producers.orders_received_producer.len(), 2);
        let c1 = h1.on_orders_received.map(|h| tokio::spawn(h.start_handler()));
        let c2 = h2.on_orders_received.map(|h| tokio::spawn(h.start_handler()));
        producers.publish_orders_received(OrdersReceivedEvent::new("S1".into(), vec![])).await;
        drop(producers);
        for c in [c1, c2].into_iter().flatten() {
            c.await.unwrap();
        }
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
