//! Simple stateless pub-sub event handler
//!
//! Each consumer of an event type owns one [`EventHandler`]: a channel plus the async function that handles each
//! event. Producers are cheap clones of the channel's sender. Every event is handled in its own task, so a slow or
//! failing consumer never holds up the producer, and never affects any other consumer.
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use log::*;
use tokio::sync::mpsc;

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    name: &'static str,
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(name: &'static str, buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { name, listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs until every producer has been dropped, then waits for in-flight events to finish.
    pub async fn start_handler(mut self) {
        let name = self.name;
        debug!("📬️ Starting {name} event handler");
        // drop the internal sender so that when the last producer is dropped, the handler shuts down
        drop(self.sender);
        let jobs = Arc::new(AtomicI64::new(0));
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ {name} handling event");
            let handler = Arc::clone(&self.handler);
            let job = JobGuard::start(&jobs);
            tokio::spawn(async move {
                (handler)(ev).await;
                drop(job);
                trace!("📬️ {name} event handled");
            });
        }
        while jobs.load(Ordering::SeqCst) > 0 {
            debug!("📬️ {name} waiting for jobs to complete");
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
        debug!("📬️ {name} event handler has shut down");
    }
}

/// Counts a job as in flight until dropped, including when the handler panics.
struct JobGuard(Arc<AtomicI64>);

impl JobGuard {
    fn start(jobs: &Arc<AtomicI64>) -> Self {
        jobs.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(jobs))
    }
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}
