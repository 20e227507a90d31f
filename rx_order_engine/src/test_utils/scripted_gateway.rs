use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use rx_common::Credentials;

use crate::{
    db_types::NewOrder,
    traits::{GatewayError, OrderGateway, PushOutcome},
};

/// An [`OrderGateway`] that replays a script of responses, one per push, and records what was pushed.
///
/// Once the script runs out, every further push is accepted. With [`ScriptedGateway::with_delay`], each push is
/// recorded straight away but answered only after the delay.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGateway {
    script: Arc<Mutex<VecDeque<Result<PushOutcome, GatewayError>>>>,
    pushed: Arc<Mutex<Vec<NewOrder>>>,
    delay: Duration,
}

impl ScriptedGateway {
    pub fn new(script: Vec<Result<PushOutcome, GatewayError>>) -> Self {
        Self { script: Arc::new(Mutex::new(script.into())), pushed: Arc::default(), delay: Duration::ZERO }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn push_count(&self) -> usize {
        self.pushed.lock().expect("poisoned").len()
    }

    pub fn pushed(&self) -> Vec<NewOrder> {
        self.pushed.lock().expect("poisoned").clone()
    }
}

impl OrderGateway for ScriptedGateway {
    async fn push_order_update(&self, _: &Credentials, order: &NewOrder) -> Result<PushOutcome, GatewayError> {
        self.pushed.lock().expect("poisoned").push(order.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.script.lock().expect("poisoned").pop_front().unwrap_or(Ok(PushOutcome::Accepted))
    }
}
