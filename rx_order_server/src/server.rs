use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use booking_tools::BookingApi;
use log::*;
use rx_order_engine::{
    traits::{OrderBackend, OrderGateway},
    CredentialCache,
    OrderBuffer,
    OrderFlowApi,
    OrderLocks,
    RetryPolicy,
    ShopOrdersApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    consumers::{create_buffer_handlers, create_notification_handlers, create_persistence_handlers, merged_producers},
    errors::ServerError,
    integrations::booking::BookingGateway,
    notifier::Notifier,
    poll_worker::{start_poll_worker, Poller},
    reminder_worker::start_reminder_worker,
    routes::{
        health,
        AllOrdersRoute,
        CancelOrderRoute,
        CompleteOrderRoute,
        ConfirmOrderRoute,
        NewOrdersRoute,
        SearchOrdersRoute,
    },
};

/// The long-lived pieces shared by the HTTP workers.
#[derive(Clone)]
pub struct ServerState {
    pub db: SqliteDatabase,
    pub gateway: BookingGateway,
    pub buffer: OrderBuffer,
    pub credentials: Arc<CredentialCache<SqliteDatabase>>,
    pub locks: OrderLocks,
}

impl ServerState {
    pub fn new(db: SqliteDatabase, gateway: BookingGateway) -> Self {
        let credentials = Arc::new(CredentialCache::new(db.clone()));
        Self { db, gateway, buffer: OrderBuffer::new(), credentials, locks: OrderLocks::new() }
    }

    /// A transition API over this state. Every handle built here serialises on the same lock table.
    pub fn order_flow_api(&self, retry: RetryPolicy) -> OrderFlowApi<SqliteDatabase, BookingGateway> {
        OrderFlowApi::new(self.db.clone(), self.gateway.clone(), Arc::clone(&self.credentials))
            .with_retry_policy(retry)
            .with_locks(self.locks.clone())
    }

    pub fn shop_orders_api(&self) -> ShopOrdersApi<SqliteDatabase> {
        ShopOrdersApi::new(self.db.clone(), self.buffer.clone())
    }
}

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🚀️ Database ready at {}", db.url());

    let api = BookingApi::new(config.booking.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = BookingGateway::new(api);
    let notifier = Notifier::new(config.notifier_url.clone(), config.notifier_timeout)?;
    if !notifier.is_enabled() {
        warn!("🚀️ No notifier URL is configured. Order and reminder notifications are disabled");
    }
    let state = ServerState::new(db.clone(), gateway.clone());

    let buffer_handlers = create_buffer_handlers(state.buffer.clone());
    let persistence_handlers = create_persistence_handlers(db.clone());
    let notification_handlers = create_notification_handlers(notifier.clone(), gateway.labels().clone());
    let producers = merged_producers(&[&buffer_handlers, &persistence_handlers, &notification_handlers]);
    buffer_handlers.start_handlers().await;
    persistence_handlers.start_handlers().await;
    notification_handlers.start_handlers().await;

    let poller =
        Poller { db: db.clone(), gateway: gateway.clone(), credentials: Arc::clone(&state.credentials), producers };
    let _poll_worker = start_poll_worker(poller, config.poll_interval, config.poll_concurrency);
    let _reminder_worker =
        start_reminder_worker(db.clone(), notifier, config.reminder_interval, config.reminder_threshold);

    let srv = create_server_instance(config, state)?;
    let result = srv.await.map_err(ServerError::from);
    db.close().await;
    result
}

pub fn create_server_instance(config: ServerConfig, state: ServerState) -> Result<Server, ServerError> {
    // Built once and cloned into every worker, so all workers share one lock table and credential cache.
    let shop_orders_api = web::Data::new(state.shop_orders_api());
    let order_flow_api = web::Data::new(state.order_flow_api(config.push_retry));
    let labels = web::Data::new(config.booking.state_labels.clone());
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("rxo::access_log"))
            .app_data(shop_orders_api.clone())
            .app_data(order_flow_api.clone())
            .app_data(labels.clone())
            .service(health)
            .configure(configure_routes::<SqliteDatabase, BookingGateway>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers the shop routes for a given backend and gateway.
pub fn configure_routes<B, G>(cfg: &mut web::ServiceConfig)
where
    B: OrderBackend + 'static,
    G: OrderGateway + 'static,
{
    cfg.service(NewOrdersRoute::<B>::new())
        .service(SearchOrdersRoute::<B>::new())
        .service(AllOrdersRoute::<B>::new())
        .service(ConfirmOrderRoute::<B, G>::new())
        .service(CompleteOrderRoute::<B, G>::new())
        .service(CancelOrderRoute::<B, G>::new());
}
