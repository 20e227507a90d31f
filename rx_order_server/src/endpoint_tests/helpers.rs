use std::{sync::Arc, time::Duration};

use actix_web::{
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use booking_tools::StateLabels;
use log::debug;
use rx_order_engine::{
    db_types::NewOrder,
    test_utils::{
        prepare_env::{fresh_database, seed_shop},
        ScriptedGateway,
    },
    CredentialCache,
    IngestApi,
    OrderBuffer,
    OrderFlowApi,
    RetryPolicy,
    ShopOrdersApi,
    SqliteDatabase,
};

use crate::{routes::health, server::configure_routes};

/// A migrated database with shop `S1` (corporation 1) logged in, plus the buffer and gateway the routes use.
///
/// The APIs are built once and shared by every request, as the server does.
pub struct TestBackend {
    pub db: SqliteDatabase,
    pub buffer: OrderBuffer,
    pub gateway: ScriptedGateway,
    shop_orders_api: web::Data<ShopOrdersApi<SqliteDatabase>>,
    order_flow_api: web::Data<OrderFlowApi<SqliteDatabase, ScriptedGateway>>,
}

impl TestBackend {
    pub async fn new(gateway: ScriptedGateway) -> Self {
        let _ = env_logger::try_init();
        let db = fresh_database().await;
        seed_shop(&db, "S1", 1, true).await;
        let buffer = OrderBuffer::new();
        let credentials = Arc::new(CredentialCache::new(db.clone()));
        let retry = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5));
        let flow = OrderFlowApi::new(db.clone(), gateway.clone(), credentials).with_retry_policy(retry);
        Self {
            shop_orders_api: web::Data::new(ShopOrdersApi::new(db.clone(), buffer.clone())),
            order_flow_api: web::Data::new(flow),
            db,
            buffer,
            gateway,
        }
    }

    pub async fn with_orders(self, orders: &[NewOrder]) -> Self {
        let summary = IngestApi::new(self.db.clone()).ingest(orders).await;
        assert_eq!(summary.rejected(), 0);
        self
    }

    /// Sends the request through an app that has every route registered and returns the status and body.
    pub async fn send(&self, req: TestRequest) -> (StatusCode, String) {
        let service = test::init_service(self.app()).await;
        debug!("Making request");
        let res = test::call_service(&service, req.to_request()).await;
        let status = res.status();
        let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
        (status, body)
    }

    /// Sends the request but stops waiting for the response after `after`, the way a disconnecting client does.
    /// Returns whether the response was still outstanding at that point.
    pub async fn abandon(&self, req: TestRequest, after: Duration) -> bool {
        let service = test::init_service(self.app()).await;
        tokio::time::timeout(after, test::call_service(&service, req.to_request())).await.is_err()
    }

    fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.shop_orders_api.clone())
            .app_data(self.order_flow_api.clone())
            .app_data(web::Data::new(StateLabels::default()))
            .service(health)
            .configure(configure_routes::<SqliteDatabase, ScriptedGateway>)
    }
}

/// Issues a GET against an app set up by `configure` alone, for routes backed by mocks.
pub async fn get_request(path: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, TestRequest::get().uri(path).to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    (status, body)
}
