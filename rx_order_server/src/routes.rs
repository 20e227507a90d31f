//! Request handler definitions
//!
//! Define each route and its handler here. Handlers stay thin: they unpack the request, call the engine API and map
//! the result. Anything longer goes into the engine.
//!
//! Every handler is async. The engine APIs are all I/O-bound, so nothing here blocks a worker thread.
//!
//! Transitions run on a task of their own. Actix drops a handler's future when its client disconnects, and a transition
//! cut off between the booking-system push and the local write would leave the two sides disagreeing.
use std::future::Future;

use actix_web::{get, web, HttpResponse, Responder};
use booking_tools::StateLabels;
use log::*;
use rx_order_engine::{
    db_types::OrderStatus,
    order_objects::TransitionRequest,
    traits::{OrderBackend, OrderGateway, OrderStore},
    OrderFlowApi,
    OrderFlowError,
    ShopOrdersApi,
};

use crate::{
    data_objects::{SuffixQuery, TransitionParams, TransitionResult},
    errors::ServerError,
    integrations::booking::label_for_status,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Shop reads  ----------------------------------------------------
route!(new_orders => Get "/shops/{shop_id}/orders/new" impl OrderStore);
/// Route handler for the new orders endpoint
///
/// Returns the orders polled for the shop since its last call, and empties the shop's buffer. A shop with nothing
/// waiting gets a 404, so an order is never handed out twice.
pub async fn new_orders<B: OrderStore>(
    path: web::Path<String>,
    api: web::Data<ShopOrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let shop_id = path.into_inner();
    debug!("💻️ GET new orders for shop {shop_id}");
    let orders = api.get_new_orders(&shop_id)?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(all_orders => Get "/shops/{shop_id}/orders" impl OrderStore);
/// Route handler for the shop orders endpoint. Every stored order of the shop, at its current state.
pub async fn all_orders<B: OrderStore>(
    path: web::Path<String>,
    api: web::Data<ShopOrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let shop_id = path.into_inner();
    debug!("💻️ GET all orders for shop {shop_id}");
    let orders = api.get_all_orders(&shop_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(search_orders => Get "/shops/{shop_id}/orders/search" impl OrderStore);
pub async fn search_orders<B: OrderStore>(
    path: web::Path<String>,
    query: web::Query<SuffixQuery>,
    api: web::Data<ShopOrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let shop_id = path.into_inner();
    let SuffixQuery { suffix } = query.into_inner();
    debug!("💻️ GET orders for shop {shop_id} ending in '{suffix}'");
    let orders = api.get_orders_by_id_suffix(&shop_id, &suffix).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Transitions  ----------------------------------------------------
route!(confirm_order => Post "/shops/{shop_id}/orders/{order_id}/confirm" impl OrderBackend, OrderGateway);
/// Route handler for order confirmation
///
/// The body lists the drugs the shop confirms, optionally with a changed quantity. Unlisted or unconfirmed drugs are
/// dropped from the order. The update is pushed to the booking system before it is stored.
pub async fn confirm_order<B: OrderBackend + 'static, G: OrderGateway + 'static>(
    path: web::Path<(String, String)>,
    body: web::Json<TransitionParams>,
    api: web::Data<OrderFlowApi<B, G>>,
    labels: web::Data<StateLabels>,
) -> Result<HttpResponse, ServerError> {
    let request = transition_request(path.into_inner(), body.into_inner());
    debug!("💻️ POST confirm for {}", request.key());
    let api = api.into_inner();
    let status = detached(async move { api.confirm_order(request).await }).await?;
    Ok(transition_response(status, &labels))
}

route!(complete_order => Post "/shops/{shop_id}/orders/{order_id}/complete" impl OrderBackend, OrderGateway);
pub async fn complete_order<B: OrderBackend + 'static, G: OrderGateway + 'static>(
    path: web::Path<(String, String)>,
    body: web::Json<TransitionParams>,
    api: web::Data<OrderFlowApi<B, G>>,
    labels: web::Data<StateLabels>,
) -> Result<HttpResponse, ServerError> {
    let request = transition_request(path.into_inner(), body.into_inner());
    debug!("💻️ POST complete for {}", request.key());
    let api = api.into_inner();
    let status = detached(async move { api.complete_order(request).await }).await?;
    Ok(transition_response(status, &labels))
}

route!(cancel_order => Post "/shops/{shop_id}/orders/{order_id}/cancel" impl OrderBackend, OrderGateway);
/// Route handler for order cancellation. A `reason` in the body is stored with the canceled state.
pub async fn cancel_order<B: OrderBackend + 'static, G: OrderGateway + 'static>(
    path: web::Path<(String, String)>,
    body: web::Json<TransitionParams>,
    api: web::Data<OrderFlowApi<B, G>>,
    labels: web::Data<StateLabels>,
) -> Result<HttpResponse, ServerError> {
    let request = transition_request(path.into_inner(), body.into_inner());
    debug!("💻️ POST cancel for {}", request.key());
    let api = api.into_inner();
    let status = detached(async move {
        api.cancel_order(request).await.map_err(|e| {
            if let OrderFlowError::GaveUp { key, attempts } = &e {
                warn!("💻️ Cancellation of {key} was abandoned after {attempts} attempts");
            }
            e
        })
    })
    .await?;
    Ok(transition_response(status, &labels))
}

/// Runs a transition on the worker's local task set and waits for it. The task carries on if this future is dropped.
async fn detached<F>(transition: F) -> Result<OrderStatus, ServerError>
where F: Future<Output = Result<OrderStatus, OrderFlowError>> + 'static {
    let status = actix_web::rt::spawn(transition).await.map_err(|e| {
        error!("💻️ A transition task failed to finish. {e}");
        ServerError::TaskFailed(e.to_string())
    })??;
    Ok(status)
}

fn transition_request((shop_id, order_id): (String, String), params: TransitionParams) -> TransitionRequest {
    let TransitionParams { reason, items } = params;
    let request = TransitionRequest::new(shop_id, order_id).with_items(items);
    match reason {
        Some(r) => request.with_reason(r),
        None => request,
    }
}

fn transition_response(status: OrderStatus, labels: &StateLabels) -> HttpResponse {
    let result = TransitionResult { state: label_for_status(status, labels).to_string(), status };
    HttpResponse::Ok().json(result)
}
