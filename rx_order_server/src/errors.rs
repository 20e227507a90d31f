use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use rx_order_engine::OrderFlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("The request's task did not finish. {0}")]
    TaskFailed(String),
    #[error("{0}")]
    OrderFlow(#[from] OrderFlowError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::OrderFlow(e) => match e {
                OrderFlowError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                OrderFlowError::ShopNotFound(_) => StatusCode::NOT_FOUND,
                OrderFlowError::NoNewOrders(_) => StatusCode::NOT_FOUND,
                OrderFlowError::NotAllowed { .. } => StatusCode::CONFLICT,
                OrderFlowError::Expired(_) => StatusCode::GONE,
                OrderFlowError::ValidationFailure(_) => StatusCode::BAD_REQUEST,
                OrderFlowError::GaveUp { .. } => StatusCode::SERVICE_UNAVAILABLE,
                OrderFlowError::GatewayFailure(_) => StatusCode::BAD_GATEWAY,
                OrderFlowError::CorporationNotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
                OrderFlowError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Error)]
pub enum OrderConversionError {
    #[error("The booking system sent a malformed order. {0}")]
    Malformed(String),
    #[error("The booking system sent an unknown state label: {0}")]
    UnknownStateLabel(String),
    #[error("Invalid price for drug {drug_id}. {message}")]
    InvalidPrice { drug_id: String, message: String },
}
