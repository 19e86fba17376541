use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use oja_engine::{CatalogError, MarketplaceError};
use paystack_tools::PaystackApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Illegal order state change. {0}")]
    IllegalStateChange(String),
    #[error("The order was modified concurrently. {0}")]
    Conflict(String),
    #[error("Invalid or missing API key")]
    InvalidApiKey,
    #[error("Invalid or missing webhook signature")]
    InvalidSignature,
    #[error("The payment gateway rejected the request. {0}")]
    PaymentGatewayError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::IllegalStateChange(_) => StatusCode::BAD_REQUEST,
            Self::InvalidApiKey => StatusCode::UNAUTHORIZED,
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BackendError(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::PaymentGatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<MarketplaceError> for ServerError {
    fn from(e: MarketplaceError) -> Self {
        match e {
            MarketplaceError::OrderNotFound(_) | MarketplaceError::MarketNotFound(_) | MarketplaceError::AgentNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            MarketplaceError::InvalidStatusTransition { .. }
            | MarketplaceError::OrderModificationNoOp
            | MarketplaceError::OrderModificationForbidden(_)
            | MarketplaceError::PaymentReferenceClash(_)
            | MarketplaceError::UnsupportedAction(_) => Self::IllegalStateChange(e.to_string()),
            MarketplaceError::OrderAlreadyExists(_) | MarketplaceError::OrderUpdateConflict(_) => {
                Self::Conflict(e.to_string())
            },
            MarketplaceError::DatabaseError(e) => Self::BackendError(e),
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::MarketNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogError::EmptyQuery => Self::InvalidRequestBody(e.to_string()),
            CatalogError::DatabaseError(e) => Self::BackendError(e),
        }
    }
}

impl From<PaystackApiError> for ServerError {
    fn from(e: PaystackApiError) -> Self {
        Self::PaymentGatewayError(e.to_string())
    }
}
