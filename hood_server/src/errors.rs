use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use hood_engine::{
    traits::{CatalogError, GatewayError},
    AuthApiError,
    CartApiError,
    OrderLedgerError,
    PaymentFlowError,
};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("The payment gateway is unavailable. {0}")]
    UpstreamUnavailable(String),
    #[error("Payment verification failed")]
    PaymentVerificationFailed,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("{0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Unspecified error. {0}")]
    Unspecified(String),
}

impl ServerError {
    /// The error category reported to clients in the `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) | Self::PaymentVerificationFailed => "InvalidArgument",
            Self::Conflict(_) => "Conflict",
            Self::NoRecordFound(_) => "NotFound",
            Self::UpstreamUnavailable(_) => "UpstreamUnavailable",
            Self::AuthenticationError(AuthError::TokenIssueError(_)) => "Internal",
            Self::AuthenticationError(_) => "Unauthenticated",
            _ => "Internal",
        }
    }

    fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::PaymentVerificationFailed => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken(_) => StatusCode::FORBIDDEN,
                AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::TokenIssueError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(status).insert_header(ContentType::json()).body(
            serde_json::json!({ "success": false, "message": self.public_message(), "error": self.kind() })
                .to_string(),
        )
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Access denied. No token provided.")]
    MissingToken,
    /// The detail is for the logs. Clients only ever see the generic message.
    #[error("Invalid or expired token")]
    InvalidToken(String),
    #[error("Access denied. Admin privileges required.")]
    InsufficientPermissions,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Could not issue access token. {0}")]
    TokenIssueError(String),
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::MissingFields | AuthApiError::InvalidEmail(_) => Self::InvalidArgument(e.to_string()),
            AuthApiError::UserAlreadyExists => Self::Conflict(e.to_string()),
            AuthApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AuthApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            AuthApiError::DatabaseError(_) | AuthApiError::PasswordHashError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogError::InvalidProduct(_) => Self::InvalidArgument(e.to_string()),
            CatalogError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<CartApiError> for ServerError {
    fn from(e: CartApiError) -> Self {
        match e {
            CartApiError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            CartApiError::InvalidQuantity(_) | CartApiError::QuantityLimit(_) | CartApiError::InvalidSize => {
                Self::InvalidArgument(e.to_string())
            },
            CartApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            GatewayError::Unavailable(_) | GatewayError::Rejected { .. } | GatewayError::InvalidResponse(_) => {
                Self::UpstreamUnavailable(e.to_string())
            },
        }
    }
}

impl From<PaymentFlowError> for ServerError {
    fn from(e: PaymentFlowError) -> Self {
        match e {
            PaymentFlowError::InvalidAmount(_)
            | PaymentFlowError::InvalidRequest(_)
            | PaymentFlowError::InvalidWebhookSignature
            | PaymentFlowError::MalformedWebhook(_) => Self::InvalidArgument(e.to_string()),
            PaymentFlowError::ProductNotFound(_) | PaymentFlowError::IntentNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            PaymentFlowError::GatewayError(g) => g.into(),
            PaymentFlowError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<OrderLedgerError> for ServerError {
    fn from(e: OrderLedgerError) -> Self {
        match e {
            OrderLedgerError::PaymentNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderLedgerError::PaymentNotVerified | OrderLedgerError::InvalidRequest(_) => {
                Self::InvalidArgument(e.to_string())
            },
            OrderLedgerError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}
