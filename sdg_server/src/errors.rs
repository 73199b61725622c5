use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use sdg_engine::DonationFlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    /// The details are logged, never sent to the donor.
    #[error("Something went wrong on our side. Please try again later.")]
    BackendError,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Unsupported payment method: {0}")]
    UnsupportedProvider(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Conflict(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedProvider(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<DonationFlowError> for ServerError {
    fn from(e: DonationFlowError) -> Self {
        match e {
            DonationFlowError::ValidationError(s) => Self::ValidationError(s),
            DonationFlowError::UnsupportedProvider(p) => Self::UnsupportedProvider(p),
            DonationFlowError::MalformedCallback(s) => Self::InvalidRequestBody(s),
            DonationFlowError::RecordNotFound(id) => Self::NoRecordFound(format!("Donation {id}")),
            e @ (DonationFlowError::DonationNotPending(_) | DonationFlowError::TransitionForbidden { .. }) => {
                Self::Conflict(e.to_string())
            },
            e @ (DonationFlowError::SignatureVerificationFailed | DonationFlowError::PersistenceFailure(_)) => {
                error!("💻️ Request failed. {e}");
                Self::BackendError
            },
        }
    }
}
