use crate::api::models::upload::ErrorBody;
use crate::content_store::StoreError;
use axum::{
    Json,
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Anything other than POST on the upload route
    #[error("Method {method} not allowed")]
    MethodNotAllowed { method: Method },

    /// Required GitHub settings are absent; every upload is refused until redeployed
    #[error("Missing required configuration: {}", missing.join(", "))]
    MissingConfiguration { missing: Vec<&'static str> },

    /// Configuration that is present but unusable (raised at load time)
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Malformed request body
    #[error("{message}")]
    BadRequest { message: String },

    /// Multipart body parsed fine but carried no file under the upload field
    #[error("No file uploaded under field {field}")]
    NoFileUploaded { field: String },

    #[error("File exceeds maximum allowed size of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    /// The remote content store rejected the write or could not be reached
    #[error(transparent)]
    Upstream(#[from] StoreError),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Error::MissingConfiguration { .. } | Error::InvalidConfiguration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::BadRequest { .. } | Error::NoFileUploaded { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking which settings are missing
    pub fn user_message(&self) -> String {
        match self {
            Error::MethodNotAllowed { .. } => "Method Not Allowed. Only POST is supported.".to_string(),
            Error::MissingConfiguration { .. } => "Server configuration error. Missing GitHub credentials.".to_string(),
            Error::InvalidConfiguration { .. } => "Internal server error".to_string(),
            Error::BadRequest { message } => message.clone(),
            Error::NoFileUploaded { field } => format!("No file uploaded. Expected field name: {field}"),
            Error::PayloadTooLarge { limit } => format!("File exceeds maximum allowed size of {limit} bytes."),
            Error::Upstream(_) => "Failed to upload file to GitHub.".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Upstream(StoreError::Rejected { status, body, .. }) => {
                tracing::error!(%status, body = %body, "GitHub upload error");
            }
            Error::Upstream(e) => {
                tracing::error!("GitHub upload error: {:#}", e);
            }
            Error::InvalidConfiguration { .. } => {
                tracing::error!("Internal service error: {}", self);
            }
            Error::MissingConfiguration { .. } => {
                tracing::warn!("Refusing upload: {}", self);
            }
            Error::MethodNotAllowed { .. } | Error::BadRequest { .. } | Error::NoFileUploaded { .. } | Error::PayloadTooLarge { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();

        match &self {
            // The only non-JSON answer
            Error::MethodNotAllowed { .. } => (status, [(header::ALLOW, "POST")], self.user_message()).into_response(),
            Error::Upstream(store_error) => {
                let body = ErrorBody {
                    error: self.user_message(),
                    details: store_error.details(),
                };
                (status, Json(body)).into_response()
            }
            _ => (status, Json(ErrorBody::new(self.user_message()))).into_response(),
        }
    }
}

/// Type alias for handler results
pub type Result<T> = std::result::Result<T, Error>;
