//! Error types shared by the accessor, forms and screens.

use thiserror::Error;

pub type PortalResult<T> = Result<T, PortalError>;

/// Failure of a single request against the backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RequestError {
    #[error("Server unreachable: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    /// Non-2xx response; `message` is taken from the body when it carries one.
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("Unreadable response body: {0}")]
    Body(String),
}

impl RequestError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        if err.is_decode() || err.is_body() {
            return Self::Body(err.to_string());
        }
        Self::Network(err.to_string())
    }
}

/// Client-side rule failure, raised before anything is sent.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be a number")]
    NotANumber { field: &'static str },

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Amount {amount:.2} exceeds the pending balance of {pending:.2}")]
    ExceedsPending { amount: f64, pending: f64 },

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("New password must differ from the current one")]
    PasswordUnchanged,

    #[error("Photo is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Unknown {field}: {value}")]
    UnknownOption { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum PortalError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0} is not available for this account")]
    Unsupported(&'static str),
}

impl PortalError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// True when the failure happened before any request was issued.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
