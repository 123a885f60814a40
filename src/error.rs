use crate::domain::outcome::VerificationClass;
use thiserror::Error;

/// Missing or malformed fields of one step of the registration form.
///
/// Raised before any network call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("step {step} is missing required field(s): {}", .missing.join(", "))]
pub struct ValidationError {
    pub step: u8,
    pub missing: Vec<&'static str>,
}

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Order creation failed: {0}")]
    OrderCreation(String),
    #[error("Payment gateway failed to load: {0}")]
    GatewayLoad(String),
    #[error("Invalid payment session token: {0}")]
    InvalidSessionToken(String),
    #[error("Verification {class}: {message}")]
    Verification {
        class: VerificationClass,
        message: String,
        /// The backend answered and explicitly refused, as opposed to a transport failure.
        rejected: bool,
    },
    #[error("Missing payment information: {0}")]
    Disambiguation(String),
    #[error("Stash error: {0}")]
    Stash(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
}

pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Failures reported by a [`RegistrationBackend`](crate::domain::ports::RegistrationBackend).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("network error: {0}")]
    Transport(String),
    #[error("malformed backend response: {0}")]
    Decode(String),
}

impl BackendError {
    /// The human readable part, as the backend (or transport) phrased it.
    pub fn message(&self) -> &str {
        match self {
            BackendError::Rejected { message, .. } => message,
            BackendError::Transport(message) | BackendError::Decode(message) => message,
        }
    }

    /// Whether the backend itself answered with a refusal.
    pub fn is_rejection(&self) -> bool {
        matches!(self, BackendError::Rejected { .. })
    }
}
