use sea_orm::error::DbErr;
use serde::Serialize;
use thiserror::Error;

/// Service-level error taxonomy.
///
/// `InsufficientInventory` and `InventoryConflict` both mean "you are not
/// getting these tickets right now", but they are distinct outcomes with
/// distinct correct responses: the first means the stock simply was not
/// there at discovery time, the second means another buyer won the claim
/// race after discovery. Callers and tests match on the variant, never on
/// the message text.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Purchase limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Not enough inventory for {name}: available {available}, requested {requested}")]
    InsufficientInventory {
        name: String,
        available: u64,
        requested: u64,
    },

    #[error("Inventory slot already claimed: {0}")]
    InventoryConflict(String),

    #[error("Invalid pagination cursor: {0}")]
    InvalidCursor(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Stable machine-readable error kinds, e.g. for telemetry counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Database,
    NotFound,
    Validation,
    LimitExceeded,
    InsufficientInventory,
    InventoryConflict,
    InvalidCursor,
    InvalidOperation,
    Event,
    Internal,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::DatabaseError(_) => ErrorKind::Database,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::ValidationError(_) => ErrorKind::Validation,
            ServiceError::LimitExceeded(_) => ErrorKind::LimitExceeded,
            ServiceError::InsufficientInventory { .. } => ErrorKind::InsufficientInventory,
            ServiceError::InventoryConflict(_) => ErrorKind::InventoryConflict,
            ServiceError::InvalidCursor(_) => ErrorKind::InvalidCursor,
            ServiceError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            ServiceError::EventError(_) => ErrorKind::Event,
            ServiceError::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// Message suitable for showing to the buyer. The two inventory
    /// failures get different texts because the correct user response
    /// differs: give up vs. resubmit.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::NotFound(what) => format!("{} could not be found", what),
            ServiceError::ValidationError(msg) => msg.clone(),
            ServiceError::LimitExceeded(msg) => msg.clone(),
            ServiceError::InsufficientInventory { name, available, .. } => format!(
                "Not enough tickets available for {} (only {} left)",
                name, available
            ),
            ServiceError::InventoryConflict(_) => {
                "Someone just bought the last of these tickets — please try again".to_string()
            }
            ServiceError::InvalidCursor(_) => "The page link is no longer valid".to_string(),
            ServiceError::InvalidOperation(msg) => msg.clone(),
            ServiceError::DatabaseError(_)
            | ServiceError::EventError(_)
            | ServiceError::InternalError(_) => {
                "Something went wrong on our side — please try again".to_string()
            }
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(errors.to_string())
    }
}
