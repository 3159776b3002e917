//! Errors surfaced by the customer repository.

/// Failure of a customer operation.
///
/// `status()` maps each kind onto the HTTP status a presentation layer
/// should answer with.
#[derive(Debug, thiserror::Error)]
pub enum CustomerError {
    #[error("No such customer: {id}")]
    NotFound { id: i64 },

    #[error("Customer has not been saved yet")]
    Unsaved,

    #[error("Storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl CustomerError {
    pub fn status(&self) -> u16 {
        match self {
            CustomerError::NotFound { .. } => 404,
            CustomerError::Unsaved => 400,
            CustomerError::Storage(_) => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CustomerError::NotFound { .. })
    }
}
