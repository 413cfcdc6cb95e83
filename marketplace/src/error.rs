//! Error taxonomy for marketplace operations
//!
//! Ledger failures never appear here: they are absorbed inside the
//! gateway. Store-level CAS conflicts and uniqueness violations are
//! mapped onto the user-facing taxonomy in the `From` impl below.

use record_store::RequestStatus;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Result type for marketplace operations
pub type Result<T> = std::result::Result<T, Error>;

/// One violated input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name
    pub field: &'static str,
    /// What is wrong with it
    pub reason: String,
}

impl FieldError {
    /// Create a field error
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Every violated field of one request, reported together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for err in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
            first = false;
        }
        Ok(())
    }
}

/// Marketplace errors
#[derive(Error, Debug)]
pub enum Error {
    /// Client input invalid; lists every violated field
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Entity absent
    #[error("{0} not found: {1}")]
    NotFound(&'static str, Uuid),

    /// Caller is not authorized for this operation
    #[error("Not authorized: {0}")]
    Forbidden(&'static str),

    /// Illegal state-machine transition attempted
    #[error("Request is not {expected}: current status is {actual}")]
    InvalidState {
        /// Status required for the transition
        expected: RequestStatus,
        /// Status actually stored
        actual: RequestStatus,
    },

    /// Buyer already has a pending request on this land
    #[error("A pending purchase request already exists for this buyer")]
    DuplicateRequest,

    /// Land is not listed for sale
    #[error("Land is not available for purchase")]
    NotForSale,

    /// User has no wallet reference bound
    #[error("User has no wallet reference")]
    MissingWallet,

    /// Record store failure (fatal; the operation did not complete)
    #[error("Record store failure: {0}")]
    Store(record_store::Error),
}

impl From<record_store::Error> for Error {
    fn from(err: record_store::Error) -> Self {
        match err {
            record_store::Error::DuplicatePending { .. } => Error::DuplicateRequest,
            record_store::Error::LandNotForSale(_) => Error::NotForSale,
            record_store::Error::StatusConflict { expected, actual } => {
                Error::InvalidState { expected, actual }
            }
            record_store::Error::LandNotFound(id) => Error::NotFound("Land", id),
            record_store::Error::UserNotFound(id) => Error::NotFound("User", id),
            record_store::Error::RequestNotFound(id) => Error::NotFound("Purchase request", id),
            record_store::Error::NotificationNotFound(id) => Error::NotFound("Notification", id),
            record_store::Error::DuplicateEmail(email) => Error::Validation(ValidationErrors(
                vec![FieldError::new("email", format!("already registered: {}", email))],
            )),
            record_store::Error::DuplicateWallet(wallet) => Error::Validation(ValidationErrors(
                vec![FieldError::new("wallet", format!("already registered: {}", wallet))],
            )),
            other => Error::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let land = Uuid::new_v4();
        let buyer = Uuid::new_v4();

        let err: Error = record_store::Error::DuplicatePending { land, buyer }.into();
        assert!(matches!(err, Error::DuplicateRequest));

        let err: Error = record_store::Error::StatusConflict {
            expected: RequestStatus::Pending,
            actual: RequestStatus::Rejected,
        }
        .into();
        assert!(matches!(
            err,
            Error::InvalidState {
                expected: RequestStatus::Pending,
                actual: RequestStatus::Rejected,
            }
        ));

        let err: Error = record_store::Error::LandNotFound(land).into();
        assert!(matches!(err, Error::NotFound("Land", id) if id == land));
    }

    #[test]
    fn test_validation_display_lists_all_fields() {
        let err = Error::Validation(ValidationErrors(vec![
            FieldError::new("size", "must be a positive number"),
            FieldError::new("price", "must be a positive number"),
        ]));
        let rendered = err.to_string();
        assert!(rendered.contains("size"));
        assert!(rendered.contains("price"));
    }
}
