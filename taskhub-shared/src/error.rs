/// Domain error taxonomy
///
/// Errors raised by the project and task operations once access has been
/// granted. Access failures themselves are
/// [`AuthzError`](crate::auth::authorization::AuthzError); storage failures
/// arrive wrapped as [`DomainError::Store`].
///
/// | Variant    | Meaning                                      | HTTP |
/// |------------|----------------------------------------------|------|
/// | `NotFound` | A referenced record does not exist           | 404  |
/// | `Conflict` | The request contradicts the current state    | 409  |
/// | `Invalid`  | A field value is unacceptable                | 422  |
/// | `Store`    | Storage failure                              | 500  |

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Rejected field value
    #[error("{field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        DomainError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        DomainError::Conflict(message.into())
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        DomainError::Invalid {
            field,
            message: message.into(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
