use thiserror::Error;

/// A create/update payload that breaks the field contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be a number, got {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{0} must be a finite number")]
    NotFinite(&'static str),

    #[error("{0} cannot be negative")]
    Negative(&'static str),

    #[error("unknown {field}: {value}")]
    UnknownVariant { field: &'static str, value: String },
}

/// Failure of a call to the resource store or role source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The store answered with an error message meant for the user.
    #[error("{0}")]
    Rejected(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("you do not have permission to {0}")]
    Forbidden(&'static str),

    #[error(transparent)]
    Invalid(#[from] FieldError),

    #[error("operation cancelled")]
    Cancelled,
}
