use thiserror::Error;

/// Rejected input, detected before anything reaches the backend.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("no restaurant selected; pass --restaurant or set session.restaurant_id")]
    NoRestaurantSelected,
    #[error("{field} must not be empty")]
    EmptyId { field: &'static str },
    #[error("unknown resource `{0}`")]
    UnknownResource(String),
    #[error("invalid record body: {0}")]
    InvalidBody(String),
}

impl DomainError {
    pub fn empty_id(field: &'static str) -> Self {
        Self::EmptyId { field }
    }

    pub fn invalid_body(reason: impl std::fmt::Display) -> Self {
        Self::InvalidBody(reason.to_string())
    }
}
