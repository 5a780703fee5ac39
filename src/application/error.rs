use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::repos::SourceError, config::LoadError, domain::error::DomainError,
    infra::error::InfraError,
};

/// Flattened error chain, outermost message first.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut next = error.source();
        while let Some(inner) = next {
            messages.push(inner.to_string());
            next = inner.source();
        }
        Self { source, messages }
    }

    pub fn render(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("backend request failed")]
    Source(#[from] SourceError),
    #[error("configuration could not be loaded")]
    Config(#[from] LoadError),
    #[error("restaurant data load failed: {0}")]
    Load(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code for the binary, loosely following sysexits.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Domain(_) => 64,
            AppError::Source(SourceError::InvalidRequest(_)) => 64,
            AppError::Source(_) | AppError::Load(_) => 69,
            AppError::Config(_) | AppError::Infra(InfraError::MissingBaseUrl) => 78,
            AppError::Infra(InfraError::Io(_)) => 74,
            AppError::Infra(_) | AppError::Unexpected(_) => 70,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_walks_the_source_chain() {
        let err = AppError::from(SourceError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        });
        let report = err.report();
        assert_eq!(report.messages.len(), 2);
        assert_eq!(
            report.render(),
            "backend request failed: backend responded with status 502: bad gateway"
        );
    }

    #[test]
    fn validation_maps_to_usage_exit_code() {
        let err = AppError::from(DomainError::empty_id("record id"));
        assert_eq!(err.exit_code(), 64);
        assert_eq!(AppError::unexpected("boom").exit_code(), 70);
    }
}
