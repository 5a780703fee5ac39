use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("api.base_url must be set to reach the backend")]
    MissingBaseUrl,
    #[error("failed to build the api client")]
    Client(#[source] reqwest::Error),
    #[error("could not read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("tracing subscriber already installed: {0}")]
    Telemetry(String),
}
