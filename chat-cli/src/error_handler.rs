use chat_chain::ChainError;
use llm_endpoint::{ConfigError, EndpointError};
use thiserror::Error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Endpoint(EndpointError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    // --- Terminal ---
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Startup problems the user fixes in the environment, not at the prompt.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            AppError::Config(_) | AppError::Chain(ChainError::Config(_))
        )
    }
}

/// Handy result alias used across the CLI.
pub type AppResult<T> = Result<T, AppError>;

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<EndpointError> for AppError {
    fn from(err: EndpointError) -> Self {
        match err {
            EndpointError::Config(c) => AppError::Config(c),
            other => AppError::Endpoint(other),
        }
    }
}
