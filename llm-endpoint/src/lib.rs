//! Adapter for a hosted text-generation endpoint.
//!
//! - [`content_handler`]: prompt → JSON payload, raw response → answer text,
//!   with a pluggable [`AnswerExtractor`].
//! - [`services::endpoint_service`]: HTTP invocation with timeout and retries.
//! - [`config`]: endpoint identity and generation parameters, read from env.
//! - [`error_handler`]: unified errors plus env/validation helpers.
//! - [`telemetry`]: tracing layer shared by the workspace.

pub mod config;
pub mod content_handler;
pub mod error_handler;
pub mod retry;
pub mod services;
pub mod telemetry;

pub use config::default_config::config_falcon;
pub use config::endpoint_config::EndpointConfig;
pub use config::generation_params::GenerationParams;
pub use content_handler::{AnswerExtractor, ContentHandler, DelimiterExtractor, FullTextExtractor};
pub use error_handler::{ConfigError, EndpointError, EnvSource, FormatError, ProcessEnv};
pub use retry::RetryConfig;
pub use services::endpoint_service::EndpointService;
