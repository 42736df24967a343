use std::time::Duration;

use crate::config::generation_params::GenerationParams;

/// Default request timeout when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Configuration for invoking a hosted text-generation endpoint.
///
/// # Fields
///
/// - `region`: cloud region the endpoint lives in (e.g., `"us-east-1"`).
/// - `endpoint_name`: name of the deployed inference endpoint.
/// - `endpoint_url`: explicit invocation URL; overrides the URL derived from
///   `region` + `endpoint_name` (useful for a signing proxy or a local server).
/// - `timeout_secs`: optional per-request timeout in seconds.
/// - `max_retries`: retries after the first attempt for transient failures.
/// - `params`: generation parameters sent with every request.
///
/// # Examples
///
/// ```
/// use llm_endpoint::{EndpointConfig, GenerationParams};
///
/// let cfg = EndpointConfig {
///     region: "us-east-1".to_string(),
///     endpoint_name: "falcon-40b-instruct".to_string(),
///     endpoint_url: None,
///     timeout_secs: Some(30),
///     max_retries: 2,
///     params: GenerationParams::default(),
/// };
/// assert!(cfg.invocation_url().ends_with("/endpoints/falcon-40b-instruct/invocations"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointConfig {
    /// Region identifier.
    pub region: String,

    /// Remote endpoint identifier.
    pub endpoint_name: String,

    /// Explicit invocation URL (takes precedence over the derived one).
    pub endpoint_url: Option<String>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,

    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Generation parameters.
    pub params: GenerationParams,
}

impl EndpointConfig {
    /// URL the payload is POSTed to.
    pub fn invocation_url(&self) -> String {
        match &self.endpoint_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!(
                "https://runtime.sagemaker.{}.amazonaws.com/endpoints/{}/invocations",
                self.region, self.endpoint_name
            ),
        }
    }

    /// Effective request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}
