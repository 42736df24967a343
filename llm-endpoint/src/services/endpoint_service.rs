//! Thin HTTP client for a hosted text-generation endpoint.
//!
//! - `POST {invocation_url}` with `{"inputs", "parameters"}`: synchronous,
//!   non-streaming generation.
//!
//! The payload format lives in [`crate::content_handler`]; this module only
//! moves bytes, maps HTTP failures to [`EndpointError`] and retries transient
//! ones.
//!
//! # Examples
//!
//! ```no_run
//! use llm_endpoint::{DelimiterExtractor, EndpointConfig, EndpointService, GenerationParams};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = EndpointConfig {
//!     region: "us-east-1".into(),
//!     endpoint_name: "falcon-40b-instruct".into(),
//!     endpoint_url: Some("http://localhost:8080/generate".into()),
//!     timeout_secs: Some(30),
//!     max_retries: 2,
//!     params: GenerationParams::default(),
//! };
//!
//! let svc = EndpointService::new(cfg)?;
//! let answer = svc
//!     .invoke("Explain Rust ownership.\nSolution:", &DelimiterExtractor::new("Solution:"))
//!     .await?;
//! println!("{answer}");
//! # Ok(()) }
//! ```

use std::time::Instant;

use reqwest::header;
use tracing::{debug, error, info, instrument};

use crate::config::endpoint_config::EndpointConfig;
use crate::content_handler::{ACCEPTS, AnswerExtractor, CONTENT_TYPE, ContentHandler};
use crate::error_handler::{EndpointError, Result, make_snippet, validate_http_endpoint};
use crate::retry::{RetryConfig, with_retry};

/// Client for one endpoint.
///
/// Initialized with a full [`EndpointConfig`]. Reuses a single HTTP client
/// with the configured timeout.
#[derive(Debug)]
pub struct EndpointService {
    client: reqwest::Client,
    cfg: EndpointConfig,
    url: String,
    retry: RetryConfig,
}

impl EndpointService {
    /// Creates a new [`EndpointService`] from the given config.
    ///
    /// # Errors
    /// - [`crate::ConfigError::InvalidFormat`] if the invocation URL is not http/https
    /// - [`crate::ConfigError::OutOfRange`] / `InvalidStopSequence` for bad params
    /// - [`EndpointError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: EndpointConfig) -> Result<Self> {
        let url = cfg.invocation_url();
        validate_http_endpoint("FALCON_ENDPOINT_URL", &url)?;
        cfg.params.validate()?;

        let client = reqwest::Client::builder().timeout(cfg.timeout()).build()?;
        let retry = RetryConfig::with_max_retries(cfg.max_retries);

        info!(
            endpoint = %cfg.endpoint_name,
            region = %cfg.region,
            url = %url,
            timeout_secs = cfg.timeout().as_secs(),
            max_retries = cfg.max_retries,
            "EndpointService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url,
            retry,
        })
    }

    /// Replaces the backoff schedule (the retry count still comes from the config
    /// unless overridden here).
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sends `prompt`, then turns the response into an answer with `extractor`.
    ///
    /// Transient failures are retried; the request body is encoded once and
    /// resent unchanged.
    ///
    /// # Errors
    /// - [`EndpointError::HttpStatus`] for non-2xx responses (after retries)
    /// - [`EndpointError::HttpTransport`] / [`EndpointError::Timeout`] for transport failures
    /// - [`EndpointError::Format`] if the response cannot be decoded
    #[instrument(skip_all, fields(endpoint = %self.cfg.endpoint_name, prompt_len = prompt.len()))]
    pub async fn invoke(&self, prompt: &str, extractor: &dyn AnswerExtractor) -> Result<String> {
        let started = Instant::now();
        let body = ContentHandler::encode(prompt, &self.cfg.params)?;

        let this = self;
        let payload = body.as_slice();
        let raw = with_retry(&self.retry, move || this.invoke_once(payload)).await?;

        let answer = ContentHandler::decode(prompt, &raw, extractor).map_err(|e| {
            error!(
                error = %e,
                snippet = %make_snippet(&String::from_utf8_lossy(&raw)),
                "failed to decode endpoint response"
            );
            EndpointError::from(e)
        })?;

        info!(
            latency_ms = started.elapsed().as_millis() as u64,
            answer_len = answer.len(),
            "endpoint invocation completed"
        );
        Ok(answer)
    }

    async fn invoke_once(&self, body: &[u8]) -> Result<Vec<u8>> {
        debug!("POST {}", self.url);
        let resp = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, CONTENT_TYPE)
            .header(header::ACCEPT, ACCEPTS)
            .body(body.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EndpointError::Timeout(self.cfg.timeout())
                } else {
                    EndpointError::HttpTransport(e)
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(%status, url = %self.url, %snippet, "endpoint returned non-success status");
            return Err(EndpointError::HttpStatus {
                status,
                url: self.url.clone(),
                snippet,
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}
