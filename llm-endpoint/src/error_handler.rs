//! Unified error handling for `llm-endpoint`.
//!
//! This module exposes a single top-level error type [`EndpointError`] for the
//! whole library, and groups domain-specific errors in nested enums
//! ([`ConfigError`], [`FormatError`]). Small helpers for reading/validating
//! environment variables are provided and return the unified [`Result<T>`] alias.
//!
//! All messages include the prefix `[LLM Endpoint]` to simplify attribution in logs.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, EndpointError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `llm-endpoint` crate.
///
/// Variants wrap domain-specific enums (config/format) and the transport-level
/// failures of a single invocation.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EndpointError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The endpoint answered, but the payload was not what the adapter expects.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Upstream returned a non-successful HTTP status.
    #[error("[LLM Endpoint] HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: StatusCode,
        /// Request URL.
        url: String,
        /// Short snippet of the response body (trimmed).
        snippet: String,
    },

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[LLM Endpoint] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Operation exceeded the configured timeout.
    #[error("[LLM Endpoint] operation timed out after {0:?}")]
    Timeout(Duration),

    /// Request payload could not be serialized.
    #[error("[LLM Endpoint] failed to encode request payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl EndpointError {
    /// Whether a retry has a realistic chance of succeeding.
    ///
    /// Transport failures, timeouts, throttling (429) and server errors (5xx)
    /// are transient. Config, format, encode errors and other 4xx are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            EndpointError::HttpTransport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            EndpointError::Timeout(_) => true,
            EndpointError::HttpStatus { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
///
/// Only errors that realistically happen at config load/validation time.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Several required variables are missing; all of them are listed.
    #[error("[LLM Endpoint] missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<&'static str>),

    /// A number failed to parse (like limits, timeouts).
    #[error("[LLM Endpoint] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `LLM_MAX_NEW_TOKENS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Value had the wrong format (e.g., invalid URL, not a boolean).
    #[error("[LLM Endpoint] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `FALCON_ENDPOINT_URL`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[LLM Endpoint] {field} is out of range: expected {min}..={max}, got {value}")]
    OutOfRange {
        /// Field name (e.g., `temperature`).
        field: &'static str,
        /// Offending value.
        value: f32,
        /// Inclusive lower bound.
        min: f32,
        /// Inclusive upper bound.
        max: f32,
    },

    /// Stop sequences contained one or more empty strings.
    #[error("[LLM Endpoint] stop sequences must not contain empty strings")]
    InvalidStopSequence,
}

/* ------------------------------------------------------------------------- */
/* Format errors                                                             */
/* ------------------------------------------------------------------------- */

/// The endpoint response could not be turned into an answer.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    /// Response body is not valid JSON.
    #[error("[LLM Endpoint] response is not valid JSON: {0}")]
    InvalidJson(String),

    /// Response JSON has an unexpected top-level shape.
    #[error("[LLM Endpoint] unexpected response shape: {0}")]
    UnexpectedShape(&'static str),

    /// Response array was empty.
    #[error("[LLM Endpoint] response contained no generations")]
    EmptyResponse,

    /// First generation had no `generated_text` string.
    #[error("[LLM Endpoint] response is missing `generated_text`")]
    MissingGeneratedText,

    /// Generated text did not contain the answer delimiter.
    #[error("[LLM Endpoint] answer delimiter {delimiter:?} not found in model output")]
    MissingDelimiter {
        /// The delimiter that was searched for.
        delimiter: String,
    },
}

/* ------------------------------------------------------------------------- */
/* Env sources                                                               */
/* ------------------------------------------------------------------------- */

/// Where configuration values come from.
///
/// The process environment in production, a plain map in tests.
pub trait EnvSource {
    /// Raw value of `name`, if set.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads from `std::env`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Non-empty value of `name` (trimmed), or `None`.
fn non_empty(env: &dyn EnvSource, name: &str) -> Option<String> {
    env.var(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Optional non-empty string (`None` if unset/empty).
pub fn env_opt_string(env: &dyn EnvSource, name: &'static str) -> Option<String> {
    non_empty(env, name)
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a
/// valid `u32`.
pub fn env_opt_u32(env: &dyn EnvSource, name: &'static str) -> Result<Option<u32>> {
    parse_opt(env, name, "expected u32")
}

/// Parses an optional `u64` from env (`Ok(None)` if unset/empty).
pub fn env_opt_u64(env: &dyn EnvSource, name: &'static str) -> Result<Option<u64>> {
    parse_opt(env, name, "expected u64")
}

/// Parses an optional `usize` from env (`Ok(None)` if unset/empty).
pub fn env_opt_usize(env: &dyn EnvSource, name: &'static str) -> Result<Option<usize>> {
    parse_opt(env, name, "expected unsigned integer")
}

/// Parses an optional `f32` from env (`Ok(None)` if unset/empty).
pub fn env_opt_f32(env: &dyn EnvSource, name: &'static str) -> Result<Option<f32>> {
    parse_opt(env, name, "expected floating-point number")
}

/// Parses a boolean flag (`true/false/1/0/yes/no/on/off`), falling back to `default`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] for any other value.
pub fn env_bool(env: &dyn EnvSource, name: &'static str, default: bool) -> Result<bool> {
    match non_empty(env, name).map(|v| v.to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidFormat {
                var: name,
                reason: "expected a boolean (true/false)",
            }
            .into()),
        },
    }
}

fn parse_opt<T: std::str::FromStr>(
    env: &dyn EnvSource,
    name: &'static str,
    reason: &'static str,
) -> Result<Option<T>> {
    match non_empty(env, name) {
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var: name, reason }.into()),
        None => Ok(None),
    }
}

/// Collects required variables and reports every missing one at once.
///
/// # Example
/// ```
/// use std::collections::HashMap;
/// use llm_endpoint::error_handler::RequiredVars;
///
/// let env: HashMap<String, String> = HashMap::new();
/// let mut req = RequiredVars::new(&env);
/// let _region = req.take("AWS_REGION");
/// let _index = req.take("KENDRA_INDEX_ID");
/// assert!(req.finish().is_err());
/// ```
pub struct RequiredVars<'a> {
    env: &'a dyn EnvSource,
    missing: Vec<&'static str>,
}

impl<'a> RequiredVars<'a> {
    pub fn new(env: &'a dyn EnvSource) -> Self {
        Self {
            env,
            missing: Vec::new(),
        }
    }

    /// Returns the trimmed value, or an empty string after recording `name` as missing.
    pub fn take(&mut self, name: &'static str) -> String {
        match non_empty(self.env, name) {
            Some(v) => v,
            None => {
                self.missing.push(name);
                String::new()
            }
        }
    }

    /// # Errors
    /// [`ConfigError::MissingVars`] listing every variable passed to
    /// [`RequiredVars::take`] that was absent.
    pub fn finish(self) -> Result<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingVars(self.missing).into())
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers (return unified `Result<T>`)                           */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the string does not start with
/// a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Validates that a floating-point value lies within an inclusive range.
///
/// Used for `temperature` (`0.0..=2.0`) and `top_p` (`0.0..=1.0`).
///
/// # Errors
/// Returns [`ConfigError::OutOfRange`] if `value` is outside `[min, max]` or
/// not finite.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        }
        .into())
    }
}

/// Ensures that a list of stop sequences contains no empty strings.
///
/// # Errors
/// Returns [`ConfigError::InvalidStopSequence`] if any element is empty.
pub fn validate_stop_sequences<S>(stops: &[S]) -> Result<()>
where
    S: AsRef<str>,
{
    if stops.iter().any(|s| s.as_ref().is_empty()) {
        Err(ConfigError::InvalidStopSequence.into())
    } else {
        Ok(())
    }
}

/// Short, single-line snippet of a response body for error messages.
pub fn make_snippet(text: &str) -> String {
    text.trim()
        .chars()
        .take(240)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}
