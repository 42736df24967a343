//! Endpoint config loaded from environment variables.
//!
//! The required identifiers (region, endpoint name) are resolved by the caller
//! together with its other required settings so that every missing variable is
//! reported at once. This module fills in the optional knobs.
//!
//! # Environment variables
//!
//! - `FALCON_ENDPOINT_URL`   = explicit invocation URL (optional, http/https)
//! - `ENDPOINT_TIMEOUT_SECS` = request timeout (u64, default 60)
//! - `ENDPOINT_MAX_RETRIES`  = retries after the first attempt (u32, default 2)
//! - `LLM_TEMPERATURE`       = sampling temperature (f32, `0.0..=2.0`)
//! - `LLM_TOP_P`             = nucleus threshold (f32, `0.0..=1.0`)
//! - `LLM_MAX_NEW_TOKENS`    = generation budget (u32)

use crate::{
    config::{
        endpoint_config::{DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS, EndpointConfig},
        generation_params::GenerationParams,
    },
    error_handler::{
        EndpointError, EnvSource, env_opt_f32, env_opt_string, env_opt_u32, env_opt_u64,
        validate_http_endpoint,
    },
};

pub const ENV_ENDPOINT_URL: &str = "FALCON_ENDPOINT_URL";
pub const ENV_TIMEOUT_SECS: &str = "ENDPOINT_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "ENDPOINT_MAX_RETRIES";
pub const ENV_TEMPERATURE: &str = "LLM_TEMPERATURE";
pub const ENV_TOP_P: &str = "LLM_TOP_P";
pub const ENV_MAX_NEW_TOKENS: &str = "LLM_MAX_NEW_TOKENS";

/// Constructs the config for the Falcon-style instruct endpoint.
///
/// # Defaults
/// - generation params from [`GenerationParams::default`]
/// - `timeout_secs = Some(60)`
/// - `max_retries = 2`
///
/// # Errors
///
/// - [`crate::ConfigError::InvalidFormat`] if `FALCON_ENDPOINT_URL` is not http/https
/// - [`crate::ConfigError::InvalidNumber`] for unparsable numbers
/// - [`crate::ConfigError::OutOfRange`] for out-of-range sampling knobs
pub fn config_falcon(
    env: &dyn EnvSource,
    region: &str,
    endpoint_name: &str,
) -> Result<EndpointConfig, EndpointError> {
    let endpoint_url = env_opt_string(env, ENV_ENDPOINT_URL);
    if let Some(url) = &endpoint_url {
        validate_http_endpoint(ENV_ENDPOINT_URL, url)?;
    }

    let mut params = GenerationParams::default();
    if let Some(t) = env_opt_f32(env, ENV_TEMPERATURE)? {
        params.temperature = t;
    }
    if let Some(p) = env_opt_f32(env, ENV_TOP_P)? {
        params.top_p = p;
    }
    if let Some(n) = env_opt_u32(env, ENV_MAX_NEW_TOKENS)? {
        params.max_new_tokens = n;
    }
    params.validate()?;

    Ok(EndpointConfig {
        region: region.to_string(),
        endpoint_name: endpoint_name.to_string(),
        endpoint_url,
        timeout_secs: Some(env_opt_u64(env, ENV_TIMEOUT_SECS)?.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        max_retries: env_opt_u32(env, ENV_MAX_RETRIES)?.unwrap_or(DEFAULT_MAX_RETRIES),
        params,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error_handler::ConfigError;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_only_required_are_given() {
        let cfg = config_falcon(&env(&[]), "us-east-1", "falcon").unwrap();
        assert_eq!(cfg.region, "us-east-1");
        assert_eq!(cfg.endpoint_name, "falcon");
        assert_eq!(cfg.endpoint_url, None);
        assert_eq!(cfg.timeout_secs, Some(60));
        assert_eq!(cfg.max_retries, 2);
        assert_eq!(cfg.params, GenerationParams::default());
    }

    #[test]
    fn overrides_are_applied() {
        let e = env(&[
            (ENV_ENDPOINT_URL, "http://localhost:8080"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_MAX_RETRIES, "0"),
            (ENV_TEMPERATURE, "0.7"),
            (ENV_MAX_NEW_TOKENS, "128"),
        ]);
        let cfg = config_falcon(&e, "us-east-1", "falcon").unwrap();
        assert_eq!(cfg.endpoint_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(cfg.timeout_secs, Some(5));
        assert_eq!(cfg.max_retries, 0);
        assert_eq!(cfg.params.temperature, 0.7);
        assert_eq!(cfg.params.max_new_tokens, 128);
    }

    #[test]
    fn rejects_bad_url_and_range() {
        let bad_url = env(&[(ENV_ENDPOINT_URL, "localhost:8080")]);
        assert!(matches!(
            config_falcon(&bad_url, "r", "e"),
            Err(EndpointError::Config(ConfigError::InvalidFormat { .. }))
        ));

        let bad_top_p = env(&[(ENV_TOP_P, "1.5")]);
        assert!(matches!(
            config_falcon(&bad_top_p, "r", "e"),
            Err(EndpointError::Config(ConfigError::OutOfRange { field: "top_p", .. }))
        ));
    }
}
