//! Startup configuration for the chat CLI.

use chat_chain::ChainConfig;
use llm_endpoint::error_handler::{EnvSource, RequiredVars};
use llm_endpoint::{EndpointConfig, config_falcon};

use crate::error_handler::AppResult;

pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_KENDRA_INDEX_ID: &str = "KENDRA_INDEX_ID";
pub const ENV_FALCON_ENDPOINT: &str = "FALCON_ENDPOINT";

/// Everything the CLI needs before entering the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub endpoint: EndpointConfig,
    pub chain: ChainConfig,
}

impl AppConfig {
    /// Load and validate once at startup.
    ///
    /// All absent required variables are reported in a single error, before
    /// any optional one is looked at.
    pub fn from_env(env: &dyn EnvSource) -> AppResult<Self> {
        let mut required = RequiredVars::new(env);
        let region = required.take(ENV_REGION);
        let kendra_index_id = required.take(ENV_KENDRA_INDEX_ID);
        let endpoint_name = required.take(ENV_FALCON_ENDPOINT);
        required.finish()?;

        let endpoint = config_falcon(env, &region, &endpoint_name)?;
        let chain = ChainConfig::from_env(env, &region, &kendra_index_id)?;

        Ok(Self { endpoint, chain })
    }
}
