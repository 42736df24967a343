//! Runtime configuration loaded from environment variables.

use llm_endpoint::error_handler::{
    EnvSource, env_bool, env_opt_string, env_opt_u64, env_opt_usize, validate_http_endpoint,
};

use crate::api_types::ChainOptions;
use crate::error::ChainError;
use crate::session::DEFAULT_MAX_HISTORY;

pub const ENV_KENDRA_URL: &str = "KENDRA_ENDPOINT_URL";
pub const ENV_KENDRA_TOP_K: &str = "KENDRA_TOP_K";
pub const ENV_KENDRA_TIMEOUT_SECS: &str = "KENDRA_TIMEOUT_SECS";
pub const ENV_MAX_HISTORY: &str = "MAX_HISTORY_LENGTH";
pub const ENV_MAX_CTX_CHARS: &str = "MAX_CTX_CHARS";
pub const ENV_CONDENSE: &str = "CONDENSE_QUESTION";

/// Config bag for retrieval and the conversational chain.
///
/// The required identifiers are passed in by the caller; everything else has
/// a default.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainConfig {
    // Retrieval index
    pub region: String,
    pub kendra_index_id: String,
    pub kendra_url: Option<String>,
    pub top_k: usize,
    pub retrieval_timeout_secs: u64,

    // Conversation
    pub max_history: usize,
    pub max_ctx_chars: usize,
    pub condense_question: bool,
}

impl ChainConfig {
    /// Defaults for everything but the identifiers.
    ///
    /// # Example
    /// ```
    /// use chat_chain::ChainConfig;
    /// let cfg = ChainConfig::new("us-east-1", "idx-123");
    /// assert_eq!(cfg.top_k, 3);
    /// assert_eq!(cfg.max_history, 5);
    /// ```
    pub fn new(region: impl Into<String>, kendra_index_id: impl Into<String>) -> Self {
        let opts = ChainOptions::default();
        Self {
            region: region.into(),
            kendra_index_id: kendra_index_id.into(),
            kendra_url: None,
            top_k: 3,
            retrieval_timeout_secs: 30,
            max_history: DEFAULT_MAX_HISTORY,
            max_ctx_chars: opts.max_ctx_chars,
            condense_question: opts.condense_question,
        }
    }

    /// Build from environment variables with defaults.
    ///
    /// # Errors
    /// `ChainError::Config` for malformed numbers, booleans or URLs.
    pub fn from_env(
        env: &dyn EnvSource,
        region: &str,
        kendra_index_id: &str,
    ) -> Result<Self, ChainError> {
        let mut cfg = Self::new(region, kendra_index_id);

        cfg.kendra_url = env_opt_string(env, ENV_KENDRA_URL);
        if let Some(url) = &cfg.kendra_url {
            validate_http_endpoint(ENV_KENDRA_URL, url)?;
        }
        if let Some(k) = env_opt_usize(env, ENV_KENDRA_TOP_K)? {
            cfg.top_k = k.max(1);
        }
        if let Some(t) = env_opt_u64(env, ENV_KENDRA_TIMEOUT_SECS)? {
            cfg.retrieval_timeout_secs = t;
        }
        if let Some(n) = env_opt_usize(env, ENV_MAX_HISTORY)? {
            cfg.max_history = n.max(1);
        }
        if let Some(n) = env_opt_usize(env, ENV_MAX_CTX_CHARS)? {
            cfg.max_ctx_chars = n;
        }
        cfg.condense_question = env_bool(env, ENV_CONDENSE, cfg.condense_question)?;

        Ok(cfg)
    }

    /// URL of the index query API.
    pub fn kendra_query_url(&self) -> String {
        match &self.kendra_url {
            Some(url) => url.clone(),
            None => format!("https://kendra.{}.amazonaws.com/", self.region),
        }
    }

    pub fn options(&self) -> ChainOptions {
        ChainOptions {
            max_ctx_chars: self.max_ctx_chars,
            condense_question: self.condense_question,
        }
    }
}
