use std::io::{self, IsTerminal};

pub mod chat_loop;
pub mod config;
pub mod error_handler;
mod output;

use chat_chain::build_chain;
use llm_endpoint::{EndpointService, ProcessEnv};
use tokio::io::BufReader;
use tracing::info;

use crate::chat_loop::ChatLoop;
use crate::config::AppConfig;
use crate::error_handler::AppResult;

/// Loads configuration, wires the chain and runs the loop on stdin/stdout.
///
/// # Errors
/// Startup failures are reported as [`error_handler::AppError::Config`] or
/// [`error_handler::AppError::Endpoint`]; afterwards only terminal I/O errors
/// end the session.
pub async fn start() -> AppResult<()> {
    // Fails before the loop when required variables are missing
    let cfg = AppConfig::from_env(&ProcessEnv)?;
    info!(
        region = %cfg.chain.region,
        index = %cfg.chain.kendra_index_id,
        endpoint = %cfg.endpoint.endpoint_name,
        "configuration loaded"
    );

    let endpoint = EndpointService::new(cfg.endpoint.clone())?;
    let chain = build_chain(&cfg.chain, endpoint)?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();

    ChatLoop::new(&chain, cfg.chain.max_history)
        .with_spinner(io::stderr().is_terminal())
        .run(stdin, &mut stdout)
        .await?;

    Ok(())
}
