use std::error::Error;

use tracing::Level;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file when present.
    // A missing file is fine; the process environment may hold everything.
    dotenvy::dotenv().ok();

    // RUST_LOG wins; otherwise only warnings, all on stderr.
    llm_endpoint::telemetry::init("warn", Level::WARN)?;

    chat_cli::start().await?;

    Ok(())
}
