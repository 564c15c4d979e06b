use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use form_runner::{ChromeSession, ScenarioConfig, ScenarioRunner};

#[tokio::main]
async fn main() -> form_runner::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("form-runner v{}", env!("CARGO_PKG_VERSION"));

    let session = ChromeSession::builder().launch().await?;
    ScenarioRunner::new(ScenarioConfig::default())
        .run_and_release(session)
        .await
}
