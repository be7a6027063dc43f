//! Drowsiness detection demo entry point

use anyhow::Context;
use api::{init_logging, run_server, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    init_logging(&settings.logging).context("failed to initialize logging")?;

    info!("=== Driver Drowsiness Detection v{} ===", env!("CARGO_PKG_VERSION"));
    info!(cascade_dir = %settings.detector.cascade_dir.display(), "Loading cascades");

    run_server(settings).await.context("server failed")?;

    Ok(())
}
