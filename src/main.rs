//! tally: data layer and service for a production-line monitoring dashboard.
//!
//! Run with:  `RUST_LOG=info tally [CONFIG] [--check]`

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging. RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut check_only = false;
    let mut config_path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--check" => check_only = true,
            _ => config_path = Some(PathBuf::from(arg)),
        }
    }
    let config_path = config_path.unwrap_or_else(tally_runtime::default_path);

    if check_only {
        return tally_runtime::check_config(&config_path).map_err(Into::into);
    }

    tracing::info!("tally v{} starting", env!("CARGO_PKG_VERSION"));

    tally_runtime::run(config_path).await.map_err(Into::into)
}
