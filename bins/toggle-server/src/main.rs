//! toggle-server — serves the shared toggle and blob endpoints.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::AppState;
use common::config::AppConfig;
use toggle::ToggleController;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/config.toml".to_string());

    let config = AppConfig::load(Path::new(&config_path))
        .with_context(|| format!("Failed to load {}", config_path))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .init();

    info!("=== Toggle Server Starting ===");

    let store = store::open(&config.storage).context("Failed to open store")?;
    info!("Store: {:?}", config.storage.backend);

    let policy = config.toggle.policy;
    if !policy.is_strict() {
        warn!("legacy_coerce policy accepts unvalidated writes without conflict detection");
    }
    info!("Concurrency policy: {}", policy.name());

    let controller = ToggleController::new(store.clone(), policy, &config.toggle.system_client_id);

    if config.toggle.seed_on_start {
        let seeded = controller.seed().context("Failed to seed toggle record")?;
        if !seeded {
            info!("Toggle record already present, not seeding");
        }
    }

    let state = AppState {
        controller: Arc::new(controller),
        store,
    };
    api::serve(&config.server.bind_addr, state).await?;

    info!("=== Toggle Server Stopped ===");
    Ok(())
}
