// SPDX-License-Identifier: MIT

//! Service-Roster sync check
//!
//! Headless diagnostic: loads configuration, performs a foreground reload
//! against the remote gateway, and reports the canonical collection sizes.
//! Exits non-zero when the reload fails.

use service_roster::config::Config;
use service_roster::sync::SyncController;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(gateway = %config.gateway_url, "Starting sync check");

    let controller = SyncController::from_config(&config);
    controller.reload(false).await?;

    let state = controller.snapshot().await;
    tracing::info!(
        volunteers = state.volunteers.len(),
        schedules = state.schedules.len(),
        instances = state.instances.len(),
        "Canonical state loaded"
    );
    Ok(())
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("service_roster=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .init();
}
