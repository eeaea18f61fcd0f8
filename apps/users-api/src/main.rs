use axum_helpers::server::{create_production_app, create_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        environment = ?config.environment,
        database = config.mongodb.database_name(),
        "Starting {} v{}",
        config.app.name,
        config.app.version
    );

    let mongo_client =
        database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;
    let db = mongo_client.database(config.mongodb.database_name());

    api::users::init_indexes(&db).await?;

    let state = AppState {
        config,
        mongo_client,
        db,
    };

    let router = create_router::<openapi::ApiDoc>(
        api::routes(&state),
        api::root::router(state.config.app),
        &state.config.server,
        state.config.environment,
    )?;

    info!("Starting Users API with graceful shutdown (30s timeout)");

    let client = state.mongo_client.clone();
    create_production_app(router, &state.config.server, Duration::from_secs(30), async move {
        info!("Shutting down: closing MongoDB connections");
        client.shutdown().await;
        info!("MongoDB connection closed successfully");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Users API shutdown complete");
    Ok(())
}
