use mongodb::bson::doc;
use mongodb::{Client, options::ClientOptions};
use std::time::Duration;
use tracing::{info, instrument};

use super::MongoConfig;
use crate::common::{DatabaseError, DatabaseResult, RetryConfig, retry, retry_with_backoff};

/// Send `ping` to the admin database.
pub(crate) async fn ping(client: &Client) -> Result<(), mongodb::error::Error> {
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map(|_| ())
}

/// Connect with the pool defaults of [`MongoConfig`] and verify with a ping.
pub async fn connect(url: &str) -> DatabaseResult<Client> {
    connect_from_config(&MongoConfig::new(url)).await
}

/// Build a client from `config` and verify it with a ping.
#[instrument(skip_all, fields(database = %config.database))]
pub async fn connect_from_config(config: &MongoConfig) -> DatabaseResult<Client> {
    info!("Connecting to MongoDB");

    let mut options = ClientOptions::parse(&config.url).await?;
    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));
    if let Some(ref app_name) = config.app_name {
        options.app_name = Some(app_name.clone());
    }

    let client = Client::with_options(options)?;
    ping(&client)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!("Connected to MongoDB");
    Ok(client)
}

/// [`connect`] with exponential backoff; `None` uses the default policy.
pub async fn connect_with_retry(
    url: &str,
    retry_config: Option<RetryConfig>,
) -> DatabaseResult<Client> {
    match retry_config {
        Some(config) => retry_with_backoff(|| connect(url), config).await,
        None => retry(|| connect(url)).await,
    }
}

/// [`connect_from_config`] with exponential backoff.
pub async fn connect_from_config_with_retry(
    config: &MongoConfig,
    retry_config: Option<RetryConfig>,
) -> DatabaseResult<Client> {
    match retry_config {
        Some(policy) => retry_with_backoff(|| connect_from_config(config), policy).await,
        None => retry(|| connect_from_config(config)).await,
    }
}
