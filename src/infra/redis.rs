//! Cache backend initialization.

use tracing::info;

use crate::cache::RedisCacheClient;
use crate::config::RedisSettings;

use super::error::InfraError;

/// Connect to the configured cache backend: one address means a single node,
/// several mean a cluster (mirroring how the deployment lists its seeds).
pub async fn connect(settings: &RedisSettings) -> Result<RedisCacheClient, InfraError> {
    let urls = settings.urls();
    if urls.is_empty() {
        return Err(InfraError::configuration("no redis address configured"));
    }

    if urls.len() == 1 {
        let client = RedisCacheClient::connect_single(&urls[0])
            .await
            .map_err(|err| InfraError::cache(err.to_string()))?;
        info!(addr = %urls[0], "redis single-node client initialized");
        Ok(client)
    } else {
        let client = RedisCacheClient::connect_cluster(urls.clone())
            .await
            .map_err(|err| InfraError::cache(err.to_string()))?;
        info!(nodes = urls.len(), "redis cluster client initialized");
        Ok(client)
    }
}
