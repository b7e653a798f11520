// ── Process-wide fleet coordinator ──
//
// One `Fleet` per process owns the Central client, the token store
// behind it and the inventory cache. Sessions hold cheap clones, so all
// of them share a single remote view and a single refresh schedule.

use std::sync::Arc;

use fleetscan_api::CentralClient;

use crate::config::RemediationConfig;
use crate::error::CoreError;
use crate::store::InventoryCache;

/// Cheaply cloneable handle to the shared remote-fleet state.
#[derive(Clone)]
pub struct Fleet {
    inner: Arc<FleetInner>,
}

struct FleetInner {
    client: CentralClient,
    inventory: InventoryCache,
    config: RemediationConfig,
}

impl Fleet {
    pub fn new(client: CentralClient, config: RemediationConfig) -> Self {
        let inventory = InventoryCache::new(client.clone(), config.page_size);
        Self {
            inner: Arc::new(FleetInner {
                client,
                inventory,
                config,
            }),
        }
    }

    pub fn client(&self) -> &CentralClient {
        &self.inner.client
    }

    pub fn inventory(&self) -> &InventoryCache {
        &self.inner.inventory
    }

    pub fn config(&self) -> &RemediationConfig {
        &self.inner.config
    }

    /// Refresh every monitoring partition.
    pub async fn refresh_all(&self) -> Result<(), CoreError> {
        self.inner.inventory.refresh_all().await
    }
}
