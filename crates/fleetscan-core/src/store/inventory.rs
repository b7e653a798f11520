// ── Inventory cache ──
//
// One serial-keyed map holds every monitored device; the `kind` on each
// device says which partition it belongs to. Refreshing a partition
// sweeps its listing into a fresh map and swaps it in, dropping every
// device of that partition the listing no longer returns. Readers load
// the current snapshot without locking and never see a half-built one.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use fleetscan_api::CentralClient;
use fleetscan_api::models::{InventoryDevice, MonitoredDevice, SkuType};
use tokio::sync::watch;
use tracing::{debug, info};

use super::gate::RefreshGate;
use crate::error::CoreError;
use crate::model::{Device, DeviceKind, Partition};

type DeviceMap = HashMap<String, Arc<Device>>;

/// Licensing view of a device from the platform inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub device_type: Option<String>,
    pub services: Vec<String>,
}

struct Gates {
    gateway: RefreshGate,
    switch: RefreshGate,
    ap: RefreshGate,
    subscriptions: RefreshGate,
}

/// Process-wide cache of the monitored fleet.
pub struct InventoryCache {
    client: CentralClient,
    page_size: u32,
    devices: ArcSwap<DeviceMap>,
    subscriptions: ArcSwap<HashMap<String, Subscription>>,
    gates: Gates,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl InventoryCache {
    pub fn new(client: CentralClient, page_size: u32) -> Self {
        let (last_refresh, _) = watch::channel(None);
        Self {
            client,
            page_size,
            devices: ArcSwap::from_pointee(HashMap::new()),
            subscriptions: ArcSwap::from_pointee(HashMap::new()),
            gates: Gates {
                gateway: RefreshGate::new(),
                switch: RefreshGate::new(),
                ap: RefreshGate::new(),
                subscriptions: RefreshGate::new(),
            },
            last_refresh,
        }
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Pure cache check across all three partitions.
    pub fn is_present(&self, serial: &str) -> bool {
        self.devices.load().contains_key(serial)
    }

    pub fn lookup(&self, serial: &str) -> Option<Arc<Device>> {
        self.devices.load().get(serial).cloned()
    }

    pub fn kind_of(&self, serial: &str) -> Option<DeviceKind> {
        self.devices.load().get(serial).map(|d| d.kind)
    }

    /// Subscription services attached to `serial`.
    ///
    /// Services reported by the monitoring listing win; otherwise the
    /// platform inventory index is consulted.
    pub fn services_of(&self, serial: &str) -> Vec<String> {
        if let Some(device) = self.lookup(serial) {
            if !device.services.is_empty() {
                return device.services.iter().cloned().collect();
            }
        }
        self.subscriptions
            .load()
            .get(serial)
            .map(|s| s.services.clone())
            .unwrap_or_default()
    }

    /// Number of cached devices in `partition`.
    pub fn count(&self, partition: Partition) -> usize {
        self.devices
            .load()
            .values()
            .filter(|d| d.partition() == partition)
            .count()
    }

    /// Completion time of the most recent partition refresh.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    // ── Refresh ──────────────────────────────────────────────────────

    pub async fn refresh_gateways(&self) -> Result<(), CoreError> {
        self.refresh(Partition::Gateway).await
    }

    pub async fn refresh_switches(&self) -> Result<(), CoreError> {
        self.refresh(Partition::Switch).await
    }

    pub async fn refresh_aps(&self) -> Result<(), CoreError> {
        self.refresh(Partition::AccessPoint).await
    }

    /// Refresh all three partitions concurrently.
    pub async fn refresh_all(&self) -> Result<(), CoreError> {
        tokio::try_join!(
            self.refresh_gateways(),
            self.refresh_switches(),
            self.refresh_aps(),
        )?;
        Ok(())
    }

    /// Replace one partition with a fresh sweep of its listing.
    ///
    /// A caller that arrives while the same partition is already being
    /// refreshed waits for that sweep instead of starting another.
    pub async fn refresh(&self, partition: Partition) -> Result<(), CoreError> {
        let gate = match partition {
            Partition::Gateway => &self.gates.gateway,
            Partition::Switch => &self.gates.switch,
            Partition::AccessPoint => &self.gates.ap,
        };
        let ran = gate.run(|| self.sweep(partition)).await?;
        if !ran {
            debug!(%partition, "joined a concurrent refresh");
        }
        Ok(())
    }

    /// Rebuild the platform-inventory subscription index.
    pub async fn refresh_subscriptions(&self) -> Result<(), CoreError> {
        self.gates
            .subscriptions
            .run(|| async {
                let client = &self.client;
                let records: Vec<InventoryDevice> =
                    CentralClient::paginate_all(self.page_size, |offset, limit| {
                        client.list_inventory(SkuType::All, offset, limit)
                    })
                    .await?;

                let index: HashMap<String, Subscription> = records
                    .into_iter()
                    .map(|d| {
                        (
                            d.serial,
                            Subscription {
                                device_type: d.device_type,
                                services: d.services,
                            },
                        )
                    })
                    .collect();
                info!(devices = index.len(), "subscription index refreshed");
                self.subscriptions.store(Arc::new(index));
                Ok::<(), CoreError>(())
            })
            .await?;
        Ok(())
    }

    async fn sweep(&self, partition: Partition) -> Result<(), CoreError> {
        let client = &self.client;
        let limit = self.page_size;
        let records: Vec<MonitoredDevice> = match partition {
            Partition::Gateway => {
                CentralClient::paginate_all(limit, |o, l| client.list_gateways(o, l)).await?
            }
            Partition::Switch => {
                CentralClient::paginate_all(limit, |o, l| client.list_switches(o, l)).await?
            }
            Partition::AccessPoint => {
                CentralClient::paginate_all(limit, |o, l| client.list_aps(o, l)).await?
            }
        };

        let fresh: DeviceMap = records
            .into_iter()
            .map(|raw| {
                let device = Device::from_monitored(partition, raw);
                (device.serial.clone(), Arc::new(device))
            })
            .collect();
        info!(%partition, devices = fresh.len(), "partition refreshed");

        self.install(partition, &fresh);
        Ok(())
    }

    /// Swap in `fresh` as the complete contents of `partition`.
    pub(crate) fn install(&self, partition: Partition, fresh: &DeviceMap) {
        self.devices.rcu(|current| {
            let mut next: DeviceMap = current
                .iter()
                .filter(|(_, d)| d.partition() != partition)
                .map(|(k, d)| (k.clone(), Arc::clone(d)))
                .collect();
            next.extend(fresh.iter().map(|(k, d)| (k.clone(), Arc::clone(d))));
            next
        });
        self.last_refresh.send_replace(Some(Utc::now()));
    }
}
