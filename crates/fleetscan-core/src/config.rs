// ── Runtime configuration ──
//
// Plain data handed to the engines by the binary. The core never reads
// files or environment variables itself.

use std::collections::HashMap;
use std::time::Duration;

use crate::model::DeviceKind;

/// Central's maximum page size for the monitoring listings.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Pause after a group move before re-reading the inventory.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct RemediationConfig {
    /// Group every scanned device is expected to belong to.
    pub group: String,
    pub page_size: u32,
    pub settle_delay: Duration,
    /// Per-kind compliance versions that replace Central's answer.
    pub firmware_targets: HashMap<DeviceKind, String>,
    pub decommission: DecommissionPolicy,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            group: "default".into(),
            page_size: DEFAULT_PAGE_SIZE,
            settle_delay: DEFAULT_SETTLE_DELAY,
            firmware_targets: HashMap::new(),
            decommission: DecommissionPolicy::default(),
        }
    }
}

/// Behaviors of the decommission workflow that are deployment choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecommissionPolicy {
    /// Follow a successful unassign with the delete path.
    pub delete_after_unassign: bool,
    /// Refresh the inventory when a serial that was absent is scanned again.
    pub refresh_on_repeat: bool,
}
