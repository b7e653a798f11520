// Wire types for the Central REST endpoints
//
// Required fields are required here too: a page without `serial` on a
// record fails to decode instead of producing a half-filled device.
// Optional fields default so that Central's habit of sending `null`
// or omitting keys never breaks a sweep.

use serde::{Deserialize, Serialize};

// ── Pagination ───────────────────────────────────────────────────────

/// A single page from an offset-paginated list endpoint.
pub trait Page {
    type Item;

    fn into_items(self) -> Vec<Self::Item>;
}

// ── Monitoring ───────────────────────────────────────────────────────

/// Device record shared by the gateway, switch and AP listings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonitoredDevice {
    pub serial: String,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Switch family, e.g. `AOS-S` or `AOS-CX`. Absent on gateways and APs.
    #[serde(default)]
    pub switch_type: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPage {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub gateways: Vec<MonitoredDevice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchPage {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub switches: Vec<MonitoredDevice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApPage {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub aps: Vec<MonitoredDevice>,
}

impl Page for GatewayPage {
    type Item = MonitoredDevice;

    fn into_items(self) -> Vec<MonitoredDevice> {
        self.gateways
    }
}

impl Page for SwitchPage {
    type Item = MonitoredDevice;

    fn into_items(self) -> Vec<MonitoredDevice> {
        self.switches
    }
}

impl Page for ApPage {
    type Item = MonitoredDevice;

    fn into_items(self) -> Vec<MonitoredDevice> {
        self.aps
    }
}

// ── Device inventory ─────────────────────────────────────────────────

/// Which slice of the device inventory to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkuType {
    Gateway,
    Switch,
    Ap,
    All,
}

impl SkuType {
    pub fn as_query(self) -> &'static str {
        match self {
            Self::Gateway => "GATEWAY",
            Self::Switch => "SWITCH",
            Self::Ap => "AP",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InventoryDevice {
    pub serial: String,
    /// `GATEWAY`, `SWITCH` or `AP`.
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub macaddr: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryPage {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub devices: Vec<InventoryDevice>,
}

impl Page for InventoryPage {
    type Item = InventoryDevice;

    fn into_items(self) -> Vec<InventoryDevice> {
        self.devices
    }
}

// ── Configuration ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MoveDevicesRequest<'a> {
    pub group: &'a str,
    pub serials: &'a [String],
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoveDevicesResponse {
    #[serde(default)]
    pub description: Option<String>,
}

impl MoveDevicesResponse {
    /// Central reports an accepted move as "... initiated ...".
    pub fn initiated(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| d.contains("initiated"))
    }
}

// ── Firmware ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirmwareStatus {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub firmware_scheduled_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirmwareCompliance {
    pub firmware_compliance_version: String,
    #[serde(default)]
    pub compliance_scheduled_at: Option<i64>,
}

// ── Licensing ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct UnassignRequest<'a> {
    pub serials: &'a [String],
    pub services: &'a [String],
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnassignResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl UnassignResponse {
    pub fn succeeded(&self) -> bool {
        self.response.as_deref() == Some("success")
    }
}
