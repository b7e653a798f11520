// ── Device domain types ──

use std::collections::BTreeSet;
use std::fmt;

use fleetscan_api::models::MonitoredDevice;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Firmware family of a device, as Central's firmware API names it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum DeviceKind {
    /// Gateway / mobility controller.
    Controller,
    /// AOS-CX switch.
    Cx,
    /// AOS-S (ProCurve) switch.
    Hp,
    /// Instant access point.
    Iap,
}

impl DeviceKind {
    /// Switch family from the monitoring `switch_type` tag.
    pub fn from_switch_type(switch_type: Option<&str>) -> Self {
        match switch_type {
            Some(t) if t.eq_ignore_ascii_case("AOS-CX") => Self::Cx,
            _ => Self::Hp,
        }
    }

    pub fn partition(self) -> Partition {
        match self {
            Self::Controller => Partition::Gateway,
            Self::Cx | Self::Hp => Partition::Switch,
            Self::Iap => Partition::AccessPoint,
        }
    }
}

/// The three disjoint slices of the inventory, one per listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Partition {
    #[strum(serialize = "gateway")]
    Gateway,
    #[strum(serialize = "switch")]
    Switch,
    #[strum(serialize = "ap")]
    AccessPoint,
}

impl Partition {
    /// Device-type label used in operator messages.
    pub fn device_type_label(self) -> &'static str {
        match self {
            Self::Gateway => "GATEWAY",
            Self::Switch => "SWITCH",
            Self::AccessPoint => "AP",
        }
    }
}

/// Reported firmware, or the sentinel for devices that never reported one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FirmwareVersion {
    Known(String),
    Unknown,
}

impl FirmwareVersion {
    pub fn known(&self) -> Option<&str> {
        match self {
            Self::Known(v) => Some(v),
            Self::Unknown => None,
        }
    }
}

impl From<Option<String>> for FirmwareVersion {
    fn from(raw: Option<String>) -> Self {
        match raw {
            Some(v) if !v.trim().is_empty() && v != "Unknown" => Self::Known(v),
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.known().unwrap_or("Unknown"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum DeviceStatus {
    Up,
    Down,
}

/// A device as seen in one of the monitoring listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub serial: String,
    pub kind: DeviceKind,
    pub name: Option<String>,
    pub group: Option<String>,
    pub firmware: FirmwareVersion,
    pub status: DeviceStatus,
    pub services: BTreeSet<String>,
}

impl Device {
    /// Normalize a monitoring record from the listing for `partition`.
    pub fn from_monitored(partition: Partition, raw: MonitoredDevice) -> Self {
        let kind = match partition {
            Partition::Gateway => DeviceKind::Controller,
            Partition::Switch => DeviceKind::from_switch_type(raw.switch_type.as_deref()),
            Partition::AccessPoint => DeviceKind::Iap,
        };
        let status = match raw.status.as_deref() {
            Some("Down") => DeviceStatus::Down,
            _ => DeviceStatus::Up,
        };

        Self {
            serial: raw.serial,
            kind,
            name: raw.name,
            group: raw.group_name,
            firmware: raw.firmware_version.into(),
            status,
            services: raw.services.into_iter().collect(),
        }
    }

    pub fn partition(&self) -> Partition {
        self.kind.partition()
    }

    pub fn is_online(&self) -> bool {
        self.status == DeviceStatus::Up
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.group.as_deref() == Some(group)
    }
}
