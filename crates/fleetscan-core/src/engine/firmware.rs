// ── Firmware compliance workflow ──
//
// PRESENCE → VERSION KNOWN → GROUP → COMPLIANCE. Every branch ends the
// cycle; nothing carries over to the next scan except the session's
// confirmation state.

use std::collections::HashMap;

use fleetscan_api::CentralClient;
use futures::future::join_all;
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use super::{CycleOutcome, Reporter, Scan, Workflow};
use crate::audit::AuditField;
use crate::error::CoreError;
use crate::event::StatusColor;
use crate::fleet::Fleet;
use crate::model::{Device, DeviceKind, FirmwareVersion};

// ── Compliance targets ───────────────────────────────────────────────

/// Target firmware per device kind, fixed for the life of the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplianceTargets {
    targets: HashMap<DeviceKind, String>,
}

impl ComplianceTargets {
    pub fn from_map(targets: HashMap<DeviceKind, String>) -> Self {
        Self { targets }
    }

    /// Ask Central for every kind not covered by `overrides`.
    ///
    /// A kind Central answers with 404 for is left without a target;
    /// devices of that kind then stop at the compliance step. Any other
    /// failure aborts the load, since targets are never fetched again.
    pub async fn load(
        client: &CentralClient,
        group: &str,
        overrides: &HashMap<DeviceKind, String>,
    ) -> Result<Self, CoreError> {
        let mut targets = overrides.clone();

        let pending = DeviceKind::iter()
            .filter(|kind| !overrides.contains_key(kind))
            .map(|kind| async move {
                (kind, client.firmware_compliance(group, kind.as_ref()).await)
            });

        for (kind, result) in join_all(pending).await {
            match result {
                Ok(compliance) => {
                    debug!(%kind, version = %compliance.firmware_compliance_version, "compliance target");
                    targets.insert(kind, compliance.firmware_compliance_version);
                }
                Err(e) if e.is_not_found() => warn!(%kind, "no compliance target"),
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Self { targets })
    }

    pub fn target_for(&self, kind: DeviceKind) -> Option<&str> {
        self.targets.get(&kind).map(String::as_str)
    }
}

// ── Engine ───────────────────────────────────────────────────────────

pub struct FirmwareEngine {
    fleet: Fleet,
    targets: ComplianceTargets,
}

impl FirmwareEngine {
    /// Build the engine, loading compliance targets once.
    pub async fn new(fleet: Fleet) -> Result<Self, CoreError> {
        let config = fleet.config();
        let targets =
            ComplianceTargets::load(fleet.client(), &config.group, &config.firmware_targets)
                .await?;
        Ok(Self::with_targets(fleet, targets))
    }

    pub fn with_targets(fleet: Fleet, targets: ComplianceTargets) -> Self {
        Self { fleet, targets }
    }

    pub fn targets(&self) -> &ComplianceTargets {
        &self.targets
    }

    fn target_group(&self) -> &str {
        &self.fleet.config().group
    }

    /// Issue the move, let Central settle, then re-read the inventory.
    async fn move_to_group(&self, serial: &str, r: &Reporter) -> Result<(), CoreError> {
        let group = self.target_group();
        r.status("Moving", StatusColor::Grey);
        r.audit(serial, AuditField::Status, "Moving");

        let resp = self
            .fleet
            .client()
            .move_devices(group, &[serial.to_owned()])
            .await?;
        let description = resp.description.as_deref().unwrap_or("no description");
        if resp.initiated() {
            info!(serial, group, "group move initiated");
            r.log(format!("{serial} - Moving to group {group}: {description}"));
        } else {
            warn!(serial, group, description, "group move not initiated");
            r.log(format!("{serial} - Move to group {group} failed: {description}"));
        }

        tokio::time::sleep(self.fleet.config().settle_delay).await;
        self.fleet.refresh_all().await
    }

    /// Compare against the target, re-reading the inventory once before
    /// concluding that the firmware does not match.
    async fn current_firmware(
        &self,
        device: &Device,
        reported: &str,
        target: &str,
    ) -> Result<String, CoreError> {
        if reported == target {
            return Ok(reported.to_owned());
        }

        self.fleet.refresh_all().await?;
        let refreshed = self
            .fleet
            .inventory()
            .lookup(&device.serial)
            .and_then(|d| d.firmware.known().map(str::to_owned));
        Ok(refreshed.unwrap_or_else(|| reported.to_owned()))
    }
}

impl Workflow for FirmwareEngine {
    fn name(&self) -> &'static str {
        "firmware"
    }

    async fn prepare(&self, r: &Reporter) -> Result<(), CoreError> {
        r.log("Refreshing device inventory");
        self.fleet.refresh_all().await
    }

    async fn run_cycle(&self, scan: &Scan, r: &Reporter) -> Result<CycleOutcome, CoreError> {
        let serial = scan.serial.as_str();
        let inventory = self.fleet.inventory();
        let done = |present| CycleOutcome {
            present,
            consumed_confirmation: scan.confirmation,
        };

        // ── Presence ──
        let mut device = inventory.lookup(serial);
        if device.is_none() && scan.confirmation {
            r.log(format!("{serial} - Not cached, refreshing inventory"));
            self.fleet.refresh_all().await?;
            device = inventory.lookup(serial);
        }
        let Some(device) = device else {
            r.status("Not in Central", StatusColor::Orange);
            r.log(format!("{serial} - Not in Central"));
            r.audit(serial, AuditField::Status, "Not in central");
            return Ok(done(false));
        };

        // ── Version known ──
        let FirmwareVersion::Known(reported) = &device.firmware else {
            r.status("Version Unknown", StatusColor::Red);
            r.audit(serial, AuditField::Status, "Version Unknown");
            if device.is_online() {
                r.log(format!("{serial} - Online but no firmware version reported"));
            } else {
                r.status("Device Offline", StatusColor::Red);
                r.log(format!("{serial} - Device offline, firmware version unknown"));
            }
            return Ok(done(true));
        };

        // ── Group ──
        if !device.in_group(self.target_group()) {
            let from = device.group.as_deref().unwrap_or("no group");
            r.log(format!("{serial} - In {from}, expected {}", self.target_group()));
            self.move_to_group(serial, r).await?;
            return Ok(done(true));
        }

        // ── Compliance ──
        let Some(target) = self.targets.target_for(device.kind) else {
            r.status("No Target", StatusColor::Red);
            r.log(format!("{serial} - No compliance version for {}", device.kind));
            r.audit(serial, AuditField::Status, "No Target");
            return Ok(done(true));
        };

        let current = self.current_firmware(&device, reported, target).await?;
        if current == target {
            r.status("Ok", StatusColor::Green);
            r.log(format!("{serial} - Firmware {current}"));
            r.audit(serial, AuditField::Status, &current);
        } else if scan.confirmation {
            let upgrade = self.fleet.client().firmware_status(serial).await?;
            let reason = upgrade
                .reason
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| "No upgrade status reported".to_owned());
            r.log(format!("{serial} - Escalating: {reason}"));
            r.status(reason.clone(), StatusColor::Orange);
            r.audit(serial, AuditField::Status, &reason);
        } else {
            r.status("Wait", StatusColor::Orange);
            r.log(format!(
                "{serial} - Firmware {current} is not up-to-date ({target}). Check later or escalate by scanning again!"
            ));
            r.audit(serial, AuditField::Status, &current);
        }
        Ok(done(true))
    }
}
