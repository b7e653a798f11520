// ── Decommission workflow ──
//
// First scan reports presence. A repeat of a present device is the
// operator's go-ahead: either release its subscriptions or delete it.
// Only gateways have a delete path.

use tracing::{debug, info};

use super::{CycleOutcome, Reporter, Scan, Workflow};
use crate::audit::{AuditField, timestamp};
use crate::config::DecommissionPolicy;
use crate::error::CoreError;
use crate::event::StatusColor;
use crate::fleet::Fleet;
use crate::model::Partition;

pub struct DecommissionEngine {
    fleet: Fleet,
    policy: DecommissionPolicy,
}

impl DecommissionEngine {
    pub fn new(fleet: Fleet) -> Self {
        let policy = fleet.config().decommission;
        Self { fleet, policy }
    }

    pub fn with_policy(fleet: Fleet, policy: DecommissionPolicy) -> Self {
        Self { fleet, policy }
    }

    /// Release every subscription attached to `serial`.
    async fn unassign(&self, serial: &str, r: &Reporter) -> Result<bool, CoreError> {
        let services = self.fleet.inventory().services_of(serial);
        if services.is_empty() {
            r.status("No Subscriptions found", StatusColor::Red);
            r.log(format!("{serial} - No Subscriptions found"));
            r.audit(serial, AuditField::Status, "No Subscriptions found");
            r.audit(serial, AuditField::UnsubscribedOn, "ERROR");
            return Ok(false);
        }

        r.log(format!("{serial} - Unassigning {}", services.join(", ")));
        let resp = self
            .fleet
            .client()
            .unassign_subscriptions(&[serial.to_owned()], &services)
            .await?;

        if resp.succeeded() {
            info!(serial, ?services, "subscriptions released");
            r.status("Unsubscribed", StatusColor::Green);
            r.audit(serial, AuditField::Status, "Unsubscribed");
            r.audit(serial, AuditField::UnsubscribedOn, &timestamp());
            Ok(true)
        } else {
            let detail = resp
                .message
                .or(resp.response)
                .unwrap_or_else(|| "no response".to_owned());
            r.status("Subscription Error", StatusColor::Red);
            r.log(format!("{serial} - Unassign failed: {detail}"));
            r.audit(serial, AuditField::Status, "Subscription Error");
            r.audit(serial, AuditField::UnsubscribedOn, "ERROR");
            Ok(false)
        }
    }

    /// Delete `serial` if its kind has a delete path.
    async fn delete(&self, serial: &str, r: &Reporter) -> Result<(), CoreError> {
        let partition = self
            .fleet
            .inventory()
            .kind_of(serial)
            .map(|kind| kind.partition());

        if partition != Some(Partition::Gateway) {
            let kind = partition.map_or("UNKNOWN", Partition::device_type_label);
            r.audit(serial, AuditField::DeletedOn, "ERROR");
            return Err(CoreError::UnsupportedDeviceKind {
                serial: serial.to_owned(),
                kind: kind.to_owned(),
            });
        }

        r.log(format!("{serial} - Delete Gateway"));
        if self.fleet.client().delete_gateway(serial).await? {
            info!(serial, "gateway deleted");
            r.status("Deleted", StatusColor::Green);
            r.log(format!("{serial} - Deleted Gateway"));
            r.audit(serial, AuditField::Status, "Deleted");
            r.audit(serial, AuditField::DeletedOn, &timestamp());
        } else {
            r.status("Deletion aborted", StatusColor::Red);
            r.log(format!("{serial} - Central refused the deletion"));
            r.audit(serial, AuditField::Status, "Deletion aborted");
            r.audit(serial, AuditField::DeletedOn, "ERROR");
        }
        Ok(())
    }
}

impl Workflow for DecommissionEngine {
    fn name(&self) -> &'static str {
        "decommission"
    }

    async fn prepare(&self, r: &Reporter) -> Result<(), CoreError> {
        r.log("Refreshing device inventory");
        let inventory = self.fleet.inventory();
        tokio::try_join!(inventory.refresh_all(), inventory.refresh_subscriptions())?;
        Ok(())
    }

    async fn run_cycle(&self, scan: &Scan, r: &Reporter) -> Result<CycleOutcome, CoreError> {
        let serial = scan.serial.as_str();
        let inventory = self.fleet.inventory();

        if scan.confirmation && !scan.previously_present && self.policy.refresh_on_repeat {
            r.log(format!("{serial} - Rechecking Central"));
            inventory.refresh_all().await?;
        }

        if !inventory.is_present(serial) {
            r.status("Not in Central", StatusColor::Red);
            r.log(format!("{serial} - Not in Central"));
            r.audit(serial, AuditField::Status, "Not in Central");
            return Ok(CycleOutcome {
                present: false,
                consumed_confirmation: false,
            });
        }

        if !scan.confirms_present_device() {
            let action = if scan.unlicense { "unlicense" } else { "delete" };
            r.status("In Central", StatusColor::Orange);
            r.log(format!("{serial} - In Central. Scan again to {action}"));
            r.audit(serial, AuditField::Status, "In Central");
            return Ok(CycleOutcome {
                present: true,
                consumed_confirmation: false,
            });
        }

        if scan.unlicense {
            // The operator is told the device goes too; whether it actually
            // does is up to `delete_after_unassign`.
            r.log(format!(
                "{serial} - Unassign license option activated. Device will also be deleted"
            ));
            let released = self.unassign(serial, r).await?;
            if !self.policy.delete_after_unassign {
                debug!(serial, "delete after unassign disabled, device kept");
            } else if released {
                self.delete(serial, r).await?;
            }
        } else {
            r.log(format!(
                "{serial} - Delete device option activated. License will be kept"
            ));
            self.delete(serial, r).await?;
        }

        Ok(CycleOutcome {
            present: true,
            consumed_confirmation: true,
        })
    }
}
