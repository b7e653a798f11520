// Firmware endpoints: per-device upgrade status and group compliance.

use crate::client::CentralClient;
use crate::error::Error;
use crate::models::{FirmwareCompliance, FirmwareStatus};

impl CentralClient {
    pub async fn firmware_status(&self, serial: &str) -> Result<FirmwareStatus, Error> {
        self.get_with_params("firmware/v1/status", &[("serial", serial.to_owned())])
            .await
    }

    /// Compliance version configured for `device_type` within `group`.
    ///
    /// `device_type` is one of `CONTROLLER`, `CX`, `HP`, `IAP`.
    pub async fn firmware_compliance(
        &self,
        group: &str,
        device_type: &str,
    ) -> Result<FirmwareCompliance, Error> {
        self.get_with_params(
            "firmware/v1/upgrade/compliance_version",
            &[
                ("group", group.to_owned()),
                ("device_type", device_type.to_owned()),
            ],
        )
        .await
    }
}
