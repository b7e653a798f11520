// Configuration endpoints: group membership.

use reqwest::StatusCode;

use crate::client::CentralClient;
use crate::error::Error;
use crate::models::{MoveDevicesRequest, MoveDevicesResponse};

impl CentralClient {
    /// Move `serials` into `group`.
    ///
    /// Central reports refused moves as HTTP 500 with the same JSON shape,
    /// so both are returned as a response; check
    /// [`MoveDevicesResponse::initiated`].
    pub async fn move_devices(
        &self,
        group: &str,
        serials: &[String],
    ) -> Result<MoveDevicesResponse, Error> {
        self.post(
            "configuration/v1/devices/move",
            &MoveDevicesRequest { group, serials },
            Some(StatusCode::INTERNAL_SERVER_ERROR),
        )
        .await
    }
}
