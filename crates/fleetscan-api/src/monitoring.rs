// Monitoring endpoints: device listings and gateway removal.

use reqwest::StatusCode;

use crate::client::CentralClient;
use crate::error::Error;
use crate::models::{ApPage, GatewayPage, SwitchPage};

fn page_params(offset: u32, limit: u32) -> [(&'static str, String); 3] {
    [
        ("limit", limit.to_string()),
        ("offset", offset.to_string()),
        ("calculate_total", "true".to_owned()),
    ]
}

impl CentralClient {
    pub async fn list_gateways(&self, offset: u32, limit: u32) -> Result<GatewayPage, Error> {
        self.get_with_params("monitoring/v1/gateways", &page_params(offset, limit))
            .await
    }

    pub async fn list_switches(&self, offset: u32, limit: u32) -> Result<SwitchPage, Error> {
        self.get_with_params("monitoring/v1/switches", &page_params(offset, limit))
            .await
    }

    pub async fn list_aps(&self, offset: u32, limit: u32) -> Result<ApPage, Error> {
        self.get_with_params("monitoring/v2/aps", &page_params(offset, limit))
            .await
    }

    /// Remove a gateway from monitoring.
    ///
    /// Returns `false` when Central does not know the serial (HTTP 404).
    pub async fn delete_gateway(&self, serial: &str) -> Result<bool, Error> {
        let resp = self
            .delete(&format!("monitoring/v1/gateways/{serial}"))
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(Self::parse_error(s, resp).await),
        }
    }
}
