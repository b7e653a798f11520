// Platform endpoints: device inventory and subscription licensing.

use reqwest::StatusCode;

use crate::client::CentralClient;
use crate::error::Error;
use crate::models::{InventoryPage, SkuType, UnassignRequest, UnassignResponse};

impl CentralClient {
    pub async fn list_inventory(
        &self,
        sku: SkuType,
        offset: u32,
        limit: u32,
    ) -> Result<InventoryPage, Error> {
        self.get_with_params(
            "platform/device_inventory/v1/devices",
            &[
                ("sku_type", sku.as_query().to_owned()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ],
        )
        .await
    }

    /// Release the given subscription services from `serials`.
    ///
    /// Like device moves, refusals arrive as HTTP 500 with a JSON body;
    /// check [`UnassignResponse::succeeded`].
    pub async fn unassign_subscriptions(
        &self,
        serials: &[String],
        services: &[String],
    ) -> Result<UnassignResponse, Error> {
        self.post(
            "platform/licensing/v1/subscriptions/unassign",
            &UnassignRequest { serials, services },
            Some(StatusCode::INTERNAL_SERVER_ERROR),
        )
        .await
    }
}
