use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::HubResult;

/// Per-user dashboard selection as stored by the hub
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub dashboard_ids: Vec<String>,
}

/// Typed wrapper for the hub's dashboard endpoints
#[derive(Clone)]
pub struct DashboardService {
    client: ApiClient,
}

impl DashboardService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Identifiers of every dashboard the user may add
    pub async fn available(&self) -> HubResult<Vec<String>> {
        self.client.get("/dashboards/available").await
    }

    /// The current user's dashboard selection
    pub async fn my_config(&self) -> HubResult<DashboardConfig> {
        self.client.get("/dashboards/me").await
    }

    /// Replace the current user's dashboard selection
    pub async fn save_config(&self, dashboard_ids: &[String]) -> HubResult<DashboardConfig> {
        self.client.put("/dashboards/me", &dashboard_ids).await
    }
}
