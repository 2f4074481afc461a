use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::HubResult;

/// Construction site record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Typed wrapper for the hub's site endpoints
#[derive(Clone)]
pub struct SiteService {
    client: ApiClient,
}

impl SiteService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Sites assigned to the current user
    pub async fn my_sites(&self) -> HubResult<Vec<Site>> {
        self.client.get("/sites/me").await
    }

    /// Every site known to the hub
    pub async fn all_sites(&self) -> HubResult<Vec<Site>> {
        self.client.get("/sites").await
    }

    /// Sites currently marked active
    pub async fn active_sites(&self) -> HubResult<Vec<Site>> {
        self.client
            .get_with_query("/sites", &[("status", "active".to_string())])
            .await
    }

    /// A single site by id
    pub async fn site(&self, id: i64) -> HubResult<Site> {
        self.client.get(&format!("/sites/{}", id)).await
    }

    /// Batch lookup by ids
    pub async fn sites_by_ids(&self, ids: &[i64]) -> HubResult<Vec<Site>> {
        self.client.post("/sites/by-ids", &ids).await
    }

    /// Sites filtered by location
    pub async fn sites_by_location(&self, location: &str) -> HubResult<Vec<Site>> {
        self.client
            .get(&format!("/sites/location/{}", location))
            .await
    }
}
