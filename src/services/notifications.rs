use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::HubResult;

/// A single user notification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

/// One page of notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    #[serde(default)]
    pub content: Vec<Notification>,
    #[serde(default)]
    pub total_elements: i64,
    #[serde(default)]
    pub total_pages: i64,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub number: i64,
}

/// Typed wrapper for the hub's notification endpoints
#[derive(Clone)]
pub struct NotificationService {
    client: ApiClient,
}

impl NotificationService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetch a page of notifications, newest first
    pub async fn list(&self, page: u32, size: u32) -> HubResult<NotificationPage> {
        self.client
            .get_with_query(
                "/notifications",
                &[("page", page.to_string()), ("size", size.to_string())],
            )
            .await
    }

    /// Mark one notification as read
    pub async fn mark_read(&self, notification_id: i64) -> HubResult<Notification> {
        self.client
            .put_bare(&format!("/notifications/{}/read", notification_id))
            .await
    }

    /// Number of unread notifications
    pub async fn unread_count(&self) -> HubResult<i64> {
        self.client.get("/notifications/unread-count").await
    }
}
