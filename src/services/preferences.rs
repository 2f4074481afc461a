use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::HubResult;
use crate::services::tools::StoredTool;

/// Quiet period before queued preference changes are written out
pub const DEBOUNCE_DELAY: Duration = Duration::from_secs(1);

/// Free-form keyed preferences owned by the hub
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub user_id: i64,
    #[serde(default)]
    pub preferences: Map<String, Value>,
}

/// Typed wrapper for the v2 preference endpoints.
///
/// `merge` is the workhorse: it PATCHes only the keys it is given, so
/// unrelated keys saved by other screens are never clobbered.
#[derive(Clone)]
pub struct PreferencesService {
    client: ApiClient,
}

impl PreferencesService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetch the current user's preference record
    pub async fn get(&self) -> HubResult<UserPreferences> {
        self.client.get("/users/me/preferences/v2").await
    }

    /// Replace the whole preference record
    pub async fn update(&self, preferences: &Map<String, Value>) -> HubResult<UserPreferences> {
        self.client.put("/users/me/preferences/v2", preferences).await
    }

    /// Partially update the record, leaving unmentioned keys untouched
    pub async fn merge(&self, partial: &Map<String, Value>) -> HubResult<UserPreferences> {
        self.client.patch("/users/me/preferences/v2", partial).await
    }

    /// Persist the launcher tool list
    pub async fn save_tools(&self, tools: &[StoredTool]) -> HubResult<UserPreferences> {
        let mut partial = Map::new();
        partial.insert("tools".to_string(), serde_json::to_value(tools).unwrap_or_default());
        self.merge(&partial).await
    }

    /// Persist the selected dashboard list
    pub async fn save_dashboards(&self, dashboards: &[String]) -> HubResult<UserPreferences> {
        let mut partial = Map::new();
        partial.insert(
            "dashboards".to_string(),
            serde_json::to_value(dashboards).unwrap_or_default(),
        );
        self.merge(&partial).await
    }

    /// Persist the selected site
    pub async fn save_selected_site(&self, site_id: &str) -> HubResult<UserPreferences> {
        let mut partial = Map::new();
        partial.insert("selectedSite".to_string(), Value::String(site_id.to_string()));
        self.merge(&partial).await
    }

    /// Persist the sidebar open/closed state
    pub async fn save_sidebar_state(&self, open: bool) -> HubResult<UserPreferences> {
        let mut partial = Map::new();
        partial.insert("sidebarOpen".to_string(), Value::Bool(open));
        self.merge(&partial).await
    }
}

enum SyncCommand {
    Update(String, Value),
    Flush(oneshot::Sender<()>),
}

/// Debounced preference auto-saver.
///
/// Local mutations are queued without blocking; each queued change restarts
/// a one-second quiet-period timer and only the final state is written, as a
/// single partial merge. Save failures are logged and the payload is kept
/// for the next cycle. Dropping the sync closes the channel; the worker
/// writes any pending changes and exits.
pub struct PreferenceSync {
    tx: mpsc::UnboundedSender<SyncCommand>,
    worker: JoinHandle<()>,
}

impl PreferenceSync {
    pub fn new(service: PreferencesService) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(service, rx));
        Self { tx, worker }
    }

    /// Queue a preference change under the given key, restarting the
    /// quiet-period timer
    pub fn queue(&self, key: impl Into<String>, value: Value) {
        let _ = self.tx.send(SyncCommand::Update(key.into(), value));
    }

    /// Queue the launcher tool list; only the serializable representation
    /// crosses the wire
    pub fn queue_tools(&self, tools: &[StoredTool]) {
        self.queue("tools", serde_json::to_value(tools).unwrap_or_default());
    }

    /// Force an immediate write of anything pending
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(SyncCommand::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Flush pending changes and wait for the worker to finish
    pub async fn shutdown(self) {
        let Self { tx, worker } = self;
        drop(tx);
        let _ = worker.await;
    }
}

async fn run_worker(service: PreferencesService, mut rx: mpsc::UnboundedReceiver<SyncCommand>) {
    let mut pending: Map<String, Value> = Map::new();
    let mut deadline: Option<Instant> = None;

    loop {
        // The sleep future needs a concrete instant even when no write is
        // due; the guard below keeps the idle branch from firing
        let wake = deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(86_400));

        tokio::select! {
            command = rx.recv() => match command {
                Some(SyncCommand::Update(key, value)) => {
                    pending.insert(key, value);
                    deadline = Some(Instant::now() + DEBOUNCE_DELAY);
                }
                Some(SyncCommand::Flush(ack)) => {
                    if !pending.is_empty() {
                        deadline = if write_pending(&service, &mut pending).await {
                            None
                        } else {
                            Some(Instant::now() + DEBOUNCE_DELAY)
                        };
                    }
                    let _ = ack.send(());
                }
                None => {
                    if !pending.is_empty() {
                        write_pending(&service, &mut pending).await;
                    }
                    break;
                }
            },
            _ = sleep_until(wake), if deadline.is_some() => {
                deadline = if write_pending(&service, &mut pending).await {
                    None
                } else {
                    // Retried on the next debounce cycle
                    Some(Instant::now() + DEBOUNCE_DELAY)
                };
            }
        }
    }
}

/// Write the pending partial merge; true on success
async fn write_pending(service: &PreferencesService, pending: &mut Map<String, Value>) -> bool {
    match service.merge(pending).await {
        Ok(_) => {
            debug!(keys = pending.len(), "Preference changes saved");
            pending.clear();
            true
        }
        Err(e) => {
            warn!(error = %e, "Failed to save preferences, will retry");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::TokenStore;
    use crate::config::HubConfig;
    use std::sync::Arc;

    async fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        let path = std::env::temp_dir().join(format!("hub-pref-{}.json", uuid::Uuid::new_v4()));
        let store = Arc::new(TokenStore::open(&path).unwrap());
        store.set_mock_user("jean.dupont@smartsolutions.fr").await.unwrap();
        let config = HubConfig::default().with_base_url(&server.url()).unwrap();
        ApiClient::new(&config, store).unwrap()
    }

    #[tokio::test]
    async fn rapid_mutations_produce_one_write_with_final_state() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/users/me/preferences/v2")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "sidebarOpen": true,
                "selectedSite": "9"
            })))
            .with_status(200)
            .with_body(r#"{"userId":1,"preferences":{"sidebarOpen":true,"selectedSite":"9"}}"#)
            .expect(1)
            .create_async()
            .await;

        let sync = PreferenceSync::new(PreferencesService::new(client_for(&server).await));
        for i in 0..10 {
            sync.queue("selectedSite", Value::String(i.to_string()));
            sync.queue("sidebarOpen", Value::Bool(i % 2 == 1));
        }

        tokio::time::sleep(Duration::from_millis(1500)).await;
        mock.assert_async().await;
        sync.shutdown().await;
    }

    #[tokio::test]
    async fn flush_writes_immediately() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/users/me/preferences/v2")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "sidebarOpen": false
            })))
            .with_status(200)
            .with_body(r#"{"userId":1,"preferences":{"sidebarOpen":false}}"#)
            .expect(1)
            .create_async()
            .await;

        let sync = PreferenceSync::new(PreferencesService::new(client_for(&server).await));
        sync.queue("sidebarOpen", Value::Bool(false));
        sync.flush().await;
        mock.assert_async().await;
        sync.shutdown().await;
    }

    #[tokio::test]
    async fn failed_write_is_retried_on_next_cycle() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("PATCH", "/users/me/preferences/v2")
            .with_status(500)
            .with_body(r#"{"message":"boom"}"#)
            .expect(1)
            .create_async()
            .await;

        let sync = PreferenceSync::new(PreferencesService::new(client_for(&server).await));
        sync.queue("sidebarOpen", Value::Bool(true));
        sync.flush().await;
        failing.assert_async().await;

        // The payload survives the failure and lands on the next attempt
        let succeeding = server
            .mock("PATCH", "/users/me/preferences/v2")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "sidebarOpen": true
            })))
            .with_status(200)
            .with_body(r#"{"userId":1,"preferences":{"sidebarOpen":true}}"#)
            .expect_at_least(1)
            .create_async()
            .await;

        sync.flush().await;
        succeeding.assert_async().await;
        sync.shutdown().await;
    }
}
