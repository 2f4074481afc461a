use std::collections::VecDeque;
use std::sync::Arc;

use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::{broadcast, oneshot, Mutex};
use tracing::{debug, error, warn};

use crate::auth::storage::TokenStore;
use crate::config::HubConfig;
use crate::error::{HubError, HubResult};

/// Capacity of the session event channel
const SESSION_EVENT_CAPACITY: usize = 16;

/// Events describing the fate of the authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Refresh failed or no refresh token was available; the caller should
    /// send the user back to the login entry point
    Expired,
    /// The user logged out deliberately
    LoggedOut,
}

/// Wire shape of a successful `/auth/refresh` response
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
}

/// Coordinator state: at most one refresh in flight, later arrivals park
/// in the FIFO queue
struct RefreshState {
    refreshing: bool,
    waiters: VecDeque<oneshot::Sender<HubResult<String>>>,
}

/// HTTP client for the hub API.
///
/// Every request carries either `Authorization: Bearer <token>` or, in
/// development when no token exists, an `X-Mock-User` header. A 401 response
/// triggers a single coordinated token refresh: concurrent requests that hit
/// a 401 while a refresh is underway queue behind it and are released in
/// arrival order once the new token is saved. A request is retried at most
/// once, so a persistently rejected token cannot loop.
///
/// Cloning is cheap; clones share the token store and the refresh state.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<TokenStore>,
    refresh: Arc<Mutex<RefreshState>>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    /// Build a client from configuration and a shared token store
    pub fn new(config: &HubConfig, store: Arc<TokenStore>) -> HubResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(HubError::Http)?;
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            store,
            refresh: Arc::new(Mutex::new(RefreshState {
                refreshing: false,
                waiters: VecDeque::new(),
            })),
            events,
        })
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token store shared with this client
    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Broadcast a session event to all subscribers
    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine; the event is simply dropped
        let _ = self.events.send(event);
    }

    /// GET a JSON resource
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> HubResult<T> {
        let response = self.execute(Method::GET, path, None, None).await?;
        Ok(response.json().await?)
    }

    /// GET a JSON resource with query parameters
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> HubResult<T> {
        let response = self.execute(Method::GET, path, None, Some(query)).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body, expecting a JSON response
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> HubResult<T> {
        let body = serde_json::to_value(body)?;
        let response = self.execute(Method::POST, path, Some(body), None).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body, discarding the response body
    pub async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> HubResult<()> {
        let body = serde_json::to_value(body)?;
        self.execute(Method::POST, path, Some(body), None).await?;
        Ok(())
    }

    /// PUT a JSON body, expecting a JSON response
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> HubResult<T> {
        let body = serde_json::to_value(body)?;
        let response = self.execute(Method::PUT, path, Some(body), None).await?;
        Ok(response.json().await?)
    }

    /// PUT with no request body, expecting a JSON response
    pub async fn put_bare<T: DeserializeOwned>(&self, path: &str) -> HubResult<T> {
        let response = self.execute(Method::PUT, path, None, None).await?;
        Ok(response.json().await?)
    }

    /// PATCH a JSON body, expecting a JSON response
    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> HubResult<T> {
        let body = serde_json::to_value(body)?;
        let response = self.execute(Method::PATCH, path, Some(body), None).await?;
        Ok(response.json().await?)
    }

    /// DELETE a resource, discarding any response body
    pub async fn delete(&self, path: &str) -> HubResult<()> {
        self.execute(Method::DELETE, path, None, None).await?;
        Ok(())
    }

    /// Run a request through the credential and refresh machinery.
    ///
    /// Returns the successful response; non-success statuses are mapped to
    /// [`HubError`]. On a 401 the request queues behind a single refresh and
    /// is replayed exactly once with the new token.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: Option<&[(&str, String)]>,
    ) -> HubResult<Response> {
        let response = self
            .dispatch(method.clone(), path, body.as_ref(), query)
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::check_status(response).await;
        }

        debug!(path = %path, "Request rejected with 401, coordinating token refresh");
        if let Err(e) = self.refreshed_access_token().await {
            // With no refresh token to spend, the 401 is the real answer:
            // hand back the server's own error so a wrong-password login
            // keeps its message
            return match e {
                HubError::NoRefreshToken => Self::check_status(response).await,
                e => Err(e),
            };
        }

        // Single replay with the fresh token; a second 401 is final
        let retry = self.dispatch(method, path, body.as_ref(), query).await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            warn!(path = %path, "Request still unauthorized after token refresh");
            return Err(HubError::Unauthorized);
        }
        Self::check_status(retry).await
    }

    /// Send one HTTP request with the current credentials attached
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: Option<&[(&str, String)]>,
    ) -> HubResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);

        if let Some(query) = query {
            request = request.query(query);
        }

        if let Some(token) = self.store.access_token().await {
            request = request.bearer_auth(token);
        } else if let Some(mock_user) = self.store.mock_user().await {
            request = request.header("X-Mock-User", mock_user);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Obtain a valid access token, performing or joining a refresh.
    ///
    /// The first caller flips the `refreshing` flag and performs the refresh;
    /// everyone else parks a oneshot in the queue and waits. The refresher
    /// drains the queue FIFO so parked requests resume in arrival order.
    async fn refreshed_access_token(&self) -> HubResult<String> {
        let waiter = {
            let mut state = self.refresh.lock().await;
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                Some(rx)
            } else {
                state.refreshing = true;
                None
            }
        };

        if let Some(rx) = waiter {
            debug!("Refresh already in flight, queueing request");
            return rx.await.unwrap_or_else(|_| {
                Err(HubError::RefreshFailed {
                    reason: "refresh coordinator dropped".to_string(),
                })
            });
        }

        let outcome = self.perform_refresh().await;

        {
            let mut state = self.refresh.lock().await;
            state.refreshing = false;
            while let Some(tx) = state.waiters.pop_front() {
                let payload = match &outcome {
                    Ok(token) => Ok(token.clone()),
                    Err(e) => Err(HubError::RefreshFailed {
                        reason: e.to_string(),
                    }),
                };
                // A waiter that gave up is not an error
                let _ = tx.send(payload);
            }
        }

        if outcome.is_err() {
            // Fatal to the session: drop the pair and tell subscribers to
            // head back to the login entry point
            if let Err(e) = self.store.clear_tokens().await {
                warn!(error = %e, "Failed to clear tokens after refresh failure");
            }
            self.emit(SessionEvent::Expired);
        }

        outcome
    }

    /// Call `/auth/refresh` directly, outside the interception machinery
    async fn perform_refresh(&self) -> HubResult<String> {
        let refresh_token = match self.store.refresh_token().await {
            Some(token) => token,
            None => {
                warn!("401 received but no refresh token is stored");
                return Err(HubError::NoRefreshToken);
            }
        };

        let url = format!("{}/auth/refresh", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            error!(status, "Token refresh rejected by the hub");
            return Err(HubError::RefreshFailed {
                reason: format!("refresh endpoint answered with status {}", status),
            });
        }

        let tokens: RefreshResponse = response.json().await?;
        self.store
            .save_tokens(&tokens.access_token, &tokens.refresh_token)
            .await?;
        debug!("Access token refreshed");
        Ok(tokens.access_token)
    }

    /// Map non-success responses to an API error carrying the server message
    async fn check_status(response: Response) -> HubResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let code = status.as_u16();
        let message = match response.text().await {
            Ok(body) => match serde_json::from_str::<Value>(&body) {
                Ok(json) => json
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or(body),
                Err(_) => body,
            },
            Err(_) => String::new(),
        };

        Err(HubError::Api {
            status: code,
            message,
        })
    }
}
