use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::auth::scheduler::{schedule_refresh, RefreshHandle};
use crate::auth::service::{AuthService, LoginResponse, RegisterRequest, User};
use crate::auth::storage::TokenStore;
use crate::client::{ApiClient, SessionEvent};
use crate::error::HubResult;

/// Single source of truth for the authenticated user.
///
/// The session caches the user fetched from `/users/me`, keeps a proactive
/// refresh timer armed while a user is present, and broadcasts
/// [`SessionEvent`]s when the session ends. Dropping the session cancels any
/// pending refresh timer.
pub struct Session {
    auth: AuthService,
    client: ApiClient,
    store: Arc<TokenStore>,
    user: RwLock<Option<User>>,
    refresh_timer: Mutex<Option<RefreshHandle>>,
}

impl Session {
    pub fn new(client: ApiClient) -> Arc<Self> {
        let store = Arc::clone(client.store());
        Arc::new(Self {
            auth: AuthService::new(client.clone()),
            client,
            store,
            user: RwLock::new(None),
            refresh_timer: Mutex::new(None),
        })
    }

    /// Restore the session from persisted credentials.
    ///
    /// A failure to fetch the user is not surfaced: the stale pair is
    /// dropped quietly and the caller simply starts signed out.
    pub async fn initialize(self: &Arc<Self>) {
        if !self.store.is_authenticated().await {
            debug!("No valid stored session to restore");
            return;
        }

        match self.auth.current_user().await {
            Ok(user) => {
                info!(email = %user.email, "Session restored from stored tokens");
                *self.user.write().await = Some(user);
                Arc::clone(self).arm_refresh().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to restore session, clearing stored tokens");
                if let Err(e) = self.store.clear_tokens().await {
                    warn!(error = %e, "Failed to clear tokens");
                }
            }
        }
    }

    /// Log in and cache the authenticated user
    pub async fn login(
        self: &Arc<Self>,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> HubResult<LoginResponse> {
        let response = self.auth.login(email, password, remember_me).await?;
        self.adopt_user().await?;
        Ok(response)
    }

    /// Register a new account and cache the authenticated user
    pub async fn register(self: &Arc<Self>, request: &RegisterRequest) -> HubResult<LoginResponse> {
        let response = self.auth.register(request).await?;
        self.adopt_user().await?;
        Ok(response)
    }

    /// Log in through the development SSO endpoint
    pub async fn login_with_sso(self: &Arc<Self>, email: &str) -> HubResult<LoginResponse> {
        let response = self.auth.login_sso(email).await?;
        self.adopt_user().await?;
        Ok(response)
    }

    /// Clear the user, drop the tokens and cancel the refresh timer
    pub async fn logout(&self) -> HubResult<()> {
        *self.user.write().await = None;
        if let Some(handle) = self.refresh_timer.lock().await.take() {
            handle.cancel();
        }
        self.auth.logout().await?;
        self.client.emit(SessionEvent::LoggedOut);
        Ok(())
    }

    /// Re-fetch the cached user from the hub
    pub async fn refresh_user(&self) -> HubResult<()> {
        let user = self.auth.current_user().await?;
        *self.user.write().await = Some(user);
        Ok(())
    }

    /// Currently signed-in user, if any
    pub async fn user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    /// True while a user is cached
    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.client.subscribe()
    }

    /// Fetch the user after a token-issuing call and arm the refresh timer
    async fn adopt_user(self: &Arc<Self>) -> HubResult<()> {
        let user = self.auth.current_user().await?;
        info!(email = %user.email, role = %user.role, "User session established");
        *self.user.write().await = Some(user);
        Arc::clone(self).arm_refresh().await;
        Ok(())
    }

    /// Arm (or re-arm) the proactive refresh timer.
    ///
    /// Boxed because the scheduled callback re-arms after each successful
    /// refresh, which would otherwise make the future type recursive.
    fn arm_refresh(self: Arc<Self>) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let session = Arc::clone(&self);
            let handle = schedule_refresh(Arc::clone(&self.store), move || async move {
                match session.auth.refresh().await {
                    Ok(()) => {
                        debug!("Proactive refresh succeeded, re-arming timer");
                        Arc::clone(&session).arm_refresh().await;
                    }
                    Err(e) => {
                        warn!(error = %e, "Proactive refresh failed, closing session");
                        if let Err(e) = session.logout().await {
                            warn!(error = %e, "Logout after failed refresh also failed");
                        }
                    }
                }
            })
            .await;

            // On the immediate-fire path no handle comes back and the spawned
            // callback may already be re-arming; storing None here would
            // drop-abort that freshly armed timer
            if handle.is_some() {
                *self.refresh_timer.lock().await = handle;
            }
        })
    }
}
