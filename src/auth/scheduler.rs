use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use crate::auth::storage::TokenStore;
use crate::auth::token::time_until_expiry;

/// Lead time before expiry at which the proactive refresh fires (5 minutes)
pub const REFRESH_LEAD_SECS: i64 = 300;

/// Cancellation handle for a pending proactive refresh.
///
/// Dropping the handle aborts the timer. An already-fired callback runs in
/// its own task and is not interrupted; in-flight refreshes are never
/// cancelled.
pub struct RefreshHandle {
    timer: JoinHandle<()>,
}

impl RefreshHandle {
    /// Abort the pending timer
    pub fn cancel(&self) {
        self.timer.abort();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

/// Arm a one-shot proactive refresh for the stored access token.
///
/// The callback fires `REFRESH_LEAD_SECS` before the token expires. If the
/// token is already inside that window the callback fires immediately and no
/// handle is returned, mirroring the timer-less path of the original
/// console. With no stored token there is nothing to schedule.
pub async fn schedule_refresh<F, Fut>(store: Arc<TokenStore>, callback: F) -> Option<RefreshHandle>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let token = store.access_token().await?;
    let delay_secs = time_until_expiry(&token) - REFRESH_LEAD_SECS;

    if delay_secs <= 0 {
        debug!("Access token inside refresh window, refreshing now");
        tokio::spawn(callback());
        return None;
    }

    debug!(delay_secs, "Proactive token refresh scheduled");
    let timer = tokio::spawn(async move {
        sleep(Duration::from_secs(delay_secs as u64)).await;
        // Detach the callback so cancelling the timer after it fired cannot
        // kill a refresh that is already underway
        tokio::spawn(callback());
    });

    Some(RefreshHandle { timer })
}
