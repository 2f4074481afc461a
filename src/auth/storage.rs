use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::auth::token::is_token_expired;
use crate::error::{HubError, HubResult};

/// On-disk shape of the persisted credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredCredentials {
    /// Current access token, if any
    access_token: Option<String>,
    /// Current refresh token, if any
    refresh_token: Option<String>,
    /// Development-only mock identity carried in `X-Mock-User`
    mock_user: Option<String>,
}

/// Persistent store for the token pair and the development mock identity.
///
/// The browser console kept these in localStorage; here they live in a JSON
/// file next to an in-memory cache so reads never touch the disk. All state
/// sits behind a `RwLock`, making the store safe to share via `Arc`.
pub struct TokenStore {
    path: PathBuf,
    credentials: RwLock<StoredCredentials>,
}

impl TokenStore {
    /// Open a store backed by the given file, loading any persisted
    /// credentials. A corrupt file is treated as empty rather than an error.
    pub fn open(path: impl AsRef<Path>) -> HubResult<Self> {
        let path = path.as_ref().to_path_buf();
        let credentials = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<StoredCredentials>(&raw) {
                Ok(creds) => {
                    debug!(path = %path.display(), "Loaded credentials from token store");
                    creds
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Token store file is corrupt, starting with empty credentials"
                    );
                    StoredCredentials::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredCredentials::default(),
            Err(e) => {
                return Err(HubError::Storage {
                    reason: format!("failed to read '{}': {}", path.display(), e),
                });
            }
        };

        Ok(Self {
            path,
            credentials: RwLock::new(credentials),
        })
    }

    /// Persist both tokens, overwriting any prior pair
    pub async fn save_tokens(&self, access_token: &str, refresh_token: &str) -> HubResult<()> {
        let mut creds = self.credentials.write().await;
        creds.access_token = Some(access_token.to_string());
        creds.refresh_token = Some(refresh_token.to_string());
        self.persist(&creds)?;
        info!("Token pair saved");
        Ok(())
    }

    /// Current access token, if one is stored
    pub async fn access_token(&self) -> Option<String> {
        self.credentials.read().await.access_token.clone()
    }

    /// Current refresh token, if one is stored
    pub async fn refresh_token(&self) -> Option<String> {
        self.credentials.read().await.refresh_token.clone()
    }

    /// Remove the token pair from memory and disk
    pub async fn clear_tokens(&self) -> HubResult<()> {
        let mut creds = self.credentials.write().await;
        creds.access_token = None;
        creds.refresh_token = None;
        self.persist(&creds)?;
        info!("Token pair cleared");
        Ok(())
    }

    /// Development mock identity, if one is set
    pub async fn mock_user(&self) -> Option<String> {
        self.credentials.read().await.mock_user.clone()
    }

    /// Set the development mock identity
    pub async fn set_mock_user(&self, email: &str) -> HubResult<()> {
        let mut creds = self.credentials.write().await;
        creds.mock_user = Some(email.to_string());
        self.persist(&creds)?;
        debug!(email = %email, "Mock user set");
        Ok(())
    }

    /// Remove the development mock identity
    pub async fn clear_mock_user(&self) -> HubResult<()> {
        let mut creds = self.credentials.write().await;
        creds.mock_user = None;
        self.persist(&creds)?;
        Ok(())
    }

    /// True iff an access token exists and is not expired
    pub async fn is_authenticated(&self) -> bool {
        match &self.credentials.read().await.access_token {
            Some(token) => !is_token_expired(token),
            None => false,
        }
    }

    fn persist(&self, creds: &StoredCredentials) -> HubResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| HubError::Storage {
                    reason: format!("failed to create '{}': {}", parent.display(), e),
                })?;
            }
        }
        let raw = serde_json::to_string_pretty(creds).map_err(|e| HubError::Storage {
            reason: format!("failed to serialize credentials: {}", e),
        })?;
        fs::write(&self.path, raw).map_err(|e| HubError::Storage {
            reason: format!("failed to write '{}': {}", self.path.display(), e),
        })
    }
}
