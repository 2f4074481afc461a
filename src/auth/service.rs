use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::error::{HubError, HubResult};

/// Authenticated user as returned by `GET /users/me`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub site_ids: Vec<i64>,
    #[serde(default)]
    pub preferred_language: Option<String>,
    #[serde(default)]
    pub notification_enabled: bool,
}

/// Compact user echoed inside login responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub site_ids: Vec<i64>,
}

/// Response of every auth endpoint that issues a token pair
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: LoginUser,
}

/// Registration payload for `POST /auth/register`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Partial profile-preference update for `PUT /users/me/preferences`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_enabled: Option<bool>,
}

/// Authentication operations against the hub.
///
/// Every token-issuing call persists the returned pair through the shared
/// token store before handing the response back to the caller.
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Log in with email and password
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> HubResult<LoginResponse> {
        let response: LoginResponse = self
            .client
            .post(
                "/auth/login",
                &serde_json::json!({
                    "email": email,
                    "password": password,
                    "rememberMe": remember_me,
                }),
            )
            .await?;

        self.client
            .store()
            .save_tokens(&response.access_token, &response.refresh_token)
            .await?;
        info!(email = %email, "Logged in");
        Ok(response)
    }

    /// Register a new account
    pub async fn register(&self, request: &RegisterRequest) -> HubResult<LoginResponse> {
        let response: LoginResponse = self.client.post("/auth/register", request).await?;
        self.client
            .store()
            .save_tokens(&response.access_token, &response.refresh_token)
            .await?;
        info!(email = %request.email, "Registered new account");
        Ok(response)
    }

    /// Development SSO login against the mock identity provider
    pub async fn login_sso(&self, email: &str) -> HubResult<LoginResponse> {
        let response: LoginResponse = self
            .client
            .post("/auth/sso/mock", &serde_json::json!({ "email": email }))
            .await?;
        self.client
            .store()
            .save_tokens(&response.access_token, &response.refresh_token)
            .await?;
        info!(email = %email, "Logged in via mock SSO");
        Ok(response)
    }

    /// Exchange the stored refresh token for a new pair.
    ///
    /// Used by the proactive scheduler; the reactive 401 path lives inside
    /// the client itself.
    pub async fn refresh(&self) -> HubResult<()> {
        let refresh_token = self
            .client
            .store()
            .refresh_token()
            .await
            .ok_or(HubError::NoRefreshToken)?;

        let response: LoginResponse = self
            .client
            .post(
                "/auth/refresh",
                &serde_json::json!({ "refreshToken": refresh_token }),
            )
            .await?;
        self.client
            .store()
            .save_tokens(&response.access_token, &response.refresh_token)
            .await?;
        debug!("Token pair refreshed proactively");
        Ok(())
    }

    /// Request a password-reset email
    pub async fn forgot_password(&self, email: &str) -> HubResult<()> {
        self.client
            .post_unit(
                "/auth/forgot-password",
                &serde_json::json!({ "email": email }),
            )
            .await
    }

    /// Complete a password reset with the emailed token
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> HubResult<()> {
        self.client
            .post_unit(
                "/auth/reset-password",
                &serde_json::json!({
                    "token": token,
                    "newPassword": new_password,
                    "confirmPassword": confirm_password,
                }),
            )
            .await
    }

    /// Fetch the authenticated user
    pub async fn current_user(&self) -> HubResult<User> {
        self.client.get("/users/me").await
    }

    /// Update the profile-level preferences on the user record
    pub async fn update_profile(&self, update: &ProfileUpdate) -> HubResult<User> {
        self.client.put("/users/me/preferences", update).await
    }

    /// Drop the token pair and the development mock identity
    pub async fn logout(&self) -> HubResult<()> {
        self.client.store().clear_tokens().await?;
        self.client.store().clear_mock_user().await?;
        info!("Logged out");
        Ok(())
    }
}
