//! Shared fixtures for the integration tests: a mockito-backed client and
//! signed tokens with controllable expiry.

// Each test binary compiles this module; not every binary uses every helper
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;

use hub_client::{ApiClient, HubConfig, TokenStore};

#[derive(Serialize)]
struct TestClaims {
    sub: String,
    #[serde(rename = "userId")]
    user_id: i64,
    exp: i64,
    iat: i64,
}

/// Build a signed access token whose expiry sits `offset_secs` from now
pub fn make_token(sub: &str, offset_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = TestClaims {
        sub: sub.to_string(),
        user_id: 1,
        exp: now + offset_secs,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"integration-secret"),
    )
    .expect("test token encodes")
}

/// Fresh token store backed by a unique temp file
pub fn temp_store() -> (Arc<TokenStore>, PathBuf) {
    let path = std::env::temp_dir().join(format!("hub-it-{}.json", uuid::Uuid::new_v4()));
    let store = Arc::new(TokenStore::open(&path).expect("store opens"));
    (store, path)
}

/// Client pointed at the mock server, sharing the given store
pub fn client_for(server: &mockito::ServerGuard, store: Arc<TokenStore>) -> ApiClient {
    let config = HubConfig::default()
        .with_base_url(&server.url())
        .expect("mock server URL is valid");
    ApiClient::new(&config, store).expect("client builds")
}

/// JSON body of a login/refresh response issuing the given pair
pub fn login_body(access: &str, refresh: &str) -> String {
    serde_json::json!({
        "accessToken": access,
        "refreshToken": refresh,
        "tokenType": "Bearer",
        "expiresIn": 3600,
        "user": {
            "id": 1,
            "email": "jean.dupont@smartsolutions.fr",
            "name": "Jean Dupont",
            "role": "operationnel",
            "siteIds": [1, 2]
        }
    })
    .to_string()
}

/// JSON body of `GET /users/me`
pub fn user_body() -> String {
    serde_json::json!({
        "id": 1,
        "email": "jean.dupont@smartsolutions.fr",
        "name": "Jean Dupont",
        "role": "operationnel",
        "siteIds": [1, 2],
        "preferredLanguage": "fr",
        "notificationEnabled": true
    })
    .to_string()
}
