//! Client library for the chantier hub API.
//!
//! The hub is the backend behind the construction-site management console:
//! authentication, user preferences, sites, launcher tools, dashboards and
//! notifications. This crate provides the whole client-side service layer:
//!
//! - [`auth::TokenStore`]: persistent token pair and development identity
//! - [`client::ApiClient`]: HTTP client with bearer/mock-user credentials
//!   and coordinated 401 refresh-and-replay
//! - [`auth::Session`]: cached authenticated user with proactive refresh
//! - [`services`]: typed wrappers for every REST surface the console uses,
//!   including debounced preference auto-save

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod services;

pub use auth::{Session, TokenStore};
pub use client::{ApiClient, SessionEvent};
pub use config::HubConfig;
pub use error::{ErrorCategory, HubError, HubResult};
