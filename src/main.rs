use std::env;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use hub_client::services::{SiteService, ToolService};
use hub_client::{ApiClient, HubConfig, Session, TokenStore};

/// Console exerciser for the hub client: authenticates, prints the current
/// user and lists the sites and tools visible to them.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = HubConfig::from_env()?;
    info!(base_url = %config.base_url, "Connecting to hub");

    let store = Arc::new(TokenStore::open(&config.token_file)?);
    let client = ApiClient::new(&config, Arc::clone(&store))?;
    let session = Session::new(client.clone());

    match (env::var("HUB_EMAIL"), env::var("HUB_PASSWORD")) {
        (Ok(email), Ok(password)) => {
            session.login(&email, &password, false).await?;
        }
        _ => {
            if let Ok(mock_user) = env::var("HUB_MOCK_USER") {
                info!(email = %mock_user, "No credentials given, using mock identity");
                store.set_mock_user(&mock_user).await?;
            }
            session.initialize().await;
        }
    }

    match session.user().await {
        Some(user) => {
            info!(
                id = user.id,
                email = %user.email,
                role = %user.role,
                sites = ?user.site_ids,
                "Authenticated"
            );
        }
        None => {
            warn!("Not authenticated; continuing with mock identity if the hub allows it");
        }
    }

    let sites = SiteService::new(client.clone());
    match sites.my_sites().await {
        Ok(sites) => {
            for site in &sites {
                info!(id = site.id, name = %site.name, status = %site.status, "Site");
            }
        }
        Err(e) => warn!(error = %e, "Failed to list sites"),
    }

    let tools = ToolService::new(client);
    match tools.user_tools().await {
        Ok(tools) => {
            for tool in &tools {
                info!(id = tool.id, name = %tool.name, url = %tool.url, "Tool");
            }
        }
        Err(e) => warn!(error = %e, "Failed to list tools"),
    }

    Ok(())
}
