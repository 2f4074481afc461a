use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::HubResult;

/// Functional grouping of launcher tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    SuiviChantier,
    Ged,
    Heures,
    Planning,
    Betons,
    Other,
}

impl ToolCategory {
    /// Icon identifier for the category.
    ///
    /// Icons never cross the wire; the stored representation carries only the
    /// category and the icon is reconstructed from this lookup on load.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::SuiviChantier => "layout",
            Self::Ged => "file-text",
            Self::Heures => "clock",
            Self::Planning => "calendar",
            Self::Betons => "droplets",
            Self::Other => "globe",
        }
    }

    /// Display label, matching the console's French UI
    pub fn label(&self) -> &'static str {
        match self {
            Self::SuiviChantier => "Suivi de chantier",
            Self::Ged => "GED",
            Self::Heures => "Heures",
            Self::Planning => "Planning",
            Self::Betons => "Bétons",
            Self::Other => "Autre",
        }
    }
}

/// Serializable launcher tool as persisted in user preferences.
///
/// This is the shape sent to the hub by the preference auto-saver; anything
/// non-serializable (rendered icons) is excluded by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredTool {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    pub category: ToolCategory,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub active: bool,
}

impl StoredTool {
    /// Icon identifier reconstructed from the category
    pub fn icon(&self) -> &'static str {
        self.category.icon()
    }
}

/// Server-managed tool record from the `/tools` endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub display_order: i32,
}

/// Creation payload for `POST /tools`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateToolRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    pub icon: String,
}

/// Typed wrapper for the hub's tool endpoints
#[derive(Clone)]
pub struct ToolService {
    client: ApiClient,
}

impl ToolService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Tools belonging to the current user
    pub async fn user_tools(&self) -> HubResult<Vec<Tool>> {
        self.client.get("/tools").await
    }

    /// Create a tool for the current user
    pub async fn create_tool(&self, request: &CreateToolRequest) -> HubResult<Tool> {
        self.client.post("/tools", request).await
    }

    /// Delete a tool by id
    pub async fn delete_tool(&self, tool_id: i64) -> HubResult<()> {
        self.client.delete(&format!("/tools/{}", tool_id)).await
    }

    /// Persist a new display order for the user's tools
    pub async fn update_order(&self, tool_ids: &[i64]) -> HubResult<Vec<Tool>> {
        self.client
            .put(
                "/tools/order",
                &serde_json::json!({ "toolIds": tool_ids }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&ToolCategory::SuiviChantier).unwrap();
        assert_eq!(json, "\"suivi_chantier\"");
        let back: ToolCategory = serde_json::from_str("\"ged\"").unwrap();
        assert_eq!(back, ToolCategory::Ged);
    }

    #[test]
    fn icons_come_from_category_lookup() {
        let tool = StoredTool {
            id: "dalux".to_string(),
            name: "Dalux".to_string(),
            description: String::new(),
            url: "https://dalux.com".to_string(),
            category: ToolCategory::SuiviChantier,
            display_order: 1,
            active: true,
        };
        assert_eq!(tool.icon(), "layout");

        // The wire form must never carry an icon field
        let json = serde_json::to_value(&tool).unwrap();
        assert!(json.get("icon").is_none());
    }

    #[test]
    fn stored_tool_round_trips() {
        let tool = StoredTool {
            id: "custom-1".to_string(),
            name: "PUMA".to_string(),
            description: "Gestion des heures".to_string(),
            url: "https://puma.example.com".to_string(),
            category: ToolCategory::Heures,
            display_order: 3,
            active: true,
        };
        let json = serde_json::to_string(&tool).unwrap();
        let back: StoredTool = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tool);
        assert_eq!(back.icon(), "clock");
    }
}
