pub mod dashboards;
pub mod notifications;
pub mod preferences;
pub mod sites;
pub mod tools;

pub use dashboards::{DashboardConfig, DashboardService};
pub use notifications::{Notification, NotificationPage, NotificationService};
pub use preferences::{PreferenceSync, PreferencesService, UserPreferences, DEBOUNCE_DELAY};
pub use sites::{Site, SiteService};
pub use tools::{CreateToolRequest, StoredTool, Tool, ToolCategory, ToolService};
