pub mod scheduler;
pub mod service;
pub mod session;
pub mod storage;
pub mod token;

pub use scheduler::{schedule_refresh, RefreshHandle, REFRESH_LEAD_SECS};
pub use service::{AuthService, LoginResponse, ProfileUpdate, RegisterRequest, User};
pub use session::Session;
pub use storage::TokenStore;
pub use token::{is_token_expired, time_until_expiry, Claims};
