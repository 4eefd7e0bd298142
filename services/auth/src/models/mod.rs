//! Session client models

pub mod response;
pub mod session;
pub mod user;

// Re-export for convenience
pub use response::{LoginResponse, RefreshResponse, TokenGrant};
pub use session::{PersistedSession, STORE_KEY, Session, SessionState, SessionUpdate, now_millis};
pub use user::User;
