//! Client-side authentication session store
//!
//! Submits credentials to the remote auth API, keeps the resulting session in
//! memory, mirrors it into a persistent key-value store, and refreshes or
//! clears it on demand.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use auth::{AuthConfig, SessionStore};
//! use common::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AuthConfig::from_env()?;
//!     let store = SessionStore::from_config(&config, Arc::new(MemoryStore::new()))?;
//!
//!     store.hydrate().await?;
//!     if !store.check_auth().await {
//!         store.login("ana@example.com", "secret").await?;
//!     }
//!     println!("Signed in: {}", store.is_authenticated().await);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod payload;
pub mod store;
pub mod validation;

pub use api::AuthApi;
pub use config::AuthConfig;
pub use error::{AuthError, AuthResult, FieldErrors};
pub use models::{Session, SessionUpdate, User};
pub use store::SessionStore;
