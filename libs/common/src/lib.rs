//! Common library for the auth session client
//!
//! This crate provides the persistent key-value backing used by the session
//! store, including the storage trait, its in-memory and file-backed
//! implementations, and the storage error types.

pub mod error;
pub mod storage;

pub use error::{StorageError, StorageResult};
pub use storage::{
    FileStore, KeyValueStore, MemoryStore, StorageBackend, StorageConfig, open_store,
};

/// Example usage of the storage module
///
/// ```rust,no_run
/// use common::storage::{StorageConfig, open_store};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = StorageConfig::from_env()?;
///     let store = open_store(&config).await?;
///     store.set("greeting", "hello").await?;
///     println!("Stored value: {:?}", store.get("greeting").await?);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
