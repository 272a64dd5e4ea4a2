//! Unified error handling for the client.
//!
//! The sync services never return these to their callers: a failed remote
//! call or an undecodable payload sends the operation down the local path.
//! They surface from construction ([`crate::Basket::from_config`]) and are
//! logged on the fallback paths.

use crate::config::ConfigError;
use crate::remote::RemoteError;
use crate::storage::StorageError;

/// Client error type.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Engine error: {0}")]
    Engine(#[from] basket_engine::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
