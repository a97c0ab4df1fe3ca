//! blindfold-broker - Key and storage broker for client-side encrypted files
//!
//! Mediates between an SDK that encrypts locally, a key-derivation service
//! running in a TEE, and a content-addressed storage provider. Plaintext
//! never passes through here and nothing is persisted between requests.

pub mod broker;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod identity;
pub mod protocol;
pub mod server;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::coordinator::{RetrievalCoordinator, UploadCoordinator};
    pub use crate::error::{Error, Result};
    pub use crate::identity::{AccountId, ContentAddress, EncryptionKey, GroupId, UploadId};
}
