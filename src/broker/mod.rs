//! Key broker module
//!
//! The broker is a key-derivation service running inside a trusted
//! execution environment. It turns an (account, group) pair into the
//! symmetric key the SDK encrypts and decrypts with.

mod client;

pub use client::{KeyBrokerClient, KEY_PATH};

use crate::error::Result;
use crate::identity::{AccountId, EncryptionKey, GroupId};
use async_trait::async_trait;

/// Source of per-account, per-group encryption keys
#[async_trait]
pub trait KeyBroker: Send + Sync {
    /// Fetch the key for `account` within `group`. One attempt, no retries.
    async fn get_key(&self, account: &AccountId, group: &GroupId) -> Result<EncryptionKey>;
}
