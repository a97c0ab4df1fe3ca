//! Content-addressed storage module
//!
//! Ciphertext goes out through the provider's pinning API and comes back
//! through its public gateway. Transfers are all-or-nothing.

mod gateway;

pub use gateway::{StorageGateway, UPLOAD_CONTENT_TYPE};

use crate::error::Result;
use crate::identity::ContentAddress;
use async_trait::async_trait;
use bytes::Bytes;

/// Store for encrypted blobs, addressed by content
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `data` under `filename` and return its content address
    async fn put(&self, data: Bytes, filename: &str) -> Result<ContentAddress>;

    /// Fetch the full body stored at `address`
    async fn get(&self, address: &ContentAddress) -> Result<Bytes>;
}
