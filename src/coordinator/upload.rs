//! Two-step upload: prepare (key + handle), then finalize (store ciphertext)

use crate::broker::KeyBroker;
use crate::error::{Error, Result};
use crate::identity::{AccountId, ContentAddress, EncryptionKey, GroupId, UploadId};
use crate::storage::BlobStore;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{error, info};

/// Result of the prepare step
#[derive(Debug, Clone)]
pub struct UploadTicket {
    pub key: EncryptionKey,
    pub upload_id: UploadId,
}

/// Input of the finalize step, in variant-neutral form
#[derive(Debug, Clone)]
pub struct FinalizeUpload {
    pub account: AccountId,
    pub group: GroupId,
    /// Base64 ciphertext, exactly as received
    pub encrypted_b64: String,
    /// Caller's plaintext hash; passed through untouched
    pub file_hash: String,
    pub filename: String,
}

/// Result of the finalize step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub content_address: ContentAddress,
    pub file_hash: String,
}

/// Coordinates prepare-upload and finalize-upload
///
/// The two calls are correlated only by the caller reusing the
/// `upload_id` it was handed; nothing is kept between them.
#[derive(Clone)]
pub struct UploadCoordinator {
    broker: Arc<dyn KeyBroker>,
    store: Arc<dyn BlobStore>,
}

impl UploadCoordinator {
    pub fn new(broker: Arc<dyn KeyBroker>, store: Arc<dyn BlobStore>) -> Self {
        UploadCoordinator { broker, store }
    }

    /// Fetch the group key and derive the upload handle. No storage side effects.
    pub async fn prepare_upload(
        &self,
        account: &AccountId,
        group: &GroupId,
        filename: Option<&str>,
    ) -> Result<UploadTicket> {
        info!(
            account = %account,
            group = %group,
            filename = filename.unwrap_or(""),
            "prepare_upload called"
        );

        let key = self.broker.get_key(account, group).await.map_err(|e| {
            error!(account = %account, group = %group, kind = e.kind(), "prepare_upload error: {}", e);
            e
        })?;

        let upload_id = UploadId::derive(account, group);
        Ok(UploadTicket { key, upload_id })
    }

    /// Decode the ciphertext, store it, and return its content address
    pub async fn finalize_upload(&self, request: FinalizeUpload) -> Result<UploadReceipt> {
        let FinalizeUpload {
            account,
            group,
            encrypted_b64,
            file_hash,
            filename,
        } = request;

        info!(
            account = %account,
            group = %group,
            filename = %filename,
            file_hash = %file_hash,
            "finalize_upload called"
        );

        // Rejected before any network call
        let data = decode_ciphertext(&encrypted_b64).map_err(|e| {
            error!(account = %account, group = %group, "finalize_upload rejected: {}", e);
            e
        })?;

        let content_address = self.store.put(data, &filename).await.map_err(|e| {
            error!(account = %account, group = %group, kind = e.kind(), "finalize_upload error: {}", e);
            e
        })?;

        Ok(UploadReceipt {
            content_address,
            file_hash,
        })
    }
}

/// Line-wrapped payloads are accepted; whitespace anywhere is dropped
fn decode_ciphertext(encoded: &str) -> Result<Bytes> {
    let encoded: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if encoded.is_empty() {
        return Err(Error::MalformedRequest(
            "Missing encrypted data in request".to_string(),
        ));
    }

    let data = STANDARD.decode(encoded)?;
    if data.is_empty() {
        return Err(Error::MalformedRequest(
            "Encrypted data decodes to an empty payload".to_string(),
        ));
    }

    Ok(Bytes::from(data))
}
