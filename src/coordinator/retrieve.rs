//! Retrieval: key and ciphertext fetched side by side

use crate::broker::KeyBroker;
use crate::error::{Error, Result};
use crate::identity::{AccountId, ContentAddress, EncryptionKey, GroupId};
use crate::storage::BlobStore;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use tracing::{error, info};

/// Everything the SDK needs to decrypt a stored blob
#[derive(Debug, Clone)]
pub struct RetrievalBundle {
    pub key: EncryptionKey,
    pub encrypted_b64: String,
    pub content_address: ContentAddress,
    pub group: GroupId,
}

/// Coordinates prepare-retrieve
#[derive(Clone)]
pub struct RetrievalCoordinator {
    broker: Arc<dyn KeyBroker>,
    store: Arc<dyn BlobStore>,
}

impl RetrievalCoordinator {
    pub fn new(broker: Arc<dyn KeyBroker>, store: Arc<dyn BlobStore>) -> Self {
        RetrievalCoordinator { broker, store }
    }

    pub async fn prepare_retrieve(
        &self,
        account: &AccountId,
        group: &GroupId,
        content_address: &ContentAddress,
    ) -> Result<RetrievalBundle> {
        info!(
            account = %account,
            group = %group,
            address = %content_address,
            "prepare_retrieve called"
        );

        if content_address.is_empty() {
            error!(account = %account, group = %group, "prepare_retrieve rejected: no content address");
            return Err(Error::MalformedRequest(
                "Missing ipfs_hash in request".to_string(),
            ));
        }

        // The two lookups are independent; the first failure wins
        let (key, data) = futures::try_join!(
            self.broker.get_key(account, group),
            self.store.get(content_address)
        )
        .map_err(|e| {
            error!(account = %account, group = %group, kind = e.kind(), "prepare_retrieve error: {}", e);
            e
        })?;

        Ok(RetrievalBundle {
            key,
            encrypted_b64: STANDARD.encode(&data),
            content_address: content_address.clone(),
            group: group.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransferCause;
    use crate::testing::{FakeBroker, MemoryStore};

    #[tokio::test]
    async fn test_prepare_retrieve_returns_stored_bytes() {
        let store = Arc::new(MemoryStore::default());
        let payload = b"\x00\xffencrypted-blob\x10";
        let address = store.insert("blob.enc", payload);
        let retrieval = RetrievalCoordinator::new(Arc::new(FakeBroker::default()), store.clone());

        let bundle = retrieval
            .prepare_retrieve(&"alice.near".into(), &"vault.alice.near".into(), &address)
            .await
            .unwrap();

        assert_eq!(bundle.key.expose(), "key-alice.near-vault.alice.near");
        assert_eq!(STANDARD.decode(&bundle.encrypted_b64).unwrap(), payload);
        assert_eq!(bundle.content_address, address);
        assert_eq!(bundle.group.as_str(), "vault.alice.near");
        assert_eq!(store.gets(), 1);
    }

    #[tokio::test]
    async fn test_broker_failure_propagates() {
        let store = Arc::new(MemoryStore::default());
        let address = store.insert("blob.enc", b"data");
        let retrieval = RetrievalCoordinator::new(
            Arc::new(FakeBroker::failing(|| Error::KeyMissing)),
            store,
        );

        let err = retrieval
            .prepare_retrieve(&"a".into(), &"g".into(), &address)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::KeyMissing));
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let retrieval = RetrievalCoordinator::new(
            Arc::new(FakeBroker::default()),
            Arc::new(MemoryStore::default()),
        );

        let err = retrieval
            .prepare_retrieve(&"a".into(), &"g".into(), &"QmUnknown".into())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::StorageFetchFailure {
                cause: TransferCause::Status(404),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_address_rejected_before_network() {
        let broker = Arc::new(FakeBroker::default());
        let store = Arc::new(MemoryStore::default());
        let retrieval = RetrievalCoordinator::new(broker.clone(), store.clone());

        let err = retrieval
            .prepare_retrieve(&"a".into(), &"g".into(), &ContentAddress::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MalformedRequest(_)));
        assert_eq!(broker.calls(), 0);
        assert_eq!(store.gets(), 0);
    }
}
