//! Test doubles: local stand-in HTTP services and in-memory broker/store

use crate::broker::KeyBroker;
use crate::error::{Error, Result, TransferCause};
use crate::identity::{AccountId, ContentAddress, EncryptionKey, GroupId};
use crate::storage::BlobStore;
use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::net::TcpListener;

/// Serve `app` on a random local port and return its base URL
pub(crate) async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{}", addr)
}

/// An address nothing is listening on
pub(crate) async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    listener.local_addr().expect("Failed to read local addr")
}

type Failure = Box<dyn Fn() -> Error + Send + Sync>;

/// In-memory broker that derives `key-{account}-{group}` or fails on demand
#[derive(Default)]
pub(crate) struct FakeBroker {
    failure: Option<Failure>,
    calls: AtomicUsize,
}

impl FakeBroker {
    pub(crate) fn failing(f: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        FakeBroker {
            failure: Some(Box::new(f)),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyBroker for FakeBroker {
    async fn get_key(&self, account: &AccountId, group: &GroupId) -> Result<EncryptionKey> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(f) => Err(f()),
            None => Ok(EncryptionKey::new(format!("key-{}-{}", account, group))),
        }
    }
}

/// In-memory content-addressed store with call counters
#[derive(Default)]
pub(crate) struct MemoryStore {
    blobs: Mutex<HashMap<String, (String, Bytes)>>,
    put_failure: Option<Failure>,
    puts: AtomicUsize,
    gets: AtomicUsize,
}

impl MemoryStore {
    pub(crate) fn failing_puts(f: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        MemoryStore {
            put_failure: Some(Box::new(f)),
            ..Default::default()
        }
    }

    /// Seed a blob and return its address
    pub(crate) fn insert(&self, filename: &str, data: &[u8]) -> ContentAddress {
        let address = Self::address_of(data);
        self.blobs.lock().unwrap().insert(
            address.as_str().to_string(),
            (filename.to_string(), Bytes::copy_from_slice(data)),
        );
        address
    }

    pub(crate) fn filename_of(&self, address: &ContentAddress) -> Option<String> {
        self.blobs
            .lock()
            .unwrap()
            .get(address.as_str())
            .map(|(name, _)| name.clone())
    }

    pub(crate) fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub(crate) fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    fn address_of(data: &[u8]) -> ContentAddress {
        ContentAddress::new(format!("bafy{}", &hex::encode(Sha256::digest(data))[..32]))
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn put(&self, data: Bytes, filename: &str) -> Result<ContentAddress> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if let Some(f) = &self.put_failure {
            return Err(f());
        }
        Ok(self.insert(filename, &data))
    }

    async fn get(&self, address: &ContentAddress) -> Result<Bytes> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.blobs
            .lock()
            .unwrap()
            .get(address.as_str())
            .map(|(_, data)| data.clone())
            .ok_or_else(|| Error::StorageFetchFailure {
                cause: TransferCause::Status(404),
                detail: format!("{} not found", address),
            })
    }
}
