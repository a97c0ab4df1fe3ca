//! Pinata storage gateway
//!
//! Upload: multipart `POST` to the pinning endpoint, field `file`,
//! credentials in `pinata_api_key` / `pinata_secret_api_key` headers,
//! answered by `{"IpfsHash": "..."}`.
//! Fetch: `GET {gateway}/{address}`, raw bytes.

use crate::config::StorageConfig;
use crate::error::{Error, Result, TransferCause};
use crate::identity::ContentAddress;
use crate::storage::BlobStore;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, error, info};

/// MIME type declared for every uploaded part
pub const UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// Storage backend for the Pinata pinning service
pub struct StorageGateway {
    upload_url: String,
    gateway_url: String,
    api_key: String,
    secret_key: String,
    timeout: Duration,
}

impl StorageGateway {
    /// Create a new storage gateway
    pub fn new(config: &StorageConfig) -> Self {
        StorageGateway {
            upload_url: config.upload_url.clone(),
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
            timeout: config.timeout(),
        }
    }

    /// Gateway URL for a content address
    pub fn fetch_url(&self, address: &ContentAddress) -> String {
        format!("{}/{}", self.gateway_url, address)
    }

    /// Build a client for exactly one transfer; dropped on every exit path
    fn scoped_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))
    }
}

fn transport_cause(e: &reqwest::Error) -> TransferCause {
    if e.is_timeout() {
        TransferCause::Timeout
    } else if e.is_connect() {
        TransferCause::Unreachable
    } else {
        TransferCause::InvalidResponse
    }
}

fn upload_failure(cause: TransferCause, detail: impl Into<String>) -> Error {
    let detail = detail.into();
    error!("Pinata upload failed ({}): {}", cause, detail);
    Error::StorageUploadFailure { cause, detail }
}

fn fetch_failure(cause: TransferCause, detail: impl Into<String>) -> Error {
    let detail = detail.into();
    error!("IPFS fetch failed ({}): {}", cause, detail);
    Error::StorageFetchFailure { cause, detail }
}

#[async_trait]
impl BlobStore for StorageGateway {
    async fn put(&self, data: Bytes, filename: &str) -> Result<ContentAddress> {
        let client = self.scoped_client()?;
        let size = data.len();

        let part = Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str(UPLOAD_CONTENT_TYPE)
            .map_err(|e| Error::Internal(format!("Invalid upload MIME type: {}", e)))?;
        let form = Form::new().part("file", part);

        info!("Uploading to Pinata: {} ({} bytes)", filename, size);

        let response = client
            .post(&self.upload_url)
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| upload_failure(transport_cause(&e), e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| upload_failure(transport_cause(&e), e.to_string()))?;

        if status != reqwest::StatusCode::OK {
            return Err(upload_failure(TransferCause::Status(status.as_u16()), body));
        }

        let address = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("IpfsHash").and_then(|h| h.as_str()).map(str::to_owned))
            .filter(|h| !h.is_empty())
            .ok_or_else(|| upload_failure(TransferCause::InvalidResponse, body.clone()))?;

        info!("Uploaded to IPFS: {}", address);
        Ok(ContentAddress::new(address))
    }

    async fn get(&self, address: &ContentAddress) -> Result<Bytes> {
        let client = self.scoped_client()?;
        let url = self.fetch_url(address);

        debug!("Fetching encrypted data from {}", url);

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| fetch_failure(transport_cause(&e), e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(fetch_failure(TransferCause::Status(status.as_u16()), text));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| fetch_failure(transport_cause(&e), e.to_string()))?;

        info!("Encrypted data fetched ({} bytes)", data.len());
        Ok(data)
    }
}
