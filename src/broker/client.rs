//! HTTP client for the key broker
//!
//! `POST {base_url}/api/key-management/get_key` with
//! `{"account_id", "group_id"}`, answered by `{"shade_key": "..."}`.

use crate::broker::KeyBroker;
use crate::config::BrokerConfig;
use crate::error::{Error, Result};
use crate::identity::{AccountId, EncryptionKey, GroupId};

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};

/// Key request path, relative to the broker base URL
pub const KEY_PATH: &str = "/api/key-management/get_key";

#[derive(Serialize)]
struct KeyRequest<'a> {
    account_id: &'a str,
    group_id: &'a str,
}

/// Key broker backed by the remote key-derivation service
#[derive(Debug, Clone)]
pub struct KeyBrokerClient {
    /// Full key request URL
    endpoint: String,
    /// Bounded wait for the whole exchange
    timeout: Duration,
}

impl KeyBrokerClient {
    /// Create a new key broker client
    pub fn new(config: &BrokerConfig) -> Self {
        KeyBrokerClient {
            endpoint: format!("{}{}", config.base_url.trim_end_matches('/'), KEY_PATH),
            timeout: config.timeout(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build a client for exactly one call; dropped on every exit path
    fn scoped_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))
    }

    fn classify(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            error!("Timeout calling Shade Agent at {}", self.endpoint);
            Error::BrokerTimeout
        } else if e.is_connect() {
            error!("Cannot connect to Shade Agent at {}: {}", self.endpoint, e);
            Error::BrokerUnreachable(e.to_string())
        } else {
            error!("Error calling Shade Agent at {}: {}", self.endpoint, e);
            Error::BrokerUnreachable(e.to_string())
        }
    }
}

#[async_trait]
impl KeyBroker for KeyBrokerClient {
    async fn get_key(&self, account: &AccountId, group: &GroupId) -> Result<EncryptionKey> {
        let client = self.scoped_client()?;

        info!(account = %account, group = %group, "Requesting Shade key from {}", self.endpoint);

        let response = client
            .post(&self.endpoint)
            .json(&KeyRequest {
                account_id: account.as_str(),
                group_id: group.as_str(),
            })
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        if status != reqwest::StatusCode::OK {
            error!(
                account = %account,
                group = %group,
                "Shade Agent error ({}): {}",
                status.as_u16(),
                body
            );
            return Err(Error::BrokerProtocolError {
                status: status.as_u16(),
                body,
            });
        }

        // A body that is not JSON carries no key field either
        let key = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("shade_key").and_then(|k| k.as_str()).map(str::to_owned))
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                error!(account = %account, group = %group, "Shade key not found in response");
                Error::KeyMissing
            })?;

        debug!("Shade key received ({} chars)", key.len());
        Ok(EncryptionKey::new(key))
    }
}
