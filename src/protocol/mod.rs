//! Wire protocol adapters
//!
//! Two SDK conventions name the same logical fields differently. Each is a
//! [`WireVariant`]; [`ProtocolAdapter`] runs the shared coordinators and
//! maps results back into the variant's shape.
//!
//! | Logical field          | Tool (A)             | REST (B)                |
//! |------------------------|----------------------|-------------------------|
//! | returned key           | `key`                | `key`                   |
//! | returned upload handle | `upload_id`          | `upload_id`             |
//! | storage reference      | `ipfs_hash`          | `cid` + `ipfs_hash`     |
//! | input ciphertext       | `encrypted_data_b64` | `encrypted_data`        |

pub mod rest;
pub mod tool;

pub use rest::RestVariant;
pub use tool::ToolVariant;

use crate::coordinator::{
    FinalizeUpload, RetrievalBundle, RetrievalCoordinator, UploadCoordinator, UploadReceipt,
    UploadTicket,
};
use crate::error::Result;
use crate::identity::{AccountId, ContentAddress, EncryptionKey, GroupId, UploadId};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use tracing::debug;

/// Variant-neutral prepare-upload input
#[derive(Debug, Clone)]
pub struct PrepareUploadCall {
    pub account: AccountId,
    pub group: GroupId,
    pub filename: Option<String>,
}

/// Variant-neutral prepare-retrieve input
#[derive(Debug, Clone)]
pub struct PrepareRetrieveCall {
    pub account: AccountId,
    pub group: GroupId,
    pub content_address: ContentAddress,
}

/// `prepare_upload` response; same field names in both variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareUploadResponse {
    pub key: EncryptionKey,
    pub upload_id: UploadId,
}

impl From<UploadTicket> for PrepareUploadResponse {
    fn from(ticket: UploadTicket) -> Self {
        PrepareUploadResponse {
            key: ticket.key,
            upload_id: ticket.upload_id,
        }
    }
}

/// `prepare_retrieve` response; same field names in both variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareRetrieveResponse {
    pub key: EncryptionKey,
    pub encrypted_b64: String,
    pub ipfs_hash: ContentAddress,
    pub group_id: GroupId,
}

impl From<RetrievalBundle> for PrepareRetrieveResponse {
    fn from(bundle: RetrievalBundle) -> Self {
        PrepareRetrieveResponse {
            key: bundle.key,
            encrypted_b64: bundle.encrypted_b64,
            ipfs_hash: bundle.content_address,
            group_id: bundle.group,
        }
    }
}

/// One SDK-facing naming convention
///
/// `caller` is the account carried outside the body (the REST
/// `X-Account-Id` header); variants that carry it in the body ignore it.
pub trait WireVariant: Send + Sync + 'static {
    /// Short name used in logs
    const NAME: &'static str;

    type PrepareUploadRequest: DeserializeOwned + Send;
    type FinalizeUploadRequest: DeserializeOwned + Send;
    type PrepareRetrieveRequest: DeserializeOwned + Send;
    type FinalizeUploadResponse: Serialize + Send;

    fn prepare_upload_call(caller: &AccountId, req: Self::PrepareUploadRequest) -> PrepareUploadCall;

    fn finalize_upload_call(caller: &AccountId, req: Self::FinalizeUploadRequest) -> FinalizeUpload;

    fn prepare_retrieve_call(
        caller: &AccountId,
        req: Self::PrepareRetrieveRequest,
    ) -> PrepareRetrieveCall;

    fn finalize_upload_response(receipt: UploadReceipt) -> Self::FinalizeUploadResponse;
}

/// Shared coordinators, cheap to clone
#[derive(Clone)]
pub struct Coordinators {
    pub uploads: UploadCoordinator,
    pub retrievals: RetrievalCoordinator,
}

/// Runs the coordinators on behalf of one wire variant
pub struct ProtocolAdapter<V> {
    coordinators: Coordinators,
    _variant: PhantomData<fn() -> V>,
}

impl<V> Clone for ProtocolAdapter<V> {
    fn clone(&self) -> Self {
        ProtocolAdapter {
            coordinators: self.coordinators.clone(),
            _variant: PhantomData,
        }
    }
}

impl<V: WireVariant> ProtocolAdapter<V> {
    pub fn new(coordinators: Coordinators) -> Self {
        ProtocolAdapter {
            coordinators,
            _variant: PhantomData,
        }
    }

    pub async fn prepare_upload(
        &self,
        caller: &AccountId,
        req: V::PrepareUploadRequest,
    ) -> Result<PrepareUploadResponse> {
        debug!("{} prepare_upload", V::NAME);
        let call = V::prepare_upload_call(caller, req);
        let ticket = self
            .coordinators
            .uploads
            .prepare_upload(&call.account, &call.group, call.filename.as_deref())
            .await?;
        Ok(ticket.into())
    }

    pub async fn finalize_upload(
        &self,
        caller: &AccountId,
        req: V::FinalizeUploadRequest,
    ) -> Result<V::FinalizeUploadResponse> {
        debug!("{} finalize_upload", V::NAME);
        let call = V::finalize_upload_call(caller, req);
        let receipt = self.coordinators.uploads.finalize_upload(call).await?;
        Ok(V::finalize_upload_response(receipt))
    }

    pub async fn prepare_retrieve(
        &self,
        caller: &AccountId,
        req: V::PrepareRetrieveRequest,
    ) -> Result<PrepareRetrieveResponse> {
        debug!("{} prepare_retrieve", V::NAME);
        let call = V::prepare_retrieve_call(caller, req);
        let bundle = self
            .coordinators
            .retrievals
            .prepare_retrieve(&call.account, &call.group, &call.content_address)
            .await?;
        Ok(bundle.into())
    }
}
