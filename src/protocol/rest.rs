//! REST variant (B)
//!
//! The caller's account travels in the `X-Account-Id` header. Missing body
//! fields default to empty strings. Ciphertext arrives as `encrypted_data`;
//! the stored reference goes back as `cid`, with `ipfs_hash` kept alongside.

use crate::coordinator::{FinalizeUpload, UploadReceipt};
use crate::identity::{AccountId, ContentAddress, GroupId};
use crate::protocol::{PrepareRetrieveCall, PrepareUploadCall, WireVariant};

use serde::{Deserialize, Serialize};

/// Header carrying the caller's account
pub const ACCOUNT_HEADER: &str = "X-Account-Id";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterGroupBody {
    pub group_id: GroupId,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterGroupResponse {
    pub success: bool,
    pub group_id: GroupId,
    pub message: String,
}

impl RegisterGroupResponse {
    /// Acknowledge a group; registration itself happens on-chain via the SDK
    pub fn acknowledge(group_id: GroupId) -> Self {
        RegisterGroupResponse {
            success: true,
            group_id,
            message: "Group registered successfully".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PrepareUploadBody {
    pub group_id: GroupId,
    pub filename: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FinalizeUploadBody {
    pub upload_id: String,
    pub encrypted_data: String,
    pub file_hash: String,
    pub filename: Option<String>,
    pub group_id: GroupId,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PrepareRetrieveBody {
    pub group_id: GroupId,
    pub ipfs_hash: ContentAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadStored {
    pub cid: ContentAddress,
    pub ipfs_hash: ContentAddress,
    pub file_hash: String,
}

/// REST wire convention
pub struct RestVariant;

impl WireVariant for RestVariant {
    const NAME: &'static str = "rest";

    type PrepareUploadRequest = PrepareUploadBody;
    type FinalizeUploadRequest = FinalizeUploadBody;
    type PrepareRetrieveRequest = PrepareRetrieveBody;
    type FinalizeUploadResponse = UploadStored;

    fn prepare_upload_call(caller: &AccountId, req: PrepareUploadBody) -> PrepareUploadCall {
        PrepareUploadCall {
            account: caller.clone(),
            group: req.group_id,
            filename: Some(req.filename).filter(|f| !f.is_empty()),
        }
    }

    fn finalize_upload_call(caller: &AccountId, req: FinalizeUploadBody) -> FinalizeUpload {
        let filename = req
            .filename
            .unwrap_or_else(|| format!("file-{}.enc", req.upload_id));

        FinalizeUpload {
            account: caller.clone(),
            group: req.group_id,
            encrypted_b64: req.encrypted_data,
            file_hash: req.file_hash,
            filename,
        }
    }

    fn prepare_retrieve_call(caller: &AccountId, req: PrepareRetrieveBody) -> PrepareRetrieveCall {
        PrepareRetrieveCall {
            account: caller.clone(),
            group: req.group_id,
            content_address: req.ipfs_hash,
        }
    }

    fn finalize_upload_response(receipt: UploadReceipt) -> UploadStored {
        UploadStored {
            cid: receipt.content_address.clone(),
            ipfs_hash: receipt.content_address,
            file_hash: receipt.file_hash,
        }
    }
}
