//! Tool-invocation variant (A)
//!
//! The caller's account travels as a tool argument. Ciphertext arrives as
//! `encrypted_data_b64`; the stored reference goes back as `ipfs_hash`.

use crate::coordinator::{FinalizeUpload, UploadReceipt};
use crate::identity::{AccountId, ContentAddress, GroupId};
use crate::protocol::{PrepareRetrieveCall, PrepareUploadCall, WireVariant};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct PrepareUploadArgs {
    pub account_id: AccountId,
    pub group_id: GroupId,
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinalizeUploadArgs {
    pub account_id: AccountId,
    pub group_id: GroupId,
    pub encrypted_data_b64: String,
    pub file_hash: String,
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrepareRetrieveArgs {
    pub account_id: AccountId,
    pub group_id: GroupId,
    pub ipfs_hash: ContentAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadStored {
    pub ipfs_hash: ContentAddress,
    pub file_hash: String,
}

/// Tool-invocation wire convention
pub struct ToolVariant;

impl WireVariant for ToolVariant {
    const NAME: &'static str = "tool";

    type PrepareUploadRequest = PrepareUploadArgs;
    type FinalizeUploadRequest = FinalizeUploadArgs;
    type PrepareRetrieveRequest = PrepareRetrieveArgs;
    type FinalizeUploadResponse = UploadStored;

    fn prepare_upload_call(_caller: &AccountId, req: PrepareUploadArgs) -> PrepareUploadCall {
        PrepareUploadCall {
            account: req.account_id,
            group: req.group_id,
            filename: Some(req.filename).filter(|f| !f.is_empty()),
        }
    }

    fn finalize_upload_call(_caller: &AccountId, req: FinalizeUploadArgs) -> FinalizeUpload {
        FinalizeUpload {
            account: req.account_id,
            group: req.group_id,
            encrypted_b64: req.encrypted_data_b64,
            file_hash: req.file_hash,
            filename: req.filename,
        }
    }

    fn prepare_retrieve_call(_caller: &AccountId, req: PrepareRetrieveArgs) -> PrepareRetrieveCall {
        PrepareRetrieveCall {
            account: req.account_id,
            group: req.group_id,
            content_address: req.ipfs_hash,
        }
    }

    fn finalize_upload_response(receipt: UploadReceipt) -> UploadStored {
        UploadStored {
            ipfs_hash: receipt.content_address,
            file_hash: receipt.file_hash,
        }
    }
}

/// Tool names exposed to the tool-invocation transport
pub const PREPARE_UPLOAD: &str = "prepare_upload";
pub const FINALIZE_UPLOAD: &str = "finalize_upload";
pub const PREPARE_RETRIEVE: &str = "prepare_retrieve";

fn string_schema(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

/// Descriptors for `tools/list`
pub fn catalog() -> Vec<Value> {
    vec![
        json!({
            "name": PREPARE_UPLOAD,
            "description": "Prepare for file upload by fetching the group encryption key",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "account_id": string_schema("Account ID"),
                    "group_id": string_schema("Group ID for the upload"),
                    "filename": string_schema("Filename (optional)"),
                },
                "required": ["account_id", "group_id"],
            },
        }),
        json!({
            "name": FINALIZE_UPLOAD,
            "description": "Finalize upload by storing encrypted data",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "account_id": string_schema("Account ID"),
                    "group_id": string_schema("Group ID"),
                    "encrypted_data_b64": string_schema("Base64-encoded encrypted data"),
                    "file_hash": string_schema("SHA-256 hash of the original file"),
                    "filename": string_schema("Original filename"),
                },
                "required": ["account_id", "group_id", "encrypted_data_b64", "file_hash", "filename"],
            },
        }),
        json!({
            "name": PREPARE_RETRIEVE,
            "description": "Prepare for file retrieval by fetching encrypted data and its key",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "account_id": string_schema("Account ID"),
                    "group_id": string_schema("Group ID"),
                    "ipfs_hash": string_schema("Content address of the encrypted file"),
                },
                "required": ["account_id", "group_id", "ipfs_hash"],
            },
        }),
    ]
}
