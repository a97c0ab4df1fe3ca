//! Request-scoped identifiers and key material
//!
//! All of these live for one request at most. `UploadId` is derived, never
//! stored; `EncryptionKey` is wiped from memory when dropped.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

/// Number of hex characters kept from the upload digest
pub const UPLOAD_ID_LEN: usize = 16;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                $name(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $name(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name(value.to_string())
            }
        }
    };
}

string_id!(
    /// Opaque principal identifier supplied by the caller
    AccountId
);

string_id!(
    /// Opaque shared-key namespace supplied by the caller
    GroupId
);

string_id!(
    /// Identifier issued by the storage provider for an uploaded blob
    ContentAddress
);

string_id!(
    /// Handle correlating prepare and finalize calls for one upload
    UploadId
);

impl UploadId {
    /// Derive the upload handle for an (account, group) pair.
    ///
    /// `hex(SHA-256(account ‖ group))[..16]`. There is no nonce: repeated
    /// uploads by one account into one group share the handle.
    pub fn derive(account: &AccountId, group: &GroupId) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(account.as_str().as_bytes());
        hasher.update(group.as_str().as_bytes());
        let digest = hex::encode(hasher.finalize());
        UploadId(digest[..UPLOAD_ID_LEN].to_string())
    }
}

/// Key material returned by the broker
///
/// Serializes as the plain string the SDK expects; never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey(Zeroizing<String>);

impl EncryptionKey {
    pub fn new(value: impl Into<String>) -> Self {
        EncryptionKey(Zeroizing::new(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionKey(<{} chars>)", self.0.len())
    }
}

impl Serialize for EncryptionKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for EncryptionKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(EncryptionKey::new)
    }
}
