//! Protocol coordinators
//!
//! Stateless per-request orchestration over a [`KeyBroker`] and a
//! [`BlobStore`]. Nothing here knows about wire field names; see
//! [`crate::protocol`] for that.
//!
//! [`KeyBroker`]: crate::broker::KeyBroker
//! [`BlobStore`]: crate::storage::BlobStore

mod retrieve;
mod upload;

pub use retrieve::{RetrievalBundle, RetrievalCoordinator};
pub use upload::{FinalizeUpload, UploadCoordinator, UploadReceipt, UploadTicket};
