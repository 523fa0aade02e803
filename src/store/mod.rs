// src/store/mod.rs
//! Persistent article store seam. Production deployments back this with a
//! database; tests and embedded callers use [`MemoryStore`]. The store is
//! the sole arbiter of uniqueness: the engine inserts optimistically and
//! treats a `DuplicateKey` refusal as an authoritative duplicate signal.

pub mod memory;

pub use memory::MemoryStore;

use crate::types::AcceptedArticle;

/// Store failures the engine can tell apart. `DuplicateKey` is a decision
/// signal; everything else is an infrastructure fault.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint refused the write. `field` names the
    /// violated key ("canonical_id" or "fingerprint"); `existing_id` is
    /// the canonical id of the record already holding it.
    #[error("duplicate {field}: already held by '{existing_id}'")]
    DuplicateKey {
        field: &'static str,
        existing_id: String,
    },
    /// Backend fault (I/O, connection, serialization). Propagates to the
    /// caller; never interpreted as a dedup decision.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait::async_trait]
pub trait ArticleStore: Send + Sync {
    /// Indexed lookup by canonical identity.
    async fn find_by_canonical_id(
        &self,
        canonical_id: &str,
    ) -> Result<Option<AcceptedArticle>, StoreError>;

    /// Indexed lookup by content fingerprint.
    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<AcceptedArticle>, StoreError>;

    /// Working set for near-duplicate scanning: every record accepted at
    /// or after `since_unix`. No ordering guarantee.
    async fn recent_accepted(&self, since_unix: u64) -> Result<Vec<AcceptedArticle>, StoreError>;

    /// Inserts a new record, enforcing uniqueness on `canonical_id` and,
    /// when present, `fingerprint`. Check and insert are atomic.
    async fn insert_accepted(&self, article: AcceptedArticle) -> Result<(), StoreError>;

    /// Sets the fingerprint on a legacy record that has none. Refuses with
    /// `DuplicateKey` when another record already holds `fingerprint`, or
    /// when the target already carries a different one.
    async fn backfill_fingerprint(
        &self,
        canonical_id: &str,
        fingerprint: &str,
    ) -> Result<(), StoreError>;
}
