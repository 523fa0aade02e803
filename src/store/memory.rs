// src/store/memory.rs
//! In-memory reference store. Single mutex over a plain vec: small enough
//! for tests and embedded single-process deployments, and a real
//! enforcement point for the uniqueness constraints the engine relies on.

use std::sync::Mutex;

use crate::store::{ArticleStore, StoreError};
use crate::types::AcceptedArticle;

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Vec<AcceptedArticle>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("article store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of one record, for assertions and inspection.
    pub fn get(&self, canonical_id: &str) -> Option<AcceptedArticle> {
        let v = self.inner.lock().expect("article store mutex poisoned");
        v.iter().find(|r| r.canonical_id == canonical_id).cloned()
    }
}

#[async_trait::async_trait]
impl ArticleStore for MemoryStore {
    async fn find_by_canonical_id(
        &self,
        canonical_id: &str,
    ) -> Result<Option<AcceptedArticle>, StoreError> {
        let v = self.inner.lock().expect("article store mutex poisoned");
        Ok(v.iter().find(|r| r.canonical_id == canonical_id).cloned())
    }

    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<AcceptedArticle>, StoreError> {
        let v = self.inner.lock().expect("article store mutex poisoned");
        Ok(v.iter()
            .find(|r| r.fingerprint.as_deref() == Some(fingerprint))
            .cloned())
    }

    async fn recent_accepted(&self, since_unix: u64) -> Result<Vec<AcceptedArticle>, StoreError> {
        let v = self.inner.lock().expect("article store mutex poisoned");
        Ok(v.iter()
            .filter(|r| r.accepted_at >= since_unix)
            .cloned()
            .collect())
    }

    async fn insert_accepted(&self, article: AcceptedArticle) -> Result<(), StoreError> {
        // One lock held across check and push keeps the constraint atomic.
        let mut v = self.inner.lock().expect("article store mutex poisoned");

        if let Some(existing) = v.iter().find(|r| r.canonical_id == article.canonical_id) {
            return Err(StoreError::DuplicateKey {
                field: "canonical_id",
                existing_id: existing.canonical_id.clone(),
            });
        }
        if let Some(fp) = &article.fingerprint {
            if let Some(existing) = v.iter().find(|r| r.fingerprint.as_deref() == Some(fp)) {
                return Err(StoreError::DuplicateKey {
                    field: "fingerprint",
                    existing_id: existing.canonical_id.clone(),
                });
            }
        }

        v.push(article);
        Ok(())
    }

    async fn backfill_fingerprint(
        &self,
        canonical_id: &str,
        fingerprint: &str,
    ) -> Result<(), StoreError> {
        let mut v = self.inner.lock().expect("article store mutex poisoned");

        if let Some(other) = v.iter().find(|r| {
            r.canonical_id != canonical_id && r.fingerprint.as_deref() == Some(fingerprint)
        }) {
            return Err(StoreError::DuplicateKey {
                field: "fingerprint",
                existing_id: other.canonical_id.clone(),
            });
        }

        let rec = v
            .iter_mut()
            .find(|r| r.canonical_id == canonical_id)
            .ok_or_else(|| anyhow::anyhow!("backfill target '{canonical_id}' not found"))?;

        match rec.fingerprint.as_deref() {
            None => {
                rec.fingerprint = Some(fingerprint.to_string());
                Ok(())
            }
            Some(current) if current == fingerprint => Ok(()),
            Some(_) => Err(StoreError::DuplicateKey {
                field: "fingerprint",
                existing_id: rec.canonical_id.clone(),
            }),
        }
    }
}
