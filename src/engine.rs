// src/engine.rs
//! # Dedup Engine
//! Orchestrates canonicalization, fingerprinting and near-duplicate
//! matching into one decision pipeline per candidate.
//!
//! Policy: exact identity first (indexed store lookups), then a bounded
//! similarity scan over recently accepted records, then an optimistic
//! insert. The store's uniqueness constraint is the sole concurrency
//! arbiter; a refused insert is a duplicate decision, not an error.

use std::sync::Arc;

use anyhow::Result;
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram,
};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::canonical::Canonicalizer;
use crate::config::{DedupConfig, RecencyWindow};
use crate::fingerprint::{hash_normalized, normalize_content};
use crate::similarity::{ArticleKey, NearDupMatcher};
use crate::store::{ArticleStore, StoreError};
use crate::types::{AcceptedArticle, BatchResult, CandidateArticle, Decision, RejectReason};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "dedup_candidates_total",
            "Candidates seen by the dedup engine."
        );
        describe_counter!("dedup_accepted_total", "Candidates accepted as new.");
        describe_counter!(
            "dedup_rejected_exact_total",
            "Candidates rejected on exact identity or fingerprint."
        );
        describe_counter!(
            "dedup_rejected_near_total",
            "Candidates rejected as near-duplicates."
        );
        describe_counter!(
            "dedup_rejected_invalid_total",
            "Candidates rejected for missing required fields."
        );
        describe_counter!(
            "dedup_insert_races_total",
            "Optimistic inserts refused by the store uniqueness constraint."
        );
        describe_histogram!(
            "dedup_working_set_size",
            "Records scanned per near-duplicate pass."
        );
        describe_gauge!(
            "dedup_last_batch_ts",
            "Unix ts when a dedup batch last completed."
        );
    });
}

fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

pub struct DedupEngine {
    store: Arc<dyn ArticleStore>,
    canonicalizer: Canonicalizer,
    matcher: NearDupMatcher,
    window: RecencyWindow,
}

impl DedupEngine {
    /// Fails only on invalid configuration (bad id-extraction regex).
    pub fn new(store: Arc<dyn ArticleStore>, cfg: &DedupConfig) -> Result<Self> {
        ensure_metrics_described();
        Ok(Self {
            store,
            canonicalizer: Canonicalizer::from_config(cfg)?,
            matcher: NearDupMatcher::new(
                cfg.title_similarity_threshold,
                cfg.body_similarity_threshold,
            ),
            window: cfg.recency_window(),
        })
    }

    /// Decide one candidate and persist it when genuinely new.
    ///
    /// Every per-candidate condition resolves to a `Decision`; only a
    /// store backend fault comes back as `Err`.
    pub async fn ingest_one(&self, candidate: &CandidateArticle) -> Result<Decision> {
        counter!("dedup_candidates_total").increment(1);

        // 1) Required fields. Whitespace-only counts as missing.
        if candidate.title.trim().is_empty() {
            return Ok(self.reject_invalid(candidate, RejectReason::MissingTitle));
        }
        if candidate.raw_url.trim().is_empty() {
            return Ok(self.reject_invalid(candidate, RejectReason::MissingUrl));
        }

        // 2) Identity and fingerprint. Text that normalizes to nothing
        //    gets no fingerprint at all rather than the hash of "".
        let canonical_id = self
            .canonicalizer
            .canonicalize(&candidate.source, &candidate.raw_url);
        let norm_title = normalize_content(&candidate.title);
        let norm_body = normalize_content(&candidate.body);
        let fingerprint = if !norm_body.is_empty() {
            Some(hash_normalized(&norm_body))
        } else if !norm_title.is_empty() {
            Some(hash_normalized(&norm_title))
        } else {
            None
        };

        // 3) Exact canonical identity (indexed lookup).
        if let Some(existing) = self.store.find_by_canonical_id(&canonical_id).await? {
            if existing.fingerprint.is_none() {
                self.backfill_missing_fingerprint(&existing).await?;
            }
            return Ok(self.reject_duplicate(
                candidate,
                RejectReason::CanonicalMatch,
                canonical_id,
                existing.canonical_id,
            ));
        }

        // 4) Exact content fingerprint (indexed lookup).
        if let Some(fp) = &fingerprint {
            if let Some(existing) = self.store.find_by_fingerprint(fp).await? {
                return Ok(self.reject_duplicate(
                    candidate,
                    RejectReason::FingerprintMatch,
                    canonical_id,
                    existing.canonical_id,
                ));
            }
        }

        // 5) Near-duplicate scan over the recent working set.
        let now = now_unix();
        let cutoff = self.window.cutoff_unix(now);
        let working_set = self.store.recent_accepted(cutoff).await?;
        histogram!("dedup_working_set_size").record(working_set.len() as f64);

        let key = ArticleKey::from_normalized(
            canonical_id.clone(),
            fingerprint.clone(),
            norm_title,
            norm_body,
        );
        for rec in &working_set {
            let rec_key = ArticleKey::for_record(rec);
            if let Some(rule) = self.matcher.near_duplicate_rule(&key, &rec_key) {
                debug!(
                    source = %candidate.source,
                    rule = rule.as_str(),
                    matched = %rec.canonical_id,
                    "near-duplicate in working set"
                );
                return Ok(self.reject_duplicate(
                    candidate,
                    RejectReason::NearDuplicate,
                    canonical_id,
                    rec.canonical_id.clone(),
                ));
            }
        }

        // 6) Optimistic insert. A constraint refusal means someone else
        //    accepted the same identity while we were deciding.
        let record = AcceptedArticle {
            canonical_id: canonical_id.clone(),
            fingerprint,
            source: candidate.source.clone(),
            url: candidate.raw_url.clone(),
            title: candidate.title.clone(),
            body: candidate.body.clone(),
            published_at: candidate.published_at,
            accepted_at: now,
        };
        match self.store.insert_accepted(record).await {
            Ok(()) => {
                counter!("dedup_accepted_total").increment(1);
                debug!(source = %candidate.source, id = %canonical_id, "candidate accepted");
                Ok(Decision::accepted(canonical_id))
            }
            Err(StoreError::DuplicateKey { field, existing_id }) => {
                counter!("dedup_insert_races_total").increment(1);
                debug!(
                    source = %candidate.source,
                    field,
                    existing = %existing_id,
                    "insert refused by uniqueness constraint"
                );
                Ok(self.reject_duplicate(
                    candidate,
                    RejectReason::ConcurrentInsert,
                    canonical_id,
                    existing_id,
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deduplicate one scrape cycle. Candidates run through the
    /// `ingest_one` path in input order; within the batch the first
    /// instance of a duplicate group is the one that survives.
    pub async fn dedup_batch(&self, candidates: Vec<CandidateArticle>) -> Result<BatchResult> {
        let total = candidates.len();
        let mut out = BatchResult::default();

        for candidate in candidates {
            let decision = self.ingest_one(&candidate).await?;
            match decision.reason {
                None => out.accepted.push(candidate),
                Some(reason) => out.rejected.push((candidate, reason)),
            }
        }

        gauge!("dedup_last_batch_ts").set(now_unix() as f64);
        info!(
            total,
            accepted = out.accepted.len(),
            rejected = out.rejected.len(),
            "dedup batch complete"
        );
        Ok(out)
    }

    fn reject_invalid(&self, candidate: &CandidateArticle, reason: RejectReason) -> Decision {
        counter!("dedup_rejected_invalid_total").increment(1);
        debug!(
            source = %candidate.source,
            reason = reason.as_str(),
            "candidate rejected as invalid"
        );
        Decision::invalid(reason)
    }

    fn reject_duplicate(
        &self,
        candidate: &CandidateArticle,
        reason: RejectReason,
        canonical_id: String,
        matched_identity: String,
    ) -> Decision {
        match reason {
            RejectReason::NearDuplicate => {
                counter!("dedup_rejected_near_total").increment(1);
            }
            _ => {
                counter!("dedup_rejected_exact_total").increment(1);
            }
        }
        debug!(
            source = %candidate.source,
            reason = reason.as_str(),
            matched = %matched_identity,
            "candidate rejected as duplicate"
        );
        Decision::duplicate(reason, canonical_id, matched_identity)
    }

    /// Legacy records predate fingerprinting; give them one the first
    /// time an exact canonical match surfaces them. Losing a uniqueness
    /// race here is logged and skipped, never fatal.
    async fn backfill_missing_fingerprint(&self, existing: &AcceptedArticle) -> Result<()> {
        let norm_body = normalize_content(&existing.body);
        let norm = if !norm_body.is_empty() {
            norm_body
        } else {
            normalize_content(&existing.title)
        };
        if norm.is_empty() {
            return Ok(());
        }
        let fp = hash_normalized(&norm);

        match self
            .store
            .backfill_fingerprint(&existing.canonical_id, &fp)
            .await
        {
            Ok(()) => {
                debug!(id = %existing.canonical_id, "backfilled missing fingerprint");
                Ok(())
            }
            Err(StoreError::DuplicateKey { existing_id, .. }) => {
                warn!(
                    id = %existing.canonical_id,
                    holder = %existing_id,
                    "fingerprint backfill conflicts with existing record, skipping"
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
