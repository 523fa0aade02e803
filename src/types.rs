// src/types.rs
//! Core data types: scraped candidates, persisted records, and the
//! per-candidate decision surface returned to the ingestion pipeline.

use serde::{Deserialize, Serialize};

/// One freshly scraped article. Transient: it exists only while the scrape
/// cycle that produced it is being deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateArticle {
    /// Wire source name, e.g. "Reuters", "MarketWatch".
    pub source: String,
    /// URL exactly as scraped, tracking parameters and all.
    pub raw_url: String,
    pub title: String,
    /// May be empty; headline-only feeds carry no body.
    pub body: String,
    /// Unix seconds.
    pub published_at: u64,
}

/// Persisted record of an accepted article. Created once on acceptance and
/// never mutated afterwards, except for late backfill of a missing
/// fingerprint. Raw title/body are retained for later similarity scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedArticle {
    /// Unique across all records.
    pub canonical_id: String,
    /// SHA-256 hex over the normalized body (or title when the body is
    /// empty). Unique across all records; `None` only on legacy records
    /// that predate fingerprinting.
    pub fingerprint: Option<String>,
    pub source: String,
    /// Raw URL as scraped, kept for reference.
    pub url: String,
    pub title: String,
    pub body: String,
    /// Unix seconds.
    pub published_at: u64,
    /// Unix seconds, set at acceptance time.
    pub accepted_at: u64,
}

/// Terminal state of one candidate's trip through the decision pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionState {
    Accepted,
    RejectedExact,
    RejectedNearDuplicate,
    RejectedInvalid,
}

/// Machine-readable rejection reason, surfaced so the pipeline can report
/// duplicate rates per source without parsing log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Required `title` missing or blank.
    MissingTitle,
    /// Required `raw_url` missing or blank.
    MissingUrl,
    /// Indexed lookup found a record with the same canonical identity.
    CanonicalMatch,
    /// Indexed lookup found a record with the same content fingerprint.
    FingerprintMatch,
    /// The working-set scan found a near-duplicate.
    NearDuplicate,
    /// The store's uniqueness constraint fired on insert: another task
    /// accepted the same identity concurrently.
    ConcurrentInsert,
}

impl RejectReason {
    /// Terminal state this reason maps to.
    pub fn state(self) -> DecisionState {
        match self {
            RejectReason::MissingTitle | RejectReason::MissingUrl => DecisionState::RejectedInvalid,
            RejectReason::CanonicalMatch
            | RejectReason::FingerprintMatch
            | RejectReason::ConcurrentInsert => DecisionState::RejectedExact,
            RejectReason::NearDuplicate => DecisionState::RejectedNearDuplicate,
        }
    }

    /// Wire name, for log fields and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::MissingTitle => "missing_title",
            RejectReason::MissingUrl => "missing_url",
            RejectReason::CanonicalMatch => "canonical_match",
            RejectReason::FingerprintMatch => "fingerprint_match",
            RejectReason::NearDuplicate => "near_duplicate",
            RejectReason::ConcurrentInsert => "concurrent_insert",
        }
    }
}

/// Outcome for a single candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub state: DecisionState,
    /// Canonical identity computed for the candidate. `None` only when the
    /// candidate never reached canonicalization (`rejected_invalid`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_id: Option<String>,
    /// Identity of the stored record this candidate collided with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_identity: Option<String>,
    /// `None` exactly when accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
}

impl Decision {
    /// The candidate was genuinely new and has been persisted.
    pub fn accepted(canonical_id: impl Into<String>) -> Self {
        Self {
            state: DecisionState::Accepted,
            canonical_id: Some(canonical_id.into()),
            matched_identity: None,
            reason: None,
        }
    }

    /// The candidate failed field validation and never reached matching.
    pub fn invalid(reason: RejectReason) -> Self {
        Self {
            state: reason.state(),
            canonical_id: None,
            matched_identity: None,
            reason: Some(reason),
        }
    }

    /// The candidate matched `matched_identity` under `reason`.
    pub fn duplicate(
        reason: RejectReason,
        canonical_id: impl Into<String>,
        matched_identity: impl Into<String>,
    ) -> Self {
        Self {
            state: reason.state(),
            canonical_id: Some(canonical_id.into()),
            matched_identity: Some(matched_identity.into()),
            reason: Some(reason),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.state == DecisionState::Accepted
    }
}

/// Result of deduplicating one scrape cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Candidates accepted as new, in input order.
    pub accepted: Vec<CandidateArticle>,
    /// Rejected candidates with their reasons, in input order.
    pub rejected: Vec<(CandidateArticle, RejectReason)>,
}

impl BatchResult {
    /// Total number of candidates the batch saw.
    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }
}
