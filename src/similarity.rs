// src/similarity.rs
//! Near-duplicate matching between a candidate and already-accepted
//! records. Layered decision: exact identity first, then fingerprint, then
//! normalized title similarity, then a bounded body-prefix similarity.

use serde::{Deserialize, Serialize};

use crate::fingerprint::normalize_content;
use crate::types::AcceptedArticle;

/// Body similarity is computed on at most this many normalized chars per
/// side, applied to both sides equally so the relation stays symmetric.
pub const BODY_COMPARE_PREFIX_CHARS: usize = 2000;

/// Which layer of the decision rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    CanonicalId,
    Fingerprint,
    Title,
    Body,
}

impl MatchRule {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchRule::CanonicalId => "canonical_id",
            MatchRule::Fingerprint => "fingerprint",
            MatchRule::Title => "title",
            MatchRule::Body => "body",
        }
    }
}

/// Precomputed comparison key for one article. Normalizes text once so a
/// working-set scan does not re-normalize the candidate per record.
#[derive(Debug, Clone)]
pub struct ArticleKey {
    pub canonical_id: String,
    pub fingerprint: Option<String>,
    norm_title: String,
    norm_body: String,
}

impl ArticleKey {
    pub fn new(
        canonical_id: impl Into<String>,
        fingerprint: Option<String>,
        title: &str,
        body: &str,
    ) -> Self {
        Self::from_normalized(
            canonical_id,
            fingerprint,
            normalize_content(title),
            normalize_content(body),
        )
    }

    /// Build from already-normalized text. Callers that normalized once
    /// for fingerprinting (the engine) avoid a second pass.
    pub fn from_normalized(
        canonical_id: impl Into<String>,
        fingerprint: Option<String>,
        norm_title: String,
        mut norm_body: String,
    ) -> Self {
        if norm_body.chars().count() > BODY_COMPARE_PREFIX_CHARS {
            norm_body = norm_body.chars().take(BODY_COMPARE_PREFIX_CHARS).collect();
        }
        Self {
            canonical_id: canonical_id.into(),
            fingerprint,
            norm_title,
            norm_body,
        }
    }

    pub fn for_record(rec: &AcceptedArticle) -> Self {
        Self::new(
            rec.canonical_id.clone(),
            rec.fingerprint.clone(),
            &rec.title,
            &rec.body,
        )
    }
}

/// Normalized sequence-similarity ratio in `[0, 1]`.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Threshold-driven near-duplicate matcher. Symmetric by construction:
/// every layer compares both sides with the same operation.
#[derive(Debug, Clone)]
pub struct NearDupMatcher {
    title_threshold: f64,
    body_threshold: f64,
}

impl NearDupMatcher {
    pub fn new(title_threshold: f64, body_threshold: f64) -> Self {
        Self {
            title_threshold: title_threshold.clamp(0.0, 1.0),
            body_threshold: body_threshold.clamp(0.0, 1.0),
        }
    }

    /// First rule that fires, in layer order, or `None`. Empty sides never
    /// match vacuously: equal-but-empty titles or bodies skip their layer.
    pub fn near_duplicate_rule(&self, a: &ArticleKey, b: &ArticleKey) -> Option<MatchRule> {
        if !a.canonical_id.is_empty() && a.canonical_id == b.canonical_id {
            return Some(MatchRule::CanonicalId);
        }

        if let (Some(fa), Some(fb)) = (&a.fingerprint, &b.fingerprint) {
            if fa == fb {
                return Some(MatchRule::Fingerprint);
            }
        }

        if !a.norm_title.is_empty()
            && !b.norm_title.is_empty()
            && similarity_ratio(&a.norm_title, &b.norm_title) >= self.title_threshold
        {
            return Some(MatchRule::Title);
        }

        if !a.norm_body.is_empty()
            && !b.norm_body.is_empty()
            && similarity_ratio(&a.norm_body, &b.norm_body) >= self.body_threshold
        {
            return Some(MatchRule::Body);
        }

        None
    }

    pub fn is_near_duplicate(&self, a: &ArticleKey, b: &ArticleKey) -> bool {
        self.near_duplicate_rule(a, b).is_some()
    }
}
