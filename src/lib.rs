// src/lib.rs
// Public library surface for the ingestion pipeline (and integration tests).

pub mod canonical;
pub mod config;
pub mod engine;
pub mod fingerprint;
pub mod similarity;
pub mod store;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::canonical::Canonicalizer;
pub use crate::config::{load_config_default, load_config_from, DedupConfig, RecencyWindow};
pub use crate::engine::DedupEngine;
pub use crate::fingerprint::{fingerprint, normalize_content};
pub use crate::similarity::{
    similarity_ratio, ArticleKey, MatchRule, NearDupMatcher, BODY_COMPARE_PREFIX_CHARS,
};
pub use crate::store::{ArticleStore, MemoryStore, StoreError};
pub use crate::types::{
    AcceptedArticle, BatchResult, CandidateArticle, Decision, DecisionState, RejectReason,
};
