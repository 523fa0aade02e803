// tests/dedup_race.rs
// Concurrent acceptance of the same story: the store's uniqueness
// constraint, not any in-process lock, decides who wins.

use std::sync::Arc;

use newswire_dedup::{
    AcceptedArticle, ArticleStore, CandidateArticle, DecisionState, DedupConfig, DedupEngine,
    MemoryStore, RejectReason, StoreError,
};

/// Store double that hides existing records from every lookup, forcing
/// each caller down the optimistic-insert path. Inserts still hit the
/// real constraint, which makes the race deterministic to provoke.
struct RacingStore {
    inner: MemoryStore,
}

impl RacingStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
        }
    }
}

#[async_trait::async_trait]
impl ArticleStore for RacingStore {
    async fn find_by_canonical_id(
        &self,
        _canonical_id: &str,
    ) -> Result<Option<AcceptedArticle>, StoreError> {
        Ok(None)
    }

    async fn find_by_fingerprint(
        &self,
        _fingerprint: &str,
    ) -> Result<Option<AcceptedArticle>, StoreError> {
        Ok(None)
    }

    async fn recent_accepted(&self, _since_unix: u64) -> Result<Vec<AcceptedArticle>, StoreError> {
        Ok(Vec::new())
    }

    async fn insert_accepted(&self, article: AcceptedArticle) -> Result<(), StoreError> {
        self.inner.insert_accepted(article).await
    }

    async fn backfill_fingerprint(
        &self,
        canonical_id: &str,
        fingerprint: &str,
    ) -> Result<(), StoreError> {
        self.inner.backfill_fingerprint(canonical_id, fingerprint).await
    }
}

fn cand(url: &str, title: &str, body: &str) -> CandidateArticle {
    CandidateArticle {
        source: "Reuters".to_string(),
        raw_url: url.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        published_at: 1_700_000_000,
    }
}

#[tokio::test]
async fn constraint_refusal_becomes_a_concurrent_insert_rejection() {
    let store = Arc::new(RacingStore::new());
    let eng = DedupEngine::new(store.clone(), &DedupConfig::default()).unwrap();

    let c = cand("https://a.example/fed", "Fed holds rates steady", "");
    let d1 = eng.ingest_one(&c).await.unwrap();
    assert!(d1.is_accepted());

    // Lookups claim the story is unknown, so the second call reaches the
    // insert and collides there.
    let d2 = eng.ingest_one(&c).await.unwrap();
    assert_eq!(d2.state, DecisionState::RejectedExact);
    assert_eq!(d2.reason, Some(RejectReason::ConcurrentInsert));
    assert_eq!(d2.matched_identity.as_deref(), Some("https://a.example/fed"));
    assert_eq!(store.inner.len(), 1);
}

#[tokio::test]
async fn fingerprint_constraint_also_resolves_the_race() {
    let store = Arc::new(RacingStore::new());
    let eng = DedupEngine::new(store.clone(), &DedupConfig::default()).unwrap();

    let body = "Oil prices climbed two percent after OPEC announced deeper output cuts.";
    let d1 = eng.ingest_one(&cand("https://a.example/oil", "Oil climbs", body)).await.unwrap();
    assert!(d1.is_accepted());

    // Different URL, identical content: the canonical key is free but the
    // fingerprint key is taken.
    let d2 = eng
        .ingest_one(&cand("https://b.example/opec", "OPEC cuts lift crude", body))
        .await
        .unwrap();
    assert_eq!(d2.reason, Some(RejectReason::ConcurrentInsert));
    assert_eq!(d2.matched_identity.as_deref(), Some("https://a.example/oil"));
    assert_eq!(store.inner.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_ingests_accept_exactly_one() {
    let store = Arc::new(RacingStore::new());
    let eng = Arc::new(DedupEngine::new(store.clone(), &DedupConfig::default()).unwrap());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let eng = eng.clone();
        handles.push(tokio::spawn(async move {
            let c = cand(
                "https://a.example/jobs-report",
                "Payrolls surprise to the upside",
                "Employers added far more jobs than forecast last month.",
            );
            eng.ingest_one(&c).await.unwrap()
        }));
    }

    let mut accepted = 0;
    let mut raced = 0;
    for h in handles {
        let d = h.await.unwrap();
        match d.state {
            DecisionState::Accepted => accepted += 1,
            DecisionState::RejectedExact => {
                assert_eq!(d.reason, Some(RejectReason::ConcurrentInsert));
                raced += 1;
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(raced, 7);
    assert_eq!(store.inner.len(), 1);
}
