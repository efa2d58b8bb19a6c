use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::{
    database_id::TransactionId,
    features::FeatureVector,
    score_client::{FraudScorer, ScoreError, ScoreResult},
    transaction::{ScoredTransaction, ScoredTransactionBuilder, StorageError, TransactionStore},
};

/// A scorer that always gives the same answer and counts how often it is asked.
pub(crate) struct StubScorer {
    result: Result<ScoreResult, ScoreError>,
    calls: AtomicUsize,
}

impl StubScorer {
    pub(crate) fn returning(fraud: bool) -> Self {
        Self {
            result: Ok(ScoreResult { fraud }),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(error: ScoreError) -> Self {
        Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FraudScorer for StubScorer {
    async fn score(&self, _features: &FeatureVector) -> Result<ScoreResult, ScoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// A store where every read and write fails.
pub(crate) struct FailingStore;

impl TransactionStore for FailingStore {
    fn save(&self, _transaction: &ScoredTransactionBuilder) -> Result<TransactionId, StorageError> {
        Err(StorageError::WriteFailure("disk I/O error".to_owned()))
    }

    fn find_all(&self) -> Result<Vec<ScoredTransaction>, StorageError> {
        Err(StorageError::ReadFailure("disk I/O error".to_owned()))
    }
}
