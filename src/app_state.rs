//! Implements a struct that holds the state of the server.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    features::FeatureValidator, pipeline::ScoringPipeline, score_client::FraudScorer,
    transaction::TransactionStore,
};

/// The state of the server.
#[derive(Clone)]
pub struct AppState {
    /// Validates, scores and saves submitted transactions.
    pub pipeline: ScoringPipeline,

    /// Read access to the scored transactions for the views and reports.
    pub transaction_store: Arc<dyn TransactionStore>,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl AppState {
    /// Create a new [AppState] that scores with `scorer` and saves to `store`.
    ///
    /// The tables for `store` must already exist, see [crate::initialize_db].
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    pub fn new(
        validator: FeatureValidator,
        scorer: Arc<dyn FraudScorer>,
        store: Arc<dyn TransactionStore>,
        local_timezone: &str,
    ) -> Self {
        Self {
            pipeline: ScoringPipeline::new(validator, scorer, store.clone()),
            transaction_store: store,
            local_timezone: local_timezone.to_owned(),
        }
    }
}

impl FromRef<AppState> for ScoringPipeline {
    fn from_ref(state: &AppState) -> Self {
        state.pipeline.clone()
    }
}

/// The state needed by the pages and reports that read transactions.
#[derive(Clone)]
pub struct TransactionsViewState {
    /// The store to read scored transactions from.
    pub transaction_store: Arc<dyn TransactionStore>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
