//! The scoring pipeline: validate, score, then persist.
//!
//! Every entry point that accepts a transaction goes through
//! [ScoringPipeline::submit], so a record only reaches the store once it has
//! valid features and a verdict from the fraud model.

use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    features::{FeatureValidator, RawFeatures, ValidationError},
    score_client::{FraudScorer, ScoreError, ScoreResult},
    transaction::{ScoredTransaction, StorageError, TransactionStore},
};

/// The ways that submitting a transaction can fail.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum PipelineError {
    /// The features were rejected before the model was called.
    #[error("invalid features: {0}")]
    Invalid(#[from] ValidationError),

    /// The model could not produce a verdict, nothing was saved.
    #[error("scoring failed: {0}")]
    ScoringUnavailable(#[from] ScoreError),

    /// The model produced a verdict but the record could not be saved.
    ///
    /// The verdict is still valid, but it will not show up in the
    /// transaction list or the dashboard.
    #[error("the transaction was scored (fraud: {fraud}) but could not be saved: {source}")]
    StorageFailure {
        /// The verdict from the model.
        fraud: bool,
        /// Why the record was not saved.
        source: StorageError,
    },
}

impl PipelineError {
    /// The HTTP status code that best describes the error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Invalid(_) => StatusCode::BAD_REQUEST,
            PipelineError::ScoringUnavailable(error) => error.status_code(),
            PipelineError::StorageFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// A short, stable name for the error for API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Invalid(error) => error.kind(),
            PipelineError::ScoringUnavailable(error) => error.kind(),
            PipelineError::StorageFailure { source, .. } => source.kind(),
        }
    }
}

/// Renders the error as `{"error": kind, "detail": message}`.
///
/// Storage failures also carry the verdict under `"fraud"`.
impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            PipelineError::StorageFailure { fraud, .. } => json!({
                "error": self.kind(),
                "detail": self.to_string(),
                "fraud": fraud,
            }),
            _ => json!({
                "error": self.kind(),
                "detail": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Validates, scores and stores transactions.
#[derive(Clone)]
pub struct ScoringPipeline {
    validator: FeatureValidator,
    scorer: Arc<dyn FraudScorer>,
    store: Arc<dyn TransactionStore>,
}

impl ScoringPipeline {
    /// Create a pipeline that scores with `scorer` and saves to `store`.
    pub fn new(
        validator: FeatureValidator,
        scorer: Arc<dyn FraudScorer>,
        store: Arc<dyn TransactionStore>,
    ) -> Self {
        Self {
            validator,
            scorer,
            store,
        }
    }

    /// The validator applied to every submission.
    pub fn validator(&self) -> FeatureValidator {
        self.validator
    }

    /// Validate `raw`, score it, and save the result.
    ///
    /// The scorer is only called with valid features, and the store is only
    /// written to after the scorer returns a verdict. Nothing is retried.
    ///
    /// # Errors
    /// Returns a:
    /// - [PipelineError::Invalid] if the features are rejected,
    /// - [PipelineError::ScoringUnavailable] if the model call fails,
    /// - or [PipelineError::StorageFailure] if the verdict could not be saved.
    pub async fn submit(&self, raw: RawFeatures) -> Result<ScoredTransaction, PipelineError> {
        let features = self
            .validator
            .validate(raw)
            .inspect_err(|error| tracing::info!("rejected features: {error}"))?;

        let ScoreResult { fraud } = self
            .scorer
            .score(&features)
            .await
            .inspect_err(|error| tracing::error!("could not score transaction: {error}"))?;

        let transaction = ScoredTransaction::build(features, fraud);

        match self.store.save(&transaction) {
            Ok(id) => {
                tracing::info!(id, fraud, "saved scored transaction");
                Ok(transaction.finalize(id))
            }
            Err(source) => {
                tracing::error!(
                    fraud,
                    "scored a transaction but could not save it, it will be missing from the \
                    transaction list and dashboard: {source}"
                );
                Err(PipelineError::StorageFailure { fraud, source })
            }
        }
    }
}
