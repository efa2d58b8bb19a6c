//! The JSON routes for scoring and listing transactions.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    app_state::TransactionsViewState,
    features::RawFeatures,
    pipeline::ScoringPipeline,
    transaction::ScoredTransaction,
};

/// The confirmation sent by [add_transaction_json] on success.
pub const ADD_FORM_SUCCESS_MESSAGE: &str = "Transaction processed successfully";

/// The body of a scoring request, e.g. `{"features": [1.0, 2.5]}`.
///
/// A missing or `null` `features` field is accepted here and rejected by the
/// validator, so the client gets the usual validation error.
#[derive(Debug, Deserialize, Serialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub features: Option<Vec<f64>>,
}

#[derive(Debug, Serialize)]
struct CheckResponse {
    fraud: bool,
}

#[derive(Debug, Serialize)]
struct AddFormResponse {
    fraud: bool,
    message: &'static str,
}

/// Score the transaction in the request body and return the verdict.
pub async fn check_transaction(
    State(pipeline): State<ScoringPipeline>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection_response(rejection),
    };

    match pipeline.submit(RawFeatures::List(request.features)).await {
        Ok(transaction) => Json(CheckResponse {
            fraud: transaction.fraud,
        })
        .into_response(),
        Err(error) => error.into_response(),
    }
}

/// Same as [check_transaction], with a confirmation message for the add form.
pub async fn add_transaction_json(
    State(pipeline): State<ScoringPipeline>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection_response(rejection),
    };

    match pipeline.submit(RawFeatures::List(request.features)).await {
        Ok(transaction) => Json(AddFormResponse {
            fraud: transaction.fraud,
            message: ADD_FORM_SUCCESS_MESSAGE,
        })
        .into_response(),
        Err(error) => error.into_response(),
    }
}

/// List every scored transaction in the order they were saved.
pub async fn get_all_transactions(State(state): State<TransactionsViewState>) -> Response {
    match state.transaction_store.find_all() {
        Ok(transactions) => Json::<Vec<ScoredTransaction>>(transactions).into_response(),
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": error.kind(),
                "detail": error.to_string(),
            })),
        )
            .into_response(),
    }
}

/// The body is not JSON or does not have the expected shape.
fn json_rejection_response(rejection: JsonRejection) -> Response {
    tracing::info!("rejected JSON body: {}", rejection.body_text());

    (
        rejection.status(),
        Json(json!({
            "error": "invalid_request",
            "detail": rejection.body_text(),
        })),
    )
        .into_response()
}
