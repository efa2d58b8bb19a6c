//! Fraudcheck is a web app for screening card transactions for fraud.
//!
//! Transactions are described by a vector of numeric features. Each one is
//! validated, scored by an external fraud model over HTTP, and the verdict is
//! saved to a SQLite database. The saved transactions can be browsed in
//! server-rendered HTML pages, summarized on a dashboard, exported as a CSV
//! report, or fetched as JSON.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::response::{IntoResponse, Response};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod api;
mod app_state;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod features;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod pipeline;
mod report;
mod routing;
mod score_client;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use features::{
    FeatureValidator, FeatureVector, MODEL_FEATURE_COUNT, RawFeatures, ValidationError,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pipeline::{PipelineError, ScoringPipeline};
pub use routing::build_router;
pub use score_client::{
    DEFAULT_SCORE_ENDPOINT_URL, DEFAULT_SCORE_TIMEOUT, FraudScorer, HttpScoreClient,
    ScoreClientConfig, ScoreError, ScoreResult,
};
pub use timezone::get_local_offset;
pub use transaction::{
    SQLiteTransactionStore, ScoredTransaction, ScoredTransactionBuilder, StorageError,
    TransactionStore,
};

use crate::internal_server_error::InternalServerError;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur while rendering pages and reports.
///
/// Errors from submitting a transaction are described by [PipelineError].
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The scored transactions could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The CSV report could not be written.
    #[error("could not write the report: {0}")]
    ReportError(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::Storage(StorageError::ReadFailure(_)) => InternalServerError {
                description: "Could not load transactions",
                fix: "The database could not be read. Try again later or check the server logs",
            }
            .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{
        Error, StorageError,
        test_utils::{assert_valid_html, parse_html_document},
    };

    #[tokio::test]
    async fn errors_render_500_page() {
        let errors = [
            Error::InvalidTimezoneError("Middle/Earth".to_owned()),
            Error::Storage(StorageError::ReadFailure("locked".to_owned())),
            Error::ReportError("broken pipe".to_owned()),
        ];

        for error in errors {
            let response = error.into_response();

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let html = parse_html_document(response).await;
            assert_valid_html(&html);
        }
    }

    #[tokio::test]
    async fn timezone_error_names_timezone() {
        let response = Error::InvalidTimezoneError("Middle/Earth".to_owned()).into_response();

        let html = parse_html_document(response).await;
        assert!(html.html().contains("Middle/Earth"));
    }
}
