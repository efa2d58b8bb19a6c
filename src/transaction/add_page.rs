//! The page and form handler for submitting a transaction for scoring.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
// Must use axum_extra's Form since that treats a missing field as a
// deserialization default instead of rejecting the request.
use axum_extra::extract::Form;
use axum_htmx::{HxRedirect, HxRequest};
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    alert::Alert,
    endpoints,
    features::{RawFeatures, ValidationError},
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base, loading_spinner,
    },
    navigation::NavBar,
    pipeline::{PipelineError, ScoringPipeline},
    score_client::ScoreError,
};

/// A transaction from the public credit card fraud dataset, amount last.
const SAMPLE_FEATURES: &str = "-1.35980713, -0.07278117, 2.536346738, 1.378155224, \
    -0.338320769, -0.482842646, -0.498539999, -0.238432864, 0.803611294, -0.254988554, \
    -1.506858318, -0.617800586, -0.065963517, -0.678892888, -0.156421964, 1.943464899, \
    -1.015454045, -0.651493476, -0.412098806, 0.502292224, -0.460379354, -0.514389781, \
    -0.685291014, -0.295132678, -0.147242254, 0.095126945, -0.150568242, -0.097193031, 149.62";

/// Keeps `#feature-count` in step with the textarea while typing.
const COUNT_FEATURES_SCRIPT: &str = "document.getElementById('feature-count').textContent = \
    this.value.split(',').filter(token => token.trim() !== '').length";

/// The form data for submitting a transaction.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AddTransactionForm {
    /// Comma-separated feature values, e.g. "1.0, 2.5, -3.0".
    #[serde(default)]
    pub features: String,
}

/// What went wrong with the last submission, if anything.
enum FormError<'a> {
    /// Shown under the features input.
    Field(String),
    /// Shown as an alert at the top of the form.
    Alert(Alert<'a>),
}

/// Renders the page for submitting a transaction.
pub async fn get_add_transaction_page(State(pipeline): State<ScoringPipeline>) -> Response {
    add_transaction_view("", pipeline.validator().expected_count(), None).into_response()
}

/// Score the submitted transaction and redirect to the transactions list.
///
/// On failure the form is sent back with the submitted text and an error
/// message. htmx requests get just the form, other requests the whole page.
pub async fn submit_add_transaction_form(
    State(pipeline): State<ScoringPipeline>,
    HxRequest(is_htmx): HxRequest,
    Form(form): Form<AddTransactionForm>,
) -> Response {
    let error = match pipeline.submit(RawFeatures::Text(form.features.clone())).await {
        Ok(_) if is_htmx => {
            return (
                HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response();
        }
        Ok(_) => return Redirect::to(endpoints::TRANSACTIONS_VIEW).into_response(),
        Err(error) => error,
    };

    let status = error.status_code();
    let details = error_details(&error);
    let form_error = match &error {
        PipelineError::Invalid(validation_error) => {
            FormError::Field(validation_message(validation_error))
        }
        PipelineError::ScoringUnavailable(_) => {
            FormError::Alert(Alert::error("Could not score the transaction", &details))
        }
        PipelineError::StorageFailure { .. } => {
            FormError::Alert(Alert::error("Could not save the transaction", &details))
        }
    };
    let expected_count = pipeline.validator().expected_count();

    if is_htmx {
        (
            status,
            add_transaction_form(&form.features, expected_count, Some(form_error)),
        )
            .into_response()
    } else {
        (
            status,
            add_transaction_view(&form.features, expected_count, Some(form_error)),
        )
            .into_response()
    }
}

fn validation_message(error: &ValidationError) -> String {
    match error {
        ValidationError::MissingFeatures => "Enter at least one feature value.".to_owned(),
        ValidationError::MalformedNumber(token) if token.is_empty() => {
            "There is an empty value in the list.".to_owned()
        }
        ValidationError::MalformedNumber(token) => format!("\"{token}\" is not a valid number."),
        ValidationError::NonFiniteValue { index } => {
            format!("Feature {} is not a finite number.", index + 1)
        }
        ValidationError::WrongLength { expected, actual } => {
            format!("Expected {expected} features, got {actual}.")
        }
    }
}

fn error_details(error: &PipelineError) -> String {
    match error {
        PipelineError::ScoringUnavailable(ScoreError::ConnectFailure(_)) => {
            "The fraud model could not be reached. Check that it is running and try again."
                .to_owned()
        }
        PipelineError::ScoringUnavailable(ScoreError::Timeout) => {
            "The fraud model did not respond in time. Try again later.".to_owned()
        }
        PipelineError::ScoringUnavailable(score_error) => format!(
            "The fraud model sent an unexpected response ({score_error}). \
            The transaction was not saved."
        ),
        PipelineError::StorageFailure { fraud, .. } => {
            let verdict = if *fraud { "fraudulent" } else { "safe" };
            format!(
                "The model classified the transaction as {verdict}, but it could not be saved \
                and will not appear in the transaction list."
            )
        }
        PipelineError::Invalid(validation_error) => validation_error.to_string(),
    }
}

/// The number of non-blank comma-separated values in `features`.
fn count_entered_features(features: &str) -> usize {
    features
        .split(',')
        .filter(|token| !token.trim().is_empty())
        .count()
}

fn add_transaction_view(
    features: &str,
    expected_count: Option<usize>,
    error: Option<FormError<'_>>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::ADD_TRANSACTION_VIEW).into_html();
    let form = add_transaction_form(features, expected_count, error);

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Add Transaction", &[], &content)
}

fn add_transaction_form(
    features: &str,
    expected_count: Option<usize>,
    error: Option<FormError<'_>>,
) -> Markup {
    let add_transaction_route = endpoints::ADD_TRANSACTION_VIEW;
    let spinner = loading_spinner();
    let current_count = count_entered_features(features);
    let (field_error, alert) = match error {
        Some(FormError::Field(message)) => (Some(message), None),
        Some(FormError::Alert(alert)) => (None, Some(alert.into_html())),
        None => (None, None),
    };

    html! {
        form
            id="add-transaction-form"
            method="post"
            action=(add_transaction_route)
            hx-post=(add_transaction_route)
            hx-target-error="this"
            hx-swap="outerHTML"
            class="w-full space-y-4 md:space-y-6"
        {
            h2 class="text-xl font-bold" { "Add Transaction" }

            @if let Some(alert) = alert {
                (alert)
            }

            div
            {
                label
                    for="features"
                    class=(FORM_LABEL_STYLE)
                {
                    "Features"
                }

                textarea
                    id="features"
                    name="features"
                    rows="6"
                    placeholder="-1.36, -0.07, 2.54, ..., 149.62"
                    required
                    autofocus
                    oninput=(COUNT_FEATURES_SCRIPT)
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (features)
                }

                p class="mt-2 text-sm text-gray-500 dark:text-gray-400"
                {
                    "Comma-separated numbers, with the transaction amount last."
                    @if let Some(count) = expected_count {
                        " The model expects " (count) " features."
                    }
                }

                p id="feature-counter" class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Current count: "
                    span id="feature-count" { (current_count) }
                    @if let Some(count) = expected_count {
                        " / " (count)
                    }
                }

                @if let Some(message) = field_error {
                    p class="text-red-500 text-base" { (message) }
                }
            }

            button
                type="button"
                class=(BUTTON_SECONDARY_STYLE)
                data-sample=(SAMPLE_FEATURES)
                onclick="const features = document.getElementById('features'); \
                    features.value = this.dataset.sample; \
                    features.dispatchEvent(new Event('input'))"
            {
                "Use Sample Data"
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span
                    id="indicator"
                    class="inline htmx-indicator"
                {
                    (spinner)
                }
                " Check Transaction"
            }
        }
    }
}


#[cfg(test)]
mod submit_add_transaction_form_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use axum_htmx::HxRequest;
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        endpoints,
        features::FeatureValidator,
        pipeline::ScoringPipeline,
        score_client::ScoreError,
        test_utils::{
            FailingStore, StubScorer, assert_form_error_message, assert_form_textarea,
            assert_hx_redirect, assert_valid_html, get_header, must_get_form,
            parse_html_document, parse_html_fragment,
        },
        transaction::{SQLiteTransactionStore, TransactionStore},
    };

    use super::{AddTransactionForm, submit_add_transaction_form};

    fn sqlite_store() -> Arc<SQLiteTransactionStore> {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        Arc::new(SQLiteTransactionStore::new(Arc::new(Mutex::new(
            connection,
        ))))
    }

    fn form(features: &str) -> Form<AddTransactionForm> {
        Form(AddTransactionForm {
            features: features.to_owned(),
        })
    }

    #[tokio::test]
    async fn redirects_to_transactions_view() {
        let store = sqlite_store();
        let pipeline = ScoringPipeline::new(
            FeatureValidator::new(),
            Arc::new(StubScorer::returning(true)),
            store.clone(),
        );

        let response =
            submit_add_transaction_form(State(pipeline), HxRequest(false), form("1.0, 2.5, -3.0"))
                .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(get_header(&response, "location"), endpoints::TRANSACTIONS_VIEW);
        let saved = store.find_all().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].features.as_slice(), &[1.0, 2.5, -3.0]);
        assert!(saved[0].fraud);
    }

    #[tokio::test]
    async fn htmx_request_gets_hx_redirect() {
        let pipeline = ScoringPipeline::new(
            FeatureValidator::new(),
            Arc::new(StubScorer::returning(false)),
            sqlite_store(),
        );

        let response =
            submit_add_transaction_form(State(pipeline), HxRequest(true), form("1.0")).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
    }

    #[tokio::test]
    async fn invalid_number_rerenders_form_with_error() {
        let store = sqlite_store();
        let scorer = Arc::new(StubScorer::returning(false));
        let pipeline = ScoringPipeline::new(FeatureValidator::new(), scorer.clone(), store.clone());

        let response =
            submit_add_transaction_form(State(pipeline), HxRequest(false), form("1.0, x, 3.0"))
                .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_textarea(&form, "features", "1.0, x, 3.0");
        assert_form_error_message(&form, "\"x\" is not a valid number.");
        assert_eq!(scorer.calls(), 0);
        assert_eq!(store.find_all().unwrap(), vec![]);
    }

    #[tokio::test]
    async fn empty_input_for_htmx_returns_form_fragment() {
        let pipeline = ScoringPipeline::new(
            FeatureValidator::new(),
            Arc::new(StubScorer::returning(false)),
            sqlite_store(),
        );

        let response =
            submit_add_transaction_form(State(pipeline), HxRequest(true), form("  ")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Enter at least one feature value.");
    }

    #[tokio::test]
    async fn scoring_failure_shows_alert() {
        let store = sqlite_store();
        let pipeline = ScoringPipeline::new(
            FeatureValidator::new(),
            Arc::new(StubScorer::failing(ScoreError::Timeout)),
            store.clone(),
        );

        let response =
            submit_add_transaction_form(State(pipeline), HxRequest(true), form("1.0")).await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Could not score the transaction"), "got {text}");
        assert!(text.contains("did not respond in time"), "got {text}");
        assert_eq!(store.find_all().unwrap(), vec![]);
    }

    #[tokio::test]
    async fn storage_failure_shows_verdict() {
        let pipeline = ScoringPipeline::new(
            FeatureValidator::new(),
            Arc::new(StubScorer::returning(true)),
            Arc::new(FailingStore),
        );

        let response =
            submit_add_transaction_form(State(pipeline), HxRequest(true), form("1.0")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Could not save the transaction"), "got {text}");
        assert!(text.contains("fraudulent"), "got {text}");
    }

    #[test]
    fn missing_field_deserializes_as_empty() {
        let form: AddTransactionForm = serde_html_form::from_str("").unwrap();

        assert_eq!(form.features, "");
    }
}
