//! The client for the external fraud-scoring model.
//!
//! The model is served over HTTP. Each call makes exactly one POST request
//! with the body `{"features": [...]}` and expects a JSON object containing a
//! boolean `fraud` field in return. There is no retrying: a failed call is
//! reported to the caller straight away.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::features::FeatureVector;

/// The scoring endpoint used when none is configured.
pub const DEFAULT_SCORE_ENDPOINT_URL: &str = "http://localhost:5000/predict";

/// How long to wait for the scoring service before giving up.
pub const DEFAULT_SCORE_TIMEOUT: Duration = Duration::from_secs(10);

/// The verdict returned by the fraud model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreResult {
    /// Whether the model classified the transaction as fraudulent.
    pub fraud: bool,
}

/// The ways that a call to the scoring service can fail.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ScoreError {
    /// The request could not be sent or the response could not be read,
    /// e.g. the service is down or refused the connection.
    #[error("could not reach the scoring service: {0}")]
    ConnectFailure(String),

    /// The scoring service did not respond within the configured timeout.
    #[error("the scoring service did not respond in time")]
    Timeout,

    /// The scoring service responded with a non-2xx status code.
    #[error("the scoring service responded with HTTP {status}")]
    NonSuccessStatus {
        /// The HTTP status code of the response.
        status: u16,
    },

    /// The response body was missing or empty.
    #[error("the scoring service sent an empty response")]
    EmptyResponse,

    /// The response body was not a JSON object.
    #[error("the scoring service sent a malformed response: {0}")]
    MalformedResponse(String),

    /// The response did not contain the `fraud` field.
    #[error("the scoring service response is missing the \"fraud\" field")]
    MissingField,

    /// The `fraud` field in the response was not a boolean.
    ///
    /// Holds the JSON type that was found instead.
    #[error("the \"fraud\" field should be a boolean, got {0}")]
    InvalidFieldType(String),
}

impl ScoreError {
    /// A short, stable name for the error for API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoreError::ConnectFailure(_) => "connect_failure",
            ScoreError::Timeout => "timeout",
            ScoreError::NonSuccessStatus { .. } => "non_success_status",
            ScoreError::EmptyResponse => "empty_response",
            ScoreError::MalformedResponse(_) => "malformed_response",
            ScoreError::MissingField => "missing_field",
            ScoreError::InvalidFieldType(_) => "invalid_field_type",
        }
    }

    /// 503 if the model could not be reached in time, otherwise 502.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ScoreError::ConnectFailure(_) | ScoreError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Something that can classify a feature vector as fraudulent or not.
#[async_trait]
pub trait FraudScorer: Send + Sync {
    /// Score `features` with a single call to the fraud model.
    async fn score(&self, features: &FeatureVector) -> Result<ScoreResult, ScoreError>;
}

/// Settings for [HttpScoreClient].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreClientConfig {
    /// The full URL of the prediction endpoint, e.g. "http://localhost:5000/predict".
    pub endpoint_url: String,
    /// The request timeout for a single call.
    pub timeout: Duration,
}

impl Default for ScoreClientConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_SCORE_ENDPOINT_URL.to_owned(),
            timeout: DEFAULT_SCORE_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
struct ScoreRequest<'a> {
    features: &'a [f64],
}

/// Calls the fraud model over HTTP.
#[derive(Debug, Clone)]
pub struct HttpScoreClient {
    client: Client,
    endpoint_url: String,
}

impl HttpScoreClient {
    /// Create a client for the endpoint in `config`.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built, e.g.
    /// the TLS backend failed to initialize.
    pub fn new(config: ScoreClientConfig) -> Result<Self, reqwest::Error> {
        // A redirect would be replayed as a GET without the features.
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            endpoint_url: config.endpoint_url,
        })
    }

    /// The URL that scoring requests are sent to.
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }
}

#[async_trait]
impl FraudScorer for HttpScoreClient {
    async fn score(&self, features: &FeatureVector) -> Result<ScoreResult, ScoreError> {
        tracing::debug!(
            endpoint = %self.endpoint_url,
            feature_count = features.len(),
            "sending features to scoring service"
        );

        let response = self
            .client
            .post(&self.endpoint_url)
            .json(&ScoreRequest {
                features: features.as_slice(),
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoreError::NonSuccessStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(map_transport_error)?;

        parse_score_response(&body)
    }
}

fn map_transport_error(error: reqwest::Error) -> ScoreError {
    if error.is_timeout() {
        ScoreError::Timeout
    } else {
        ScoreError::ConnectFailure(error.to_string())
    }
}

/// Extract the verdict from the raw body of a scoring response.
///
/// # Errors
/// Returns a:
/// - [ScoreError::EmptyResponse] if `body` is empty or only whitespace,
/// - [ScoreError::MalformedResponse] if `body` is not a JSON object,
/// - [ScoreError::MissingField] if there is no `fraud` field,
/// - or [ScoreError::InvalidFieldType] if `fraud` is not a boolean.
pub fn parse_score_response(body: &[u8]) -> Result<ScoreResult, ScoreError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ScoreError::EmptyResponse);
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|error| ScoreError::MalformedResponse(error.to_string()))?;

    let Value::Object(object) = value else {
        return Err(ScoreError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            json_type_name(&value)
        )));
    };

    match object.get("fraud") {
        None => Err(ScoreError::MissingField),
        Some(Value::Bool(fraud)) => Ok(ScoreResult { fraud: *fraud }),
        Some(other) => Err(ScoreError::InvalidFieldType(
            json_type_name(other).to_owned(),
        )),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
