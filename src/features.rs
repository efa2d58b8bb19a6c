//! Validation of the numeric feature vectors that describe a transaction.
//!
//! Features arrive either as a JSON list (the API routes) or as a single
//! comma-separated text field (the HTML form). Both are funnelled through
//! [FeatureValidator::validate] so that every entry point applies the same
//! rules.

use serde::Serialize;

/// The number of features the bundled fraud model was trained on.
///
/// This is only enforced when passed to [FeatureValidator::with_expected_count].
pub const MODEL_FEATURE_COUNT: usize = 29;

/// The errors that can occur while validating a feature vector.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ValidationError {
    /// No features were provided, or the list of features was empty.
    #[error("no features were provided")]
    MissingFeatures,

    /// A token in a comma-separated feature list was not a finite number.
    ///
    /// Holds the offending token after surrounding whitespace is trimmed.
    #[error("\"{0}\" is not a valid number")]
    MalformedNumber(String),

    /// A feature in a numeric list was NaN or infinite.
    #[error("feature {index} is not a finite number")]
    NonFiniteValue {
        /// The zero-based position of the offending feature.
        index: usize,
    },

    /// The number of features did not match the configured feature count.
    #[error("expected {expected} features, got {actual}")]
    WrongLength {
        /// The configured number of features.
        expected: usize,
        /// The number of features that were provided.
        actual: usize,
    },
}

impl ValidationError {
    /// A short, stable name for the error for API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::MissingFeatures => "missing_features",
            ValidationError::MalformedNumber(_) => "malformed_number",
            ValidationError::NonFiniteValue { .. } => "non_finite_value",
            ValidationError::WrongLength { .. } => "wrong_length",
        }
    }
}

/// An ordered, non-empty list of finite numbers describing one transaction.
///
/// A `FeatureVector` can only be created through [FeatureValidator], so
/// holding one means the features have already been checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    /// The features in their original order.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// The number of features.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false, a `FeatureVector` is never empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The last feature, which by convention holds the transaction amount.
    pub fn amount(&self) -> Option<f64> {
        self.0.last().copied()
    }

    /// Consume the vector and return the raw features.
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    /// Wrap features loaded from the database.
    ///
    /// Only the store should call this, everything it hands back was
    /// validated before it was written.
    pub(crate) fn from_stored(features: Vec<f64>) -> Self {
        Self(features)
    }
}

/// Features as they arrive from a client, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFeatures {
    /// A structured list of numbers, e.g. `{"features": [1.0, 2.0]}`.
    ///
    /// `None` means the field was missing or `null`.
    List(Option<Vec<f64>>),
    /// Comma-separated numbers from a text input, e.g. `"1.0, 2.5, -3.0"`.
    Text(String),
}

/// Checks raw features and turns them into a [FeatureVector].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeatureValidator {
    expected_count: Option<usize>,
}

impl FeatureValidator {
    /// A validator that accepts feature vectors of any non-zero length.
    pub fn new() -> Self {
        Self::default()
    }

    /// A validator that only accepts exactly `count` features.
    pub fn with_expected_count(count: usize) -> Self {
        Self {
            expected_count: Some(count),
        }
    }

    /// The number of features this validator requires, if any.
    pub fn expected_count(&self) -> Option<usize> {
        self.expected_count
    }

    /// Validate `raw` features.
    ///
    /// # Errors
    /// Returns a:
    /// - [ValidationError::MissingFeatures] if there are no features,
    /// - [ValidationError::MalformedNumber] if a text token is not a finite number,
    /// - [ValidationError::NonFiniteValue] if a listed value is NaN or infinite,
    /// - or [ValidationError::WrongLength] if an expected count is set and not met.
    pub fn validate(&self, raw: RawFeatures) -> Result<FeatureVector, ValidationError> {
        let features = match raw {
            RawFeatures::List(None) => return Err(ValidationError::MissingFeatures),
            RawFeatures::List(Some(features)) => features,
            RawFeatures::Text(text) => parse_feature_list(&text)?,
        };

        if features.is_empty() {
            return Err(ValidationError::MissingFeatures);
        }

        if let Some(index) = features.iter().position(|value| !value.is_finite()) {
            return Err(ValidationError::NonFiniteValue { index });
        }

        match self.expected_count {
            Some(expected) if expected != features.len() => Err(ValidationError::WrongLength {
                expected,
                actual: features.len(),
            }),
            _ => Ok(FeatureVector(features)),
        }
    }
}

/// Parse a comma-separated list of numbers such as `"1.2, -0.5, 3.0"`.
///
/// Whitespace around each number is ignored. A blank string yields an empty
/// list so that the caller can report it as missing.
///
/// A single comma at the very end of `text` is dropped, so `"1.0, 2.0,"`
/// parses as `[1.0, 2.0]`. Any other empty token is malformed, including one
/// after a final comma that is followed by whitespace.
///
/// # Errors
/// Returns [ValidationError::MalformedNumber] with the first token that is
/// empty, not a number, or not finite (e.g. "NaN" or "inf").
pub fn parse_feature_list(text: &str) -> Result<Vec<f64>, ValidationError> {
    let text = text.strip_suffix(',').unwrap_or(text);

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    text.split(',')
        .map(str::trim)
        .map(|token| match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(ValidationError::MalformedNumber(token.to_owned())),
        })
        .collect()
}
