//! Defines the core data models and table schema for scored transactions.

use rusqlite::Connection;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{database_id::TransactionId, features::FeatureVector};

// ============================================================================
// MODELS
// ============================================================================

/// A transaction that has been scored by the fraud model and saved.
///
/// To create a new `ScoredTransaction`, use [ScoredTransaction::build] and
/// pass the builder to a [TransactionStore](super::TransactionStore).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTransaction {
    /// The ID of the transaction, assigned by the store.
    pub id: TransactionId,
    /// The features that were sent to the fraud model.
    pub features: FeatureVector,
    /// Whether the fraud model flagged the transaction as fraudulent.
    pub fraud: bool,
    /// When the transaction was scored, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl ScoredTransaction {
    /// Create a new scored transaction timestamped with the current time.
    ///
    /// Shortcut for [ScoredTransactionBuilder] for discoverability.
    pub fn build(features: FeatureVector, fraud: bool) -> ScoredTransactionBuilder {
        ScoredTransactionBuilder {
            features,
            fraud,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// The last feature, which by convention is the transaction amount.
    pub fn amount(&self) -> Option<f64> {
        self.features.amount()
    }
}

/// A scored transaction that has not been saved yet.
///
/// The store assigns the ID when the builder is saved, everything else is
/// fixed at scoring time.
///
/// # Examples
///
/// ```ignore
/// use time::macros::datetime;
///
/// let builder = ScoredTransaction::build(features, true)
///     .timestamp(datetime!(2025-10-05 12:00 UTC));
/// let id = store.save(&builder)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTransactionBuilder {
    /// The validated features that were scored.
    pub features: FeatureVector,
    /// The verdict returned by the fraud model.
    pub fraud: bool,
    /// When the transaction was scored.
    ///
    /// Defaults to the server clock at the time [ScoredTransaction::build]
    /// was called.
    pub timestamp: OffsetDateTime,
}

impl ScoredTransactionBuilder {
    /// Override the scoring timestamp.
    pub fn timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach the store-assigned `id` to produce the saved record.
    pub fn finalize(self, id: TransactionId) -> ScoredTransaction {
        ScoredTransaction {
            id,
            features: self.features,
            fraud: self.fraud,
            timestamp: self.timestamp,
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table and its feature child table in the database.
///
/// Features are stored one row per value, keyed by the parent transaction ID
/// and their position in the vector.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fraud INTEGER NOT NULL,
                timestamp TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS transaction_feature (
                transaction_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                value REAL NOT NULL,
                PRIMARY KEY (transaction_id, position),
                FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id) ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}
