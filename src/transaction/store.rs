//! Defines the transaction store trait and its SQLite implementation.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    database_id::TransactionId,
    features::FeatureVector,
    transaction::core::{ScoredTransaction, ScoredTransactionBuilder},
};

/// Errors from reading or writing scored transactions.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum StorageError {
    /// The transaction could not be saved.
    ///
    /// The string holds the underlying error for the server logs.
    #[error("could not save the transaction: {0}")]
    WriteFailure(String),

    /// The stored transactions could not be read.
    #[error("could not read transactions: {0}")]
    ReadFailure(String),
}

impl StorageError {
    /// A short, stable name for the error for API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::WriteFailure(_) => "write_failure",
            StorageError::ReadFailure(_) => "read_failure",
        }
    }
}

/// Handles saving and retrieving scored transactions.
///
/// Implementations must assign IDs that increase with each save and are
/// never reused, and must be safe to share between concurrent requests.
pub trait TransactionStore: Send + Sync {
    /// Append a scored transaction and return the ID it was assigned.
    ///
    /// # Errors
    /// Returns [StorageError::WriteFailure] if the transaction was not saved.
    fn save(&self, transaction: &ScoredTransactionBuilder) -> Result<TransactionId, StorageError>;

    /// Retrieve every stored transaction in the order they were saved.
    ///
    /// # Errors
    /// Returns [StorageError::ReadFailure] if the transactions could not be read.
    fn find_all(&self) -> Result<Vec<ScoredTransaction>, StorageError>;
}

/// Stores scored transactions in a SQLite database.
///
/// The tables must already exist, see [crate::initialize_db].
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Insert the transaction and its features in a single SQL transaction.
    fn save(&self, transaction: &ScoredTransactionBuilder) -> Result<TransactionId, StorageError> {
        let connection = self.connection.lock().map_err(|_| {
            StorageError::WriteFailure("could not acquire the database lock".to_owned())
        })?;

        insert_transaction(transaction, &connection).map_err(|error| {
            tracing::error!("could not insert transaction: {error}");
            StorageError::WriteFailure(error.to_string())
        })
    }

    fn find_all(&self) -> Result<Vec<ScoredTransaction>, StorageError> {
        let connection = self.connection.lock().map_err(|_| {
            StorageError::ReadFailure("could not acquire the database lock".to_owned())
        })?;

        select_all_transactions(&connection).map_err(|error| {
            tracing::error!("could not query transactions: {error}");
            StorageError::ReadFailure(error.to_string())
        })
    }
}

fn insert_transaction(
    transaction: &ScoredTransactionBuilder,
    connection: &Connection,
) -> Result<TransactionId, rusqlite::Error> {
    let tx = connection.unchecked_transaction()?;

    let id: TransactionId = tx.query_row(
        "INSERT INTO \"transaction\" (fraud, timestamp) VALUES (?1, ?2) RETURNING id",
        (transaction.fraud, transaction.timestamp),
        |row| row.get(0),
    )?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO transaction_feature (transaction_id, position, value) VALUES (?1, ?2, ?3)",
        )?;

        for (position, value) in transaction.features.as_slice().iter().enumerate() {
            stmt.execute((id, position as i64, value))?;
        }
    }

    tx.commit()?;

    Ok(id)
}

// The inner join leaves out any transaction without feature rows, so every
// vector read back is non-empty.
fn select_all_transactions(
    connection: &Connection,
) -> Result<Vec<ScoredTransaction>, rusqlite::Error> {
    let mut stmt = connection.prepare(
        "SELECT t.id, t.fraud, t.timestamp, f.value
         FROM \"transaction\" t
         INNER JOIN transaction_feature f ON f.transaction_id = t.id
         ORDER BY t.id ASC, f.position ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        let id: TransactionId = row.get(0)?;
        let fraud: bool = row.get(1)?;
        let timestamp: OffsetDateTime = row.get(2)?;
        let value: f64 = row.get(3)?;

        Ok((id, fraud, timestamp, value))
    })?;

    let mut transactions: Vec<(TransactionId, bool, OffsetDateTime, Vec<f64>)> = Vec::new();

    for row in rows {
        let (id, fraud, timestamp, value) = row?;

        match transactions.last_mut() {
            Some((last_id, _, _, features)) if *last_id == id => features.push(value),
            _ => transactions.push((id, fraud, timestamp, vec![value])),
        }
    }

    Ok(transactions
        .into_iter()
        .map(|(id, fraud, timestamp, features)| ScoredTransaction {
            id,
            features: FeatureVector::from_stored(features),
            fraud,
            timestamp,
        })
        .collect())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return an error if there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, rusqlite::Error> {
    connection.query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
        row.get(0)
    })
}
