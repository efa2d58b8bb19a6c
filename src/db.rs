//! Sets up the application's SQLite database.

use rusqlite::{Connection, TransactionBehavior};

use crate::transaction::create_transaction_table;

/// Create all the tables the application needs.
///
/// Safe to call on an existing database, tables that already exist are left
/// untouched.
///
/// # Errors
/// Returns an error if a table cannot be created or there is some other SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction =
        rusqlite::Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
