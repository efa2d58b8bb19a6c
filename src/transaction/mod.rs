//! Scored transactions.
//!
//! This module contains:
//! - The `ScoredTransaction` model and its builder
//! - The `TransactionStore` trait and its SQLite implementation
//! - The pages for adding and listing transactions

mod add_page;
mod core;
mod store;
mod transactions_page;

pub use add_page::{get_add_transaction_page, submit_add_transaction_form};
pub use core::{ScoredTransaction, ScoredTransactionBuilder, create_transaction_table};
pub use store::{SQLiteTransactionStore, StorageError, TransactionStore};
pub use transactions_page::{TransactionRow, get_transactions_page, render_rows};
