//! Dashboard module
//!
//! Provides an overview page with counts by verdict, the latest transactions
//! and a chart of fraudulent vs. safe transactions.

mod charts;
mod handlers;
mod summary;

pub use handlers::get_dashboard_page;
pub use summary::{DashboardSummary, recent, summarize};
