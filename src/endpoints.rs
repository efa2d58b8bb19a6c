//! The endpoint URIs.

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The page with summary statistics and recent transactions.
pub const DASHBOARD_VIEW: &str = "/transactions/dashboard";
/// The page listing every scored transaction.
pub const TRANSACTIONS_VIEW: &str = "/transactions/view";
/// The page with the form for submitting a transaction.
///
/// The form posts back to the same route.
pub const ADD_TRANSACTION_VIEW: &str = "/transactions/add";
/// The CSV report download.
pub const REPORT: &str = "/transactions/report";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";

/// The route for scoring a transaction given as JSON.
pub const CHECK_API: &str = "/transactions/check";
/// The JSON route used by the add form's script, same as [CHECK_API] with a
/// confirmation message.
pub const ADD_FORM_API: &str = "/transactions/add-form";
/// The route for listing every scored transaction as JSON.
pub const ALL_TRANSACTIONS_API: &str = "/transactions/all";
