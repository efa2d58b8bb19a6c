//! Defines the route handler for the page that displays transactions as a table.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::{
    Error,
    app_state::TransactionsViewState,
    dashboard::{DashboardSummary, summarize},
    database_id::TransactionId,
    endpoints,
    html::{
        BUTTON_SECONDARY_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_amount, format_timestamp, link,
        stat_card, verdict_badge,
    },
    navigation::NavBar,
    timezone::local_offset_or_error,
    transaction::ScoredTransaction,
};

/// The number of leading features shown in the table before the rest are elided.
const FEATURE_PREVIEW_COUNT: usize = 3;

/// Which transactions to show, based on their verdict.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictFilter {
    /// Every transaction.
    #[default]
    All,
    /// Only transactions flagged as fraud.
    Fraud,
    /// Only transactions that were not flagged.
    Safe,
}

impl VerdictFilter {
    /// Whether `transaction` should be shown.
    pub fn matches(self, transaction: &ScoredTransaction) -> bool {
        match self {
            VerdictFilter::All => true,
            VerdictFilter::Fraud => transaction.fraud,
            VerdictFilter::Safe => !transaction.fraud,
        }
    }

    fn as_query_value(self) -> &'static str {
        match self {
            VerdictFilter::All => "all",
            VerdictFilter::Fraud => "fraud",
            VerdictFilter::Safe => "safe",
        }
    }

    fn label(self) -> &'static str {
        match self {
            VerdictFilter::All => "All",
            VerdictFilter::Fraud => "Fraud",
            VerdictFilter::Safe => "Safe",
        }
    }
}

/// The query parameters for the transactions page.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct TransactionsQuery {
    #[serde(default)]
    pub verdict: VerdictFilter,
    /// Search text matched against the ID and the displayed timestamp.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub q: String,
}

impl TransactionsQuery {
    fn search_term(&self) -> &str {
        self.q.trim()
    }

    /// Whether `row` contains the search term in its ID or timestamp.
    ///
    /// Every row matches an empty search.
    fn matches_search(&self, row: &TransactionRow) -> bool {
        let term = self.search_term();

        term.is_empty() || row.id.to_string().contains(term) || row.timestamp.contains(term)
    }

    /// The link to this page with `verdict` selected and the search kept.
    fn url_with_verdict(&self, verdict: VerdictFilter) -> String {
        let query = TransactionsQuery {
            verdict,
            q: self.search_term().to_owned(),
        };

        match serde_urlencoded::to_string(&query) {
            Ok(params) => format!("{}?{}", endpoints::TRANSACTIONS_VIEW, params),
            Err(error) => {
                tracing::error!("Could not encode transactions query {query:?}: {error}");
                endpoints::TRANSACTIONS_VIEW.to_owned()
            }
        }
    }
}

/// A transaction formatted for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub id: TransactionId,
    pub fraud: bool,
    pub timestamp: String,
    pub amount: String,
    pub feature_count: usize,
    pub features_preview: String,
}

/// Format `transactions` for the table, in the same order.
///
/// Timestamps are shown in `local_offset`.
pub fn render_rows(
    transactions: &[ScoredTransaction],
    local_offset: UtcOffset,
) -> Vec<TransactionRow> {
    transactions
        .iter()
        .map(|transaction| {
            let features = transaction.features.as_slice();
            let preview = features
                .iter()
                .take(FEATURE_PREVIEW_COUNT)
                .map(|value| value.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let features_preview = if features.len() > FEATURE_PREVIEW_COUNT {
                format!("{preview}, ...")
            } else {
                preview
            };

            TransactionRow {
                id: transaction.id,
                fraud: transaction.fraud,
                timestamp: format_timestamp(transaction.timestamp, local_offset),
                amount: format_amount(transaction.amount()),
                feature_count: features.len(),
                features_preview,
            }
        })
        .collect()
}

/// Render the list of scored transactions, optionally filtered by verdict and
/// search text.
pub async fn get_transactions_page(
    State(state): State<TransactionsViewState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;

    let transactions = state
        .transaction_store
        .find_all()
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

    let summary = summarize(&transactions);
    let by_verdict: Vec<ScoredTransaction> = transactions
        .into_iter()
        .filter(|transaction| query.verdict.matches(transaction))
        .collect();
    let rows: Vec<TransactionRow> = render_rows(&by_verdict, local_offset)
        .into_iter()
        .filter(|row| query.matches_search(row))
        .collect();

    Ok(transactions_view(&rows, &query, &summary).into_response())
}

fn filter_links_view(query: &TransactionsQuery) -> Markup {
    html!(
        div class="flex gap-2"
        {
            @for filter in [VerdictFilter::All, VerdictFilter::Fraud, VerdictFilter::Safe] {
                a
                    href=(query.url_with_verdict(filter))
                    class=(BUTTON_SECONDARY_STYLE)
                    aria-current=[(filter == query.verdict).then_some("page")]
                {
                    (filter.label())
                }
            }
        }
    )
}

fn search_form_view(query: &TransactionsQuery) -> Markup {
    html!(
        form
            id="transaction-search"
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class="flex gap-2 items-start"
        {
            input type="hidden" name="verdict" value=(query.verdict.as_query_value());

            input
                type="search"
                name="q"
                value=(query.search_term())
                placeholder="Search by ID or timestamp"
                aria-label="Search transactions"
                class=(FORM_TEXT_INPUT_STYLE);

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Search" }
        }
    )
}

fn stats_view(summary: &DashboardSummary, filtered_count: usize) -> Markup {
    html!(
        section
            id="transaction-stats"
            class="w-full max-w-screen-xl grid grid-cols-2 md:grid-cols-4 gap-4 mb-4"
        {
            (stat_card("stat-total", "Total", &summary.total.to_string(), ""))
            (stat_card("stat-fraud", "Fraud", &summary.fraud_count.to_string(), "text-red-600 dark:text-red-400"))
            (stat_card("stat-safe", "Safe", &summary.safe_count.to_string(), "text-green-600 dark:text-green-400"))
            (stat_card("stat-filtered", "Filtered", &filtered_count.to_string(), ""))
        }
    )
}

fn transactions_view(
    rows: &[TransactionRow],
    query: &TransactionsQuery,
    summary: &DashboardSummary,
) -> Markup {
    let has_any_transactions = summary.total > 0;
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let add_link = link(endpoints::ADD_TRANSACTION_VIEW, "add a transaction");

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl flex flex-wrap justify-between items-center gap-2 mb-4"
            {
                h1 class="text-xl font-bold" { "Transactions" }

                (filter_links_view(query))
            }

            @if has_any_transactions {
                (stats_view(summary, rows.len()))

                div class="w-full max-w-screen-xl mb-4" { (search_form_view(query)) }
            }

            @if !has_any_transactions {
                p { "No transactions have been scored yet. Try to " (add_link) "." }
            } @else if rows.is_empty() {
                p { "No transactions match this filter." }
            } @else {
                div class="w-full max-w-screen-xl overflow-x-auto"
                {
                    table class="w-full my-2 text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "ID" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Scored At" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Features" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                tr class=(TABLE_ROW_STYLE) data-transaction-id=(row.id)
                                {
                                    td class=(TABLE_CELL_STYLE) { (row.id) }
                                    td class=(TABLE_CELL_STYLE) { (verdict_badge(row.fraud)) }
                                    td class=(TABLE_CELL_STYLE) { (row.timestamp) }
                                    td class=(TABLE_CELL_STYLE) { (row.amount) }
                                    td class=(TABLE_CELL_STYLE) title={ (row.feature_count) " features" }
                                    {
                                        (row.features_preview)
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Transactions", &[], &content)
}
