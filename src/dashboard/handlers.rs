//! Dashboard HTTP handler and view rendering.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    app_state::TransactionsViewState,
    dashboard::{
        charts::{DashboardChart, ECHARTS_SCRIPT_URL, charts_script, verdict_chart},
        summary::{DashboardSummary, recent, summarize},
    },
    endpoints,
    html::{
        BUTTON_SECONDARY_STYLE, HeadElement, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, link, stat_card, verdict_badge,
    },
    navigation::NavBar,
    timezone::local_offset_or_error,
    transaction::{TransactionRow, render_rows},
};

/// How many of the latest transactions are listed on the dashboard.
const RECENT_TRANSACTION_COUNT: usize = 5;

/// Display a page with an overview of the scored transactions.
pub async fn get_dashboard_page(
    State(state): State<TransactionsViewState>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;

    let transactions = state
        .transaction_store
        .find_all()
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW);

    if transactions.is_empty() {
        return Ok(dashboard_no_data_view(nav_bar).into_response());
    }

    let summary = summarize(&transactions);
    let recent_rows = render_rows(
        &recent(&transactions, RECENT_TRANSACTION_COUNT),
        local_offset,
    );
    let charts = [DashboardChart {
        id: "verdict-chart",
        options: verdict_chart(&summary).to_string(),
    }];

    Ok(dashboard_view(nav_bar, &summary, &recent_rows, &charts).into_response())
}

fn dashboard_no_data_view(nav_bar: NavBar) -> Markup {
    let nav_bar = nav_bar.into_html();
    let add_transaction_link = link(endpoints::ADD_TRANSACTION_VIEW, "adding a transaction");

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Statistics will show up here once transactions have been scored.
                Get started by " (add_transaction_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

fn recent_transactions_table(rows: &[TransactionRow]) -> Markup {
    html!(
        table
            id="recent-transactions"
            class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "ID" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Scored At" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
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
                    }
                }
            }
        }
    )
}

fn dashboard_view(
    nav_bar: NavBar,
    summary: &DashboardSummary,
    recent_rows: &[TransactionRow],
    charts: &[DashboardChart],
) -> Markup {
    let nav_bar = nav_bar.into_html();
    let fraud_rate = format!("{:.1}%", summary.fraud_rate);
    let total_amount = format!("{:.2}", summary.total_amount);
    let avg_fraud_amount = format!("{:.2}", summary.avg_fraud_amount);
    let avg_safe_amount = format!("{:.2}", summary.avg_safe_amount);

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            div class="w-full flex justify-between items-center mb-4"
            {
                h1 class="text-xl font-bold" { "Dashboard" }

                a href=(endpoints::REPORT) class=(BUTTON_SECONDARY_STYLE)
                {
                    "Download Report"
                }
            }

            section
                id="summary"
                class="w-full grid grid-cols-2 lg:grid-cols-4 gap-4 mb-4"
            {
                (stat_card("total-transactions", "Total Transactions", &summary.total.to_string(), ""))
                (stat_card("fraud-count", "Fraudulent", &summary.fraud_count.to_string(), "text-red-600 dark:text-red-400"))
                (stat_card("safe-count", "Safe", &summary.safe_count.to_string(), "text-green-600 dark:text-green-400"))
                (stat_card("fraud-rate", "Fraud Rate", &fraud_rate, ""))
            }

            section id="analytics" class="w-full mb-4"
            {
                h3 class="text-xl font-semibold mb-4" { "Advanced Analytics" }

                div class="grid grid-cols-1 md:grid-cols-3 gap-4"
                {
                    (stat_card("total-amount", "Total Amount", &total_amount, ""))
                    (stat_card("avg-fraud-amount", "Average Fraud Amount", &avg_fraud_amount, "text-red-600 dark:text-red-400"))
                    (stat_card("avg-safe-amount", "Average Safe Amount", &avg_safe_amount, "text-green-600 dark:text-green-400"))
                }
            }

            section
                id="charts"
                class="w-full mx-auto mb-4"
            {
                div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
                {
                    @for chart in charts {
                        div
                            id=(chart.id)
                            class="min-h-[380px] rounded dark:bg-gray-100"
                        {}
                    }

                    div class="overflow-x-auto"
                    {
                        h3 class="text-xl font-semibold mb-4" { "Recent Transactions" }

                        (recent_transactions_table(recent_rows))

                        p class="mt-2"
                        {
                            (link(endpoints::TRANSACTIONS_VIEW, "View all transactions"))
                        }
                    }
                }
            }
        }
    );

    let scripts = [
        HeadElement::ScriptLink(ECHARTS_SCRIPT_URL.to_owned()),
        charts_script(charts),
    ];

    base("Dashboard", &scripts, &content)
}
