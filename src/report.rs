//! The downloadable CSV report of the scored transactions.

use axum::{
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    app_state::TransactionsViewState,
    dashboard::{recent, summarize},
    html::format_timestamp,
    timezone::local_offset_or_error,
    transaction::ScoredTransaction,
};

/// How many of the latest transactions are listed in the report.
const REPORT_TRANSACTION_COUNT: usize = 10;

/// Download a CSV report with summary statistics and the latest transactions.
pub async fn get_report(State(state): State<TransactionsViewState>) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;

    let transactions = state
        .transaction_store
        .find_all()
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

    let generated_at = OffsetDateTime::now_utc();
    let body = write_report(&transactions, generated_at, local_offset)?;
    let file_name = format!(
        "fraud-detection-report-{}.csv",
        generated_at.to_offset(local_offset).date()
    );

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// Write the report for `transactions` as CSV.
///
/// The rows have different lengths: a title, the summary as label/value
/// pairs, then a table of the most recent transactions, newest first.
fn write_report(
    transactions: &[ScoredTransaction],
    generated_at: OffsetDateTime,
    local_offset: UtcOffset,
) -> Result<Vec<u8>, Error> {
    let summary = summarize(transactions);
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    let rows: Vec<Vec<String>> = vec![
        vec!["Fraud Detection Report".to_owned()],
        vec![
            "Generated At".to_owned(),
            format_timestamp(generated_at, local_offset),
        ],
        vec![String::new()],
        vec!["Summary Statistics".to_owned()],
        vec!["Total Transactions".to_owned(), summary.total.to_string()],
        vec!["Fraud Detected".to_owned(), summary.fraud_count.to_string()],
        vec!["Safe Transactions".to_owned(), summary.safe_count.to_string()],
        vec![
            "Fraud Rate".to_owned(),
            format!("{:.1}%", summary.fraud_rate),
        ],
        vec![String::new()],
        vec!["Recent Transactions".to_owned()],
        vec![
            "ID".to_owned(),
            "Status".to_owned(),
            "Timestamp".to_owned(),
            "Amount".to_owned(),
        ],
    ];

    let transaction_rows = recent(transactions, REPORT_TRANSACTION_COUNT)
        .into_iter()
        .map(|transaction| {
            vec![
                transaction.id.to_string(),
                if transaction.fraud { "Fraud" } else { "Safe" }.to_owned(),
                format_timestamp(transaction.timestamp, local_offset),
                transaction
                    .amount()
                    .map_or_else(|| "N/A".to_owned(), |amount| amount.to_string()),
            ]
        });

    for row in rows.into_iter().chain(transaction_rows) {
        writer.write_record(&row).map_err(|error| {
            tracing::error!("could not write report row: {error}");
            Error::ReportError(error.to_string())
        })?;
    }

    writer.into_inner().map_err(|error| {
        tracing::error!("could not flush report: {error}");
        Error::ReportError(error.to_string())
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::State,
        http::{StatusCode, header::CONTENT_DISPOSITION},
    };
    use rusqlite::Connection;
    use time::{Duration, UtcOffset, macros::datetime};

    use crate::{
        Error,
        app_state::TransactionsViewState,
        db::initialize,
        features::{FeatureValidator, RawFeatures},
        test_utils::{FailingStore, assert_content_type, get_header},
        transaction::{SQLiteTransactionStore, ScoredTransaction, TransactionStore},
    };

    use super::{get_report, write_report};

    fn scored(id: i64, fraud: bool, amount: f64) -> ScoredTransaction {
        let features = FeatureValidator::new()
            .validate(RawFeatures::List(Some(vec![-1.2, amount])))
            .unwrap();

        ScoredTransaction::build(features, fraud)
            .timestamp(datetime!(2025-10-05 09:00 UTC) + Duration::minutes(id))
            .finalize(id)
    }

    #[test]
    fn report_has_summary_and_recent_transactions() {
        let transactions = [scored(1, true, 149.62), scored(2, false, 2.69)];

        let report = write_report(
            &transactions,
            datetime!(2025-10-06 08:00 UTC),
            UtcOffset::UTC,
        )
        .unwrap();

        let report = String::from_utf8(report).unwrap();
        let lines: Vec<_> = report.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Fraud Detection Report",
                "Generated At,2025-10-06 08:00:00",
                "\"\"",
                "Summary Statistics",
                "Total Transactions,2",
                "Fraud Detected,1",
                "Safe Transactions,1",
                "Fraud Rate,50.0%",
                "\"\"",
                "Recent Transactions",
                "ID,Status,Timestamp,Amount",
                "2,Safe,2025-10-05 09:02:00,2.69",
                "1,Fraud,2025-10-05 09:01:00,149.62",
            ]
        );
    }

    #[test]
    fn report_lists_at_most_ten_transactions() {
        let transactions: Vec<_> = (1..=12).map(|id| scored(id, id % 3 == 0, 1.0)).collect();

        let report = write_report(
            &transactions,
            datetime!(2025-10-06 08:00 UTC),
            UtcOffset::UTC,
        )
        .unwrap();

        let report = String::from_utf8(report).unwrap();
        let transaction_lines: Vec<_> = report
            .lines()
            .skip_while(|line| *line != "ID,Status,Timestamp,Amount")
            .skip(1)
            .collect();
        assert_eq!(transaction_lines.len(), 10);
        assert!(transaction_lines[0].starts_with("12,"));
        assert!(transaction_lines[9].starts_with("3,"));
        assert!(report.contains("Total Transactions,12"));
        assert!(report.contains("Fraud Detected,4"));
    }

    #[test]
    fn report_uses_local_time() {
        let transactions = [scored(1, false, 1.0)];
        let offset = UtcOffset::from_hms(13, 0, 0).unwrap();

        let report = write_report(&transactions, datetime!(2025-10-06 08:00 UTC), offset).unwrap();

        let report = String::from_utf8(report).unwrap();
        assert!(report.contains("Generated At,2025-10-06 21:00:00"));
        assert!(report.contains("1,Safe,2025-10-05 22:01:00,1"));
    }

    #[tokio::test]
    async fn report_is_csv_attachment() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let store = SQLiteTransactionStore::new(Arc::new(Mutex::new(connection)));
        let features = FeatureValidator::new()
            .validate(RawFeatures::List(Some(vec![0.3, 10.0])))
            .unwrap();
        store
            .save(&ScoredTransaction::build(features, true))
            .unwrap();
        let state = TransactionsViewState {
            transaction_store: Arc::new(store),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_report(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/csv; charset=utf-8");
        let disposition = get_header(&response, CONTENT_DISPOSITION.as_str());
        assert!(disposition.starts_with("attachment; filename=\"fraud-detection-report-"));
        assert!(disposition.ends_with(".csv\""));
    }

    #[tokio::test]
    async fn read_failure_is_error() {
        let state = TransactionsViewState {
            transaction_store: Arc::new(FailingStore),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let result = get_report(State(state)).await;

        assert!(matches!(result, Err(Error::Storage(_))));
    }
}
