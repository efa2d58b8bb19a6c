//! Summary statistics over the scored transactions.

use crate::transaction::ScoredTransaction;

/// Counts of the scored transactions by verdict, with amount analytics.
///
/// The amount of a transaction is its last feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardSummary {
    /// The number of scored transactions.
    pub total: usize,
    /// The number of transactions flagged as fraud.
    pub fraud_count: usize,
    /// The number of transactions not flagged, always `total - fraud_count`.
    pub safe_count: usize,
    /// The percentage of transactions flagged as fraud, rounded to one decimal place.
    ///
    /// Zero when there are no transactions.
    pub fraud_rate: f64,
    /// The sum of all transaction amounts.
    pub total_amount: f64,
    /// The mean amount of the fraudulent transactions, zero if there are none.
    pub avg_fraud_amount: f64,
    /// The mean amount of the safe transactions, zero if there are none.
    pub avg_safe_amount: f64,
}

/// Count `transactions` by verdict and total up their amounts.
pub fn summarize(transactions: &[ScoredTransaction]) -> DashboardSummary {
    let total = transactions.len();
    let mut fraud_count = 0;
    let mut fraud_amount = 0.0;
    let mut safe_amount = 0.0;

    for transaction in transactions {
        let amount = transaction.amount().unwrap_or(0.0);

        if transaction.fraud {
            fraud_count += 1;
            fraud_amount += amount;
        } else {
            safe_amount += amount;
        }
    }

    let safe_count = total - fraud_count;

    let fraud_rate = if total == 0 {
        0.0
    } else {
        (fraud_count as f64 / total as f64 * 1000.0).round() / 10.0
    };

    DashboardSummary {
        total,
        fraud_count,
        safe_count,
        fraud_rate,
        total_amount: fraud_amount + safe_amount,
        avg_fraud_amount: mean(fraud_amount, fraud_count),
        avg_safe_amount: mean(safe_amount, safe_count),
    }
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// The `n` most recently scored transactions, newest first.
///
/// Transactions scored at the same instant are ordered by descending ID.
pub fn recent(transactions: &[ScoredTransaction], n: usize) -> Vec<ScoredTransaction> {
    let mut sorted: Vec<&ScoredTransaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

    sorted.into_iter().take(n).cloned().collect()
}

#[cfg(test)]
mod tests {
    use time::{Duration, macros::datetime};

    use crate::{
        features::{FeatureValidator, RawFeatures},
        transaction::ScoredTransaction,
    };

    use super::{DashboardSummary, recent, summarize};

    fn scored(id: i64, fraud: bool, minutes: i64) -> ScoredTransaction {
        let features = FeatureValidator::new()
            .validate(RawFeatures::List(Some(vec![1.0, id as f64])))
            .unwrap();

        ScoredTransaction::build(features, fraud)
            .timestamp(datetime!(2025-10-05 12:00 UTC) + Duration::minutes(minutes))
            .finalize(id)
    }

    #[test]
    fn empty_summary_has_zero_rate() {
        assert_eq!(
            summarize(&[]),
            DashboardSummary {
                total: 0,
                fraud_count: 0,
                safe_count: 0,
                fraud_rate: 0.0,
                total_amount: 0.0,
                avg_fraud_amount: 0.0,
                avg_safe_amount: 0.0,
            }
        );
    }

    #[test]
    fn counts_add_up_for_every_mix() {
        for n in 0..8 {
            for f in 0..=n {
                let transactions: Vec<_> = (0..n)
                    .map(|i| scored(i as i64 + 1, i < f, i as i64))
                    .collect();

                let summary = summarize(&transactions);

                assert_eq!(summary.total, n);
                assert_eq!(summary.fraud_count, f);
                assert_eq!(summary.safe_count, n - f);
            }
        }
    }

    #[test]
    fn fraud_rate_has_one_decimal_place() {
        let transactions = [scored(1, true, 0), scored(2, false, 1), scored(3, false, 2)];

        assert_eq!(summarize(&transactions).fraud_rate, 33.3);
    }

    #[test]
    fn fraud_rate_for_all_fraud() {
        let transactions = [scored(1, true, 0), scored(2, true, 1)];

        assert_eq!(summarize(&transactions).fraud_rate, 100.0);
    }

    #[test]
    fn amounts_are_totalled_and_averaged_by_verdict() {
        let transactions = [
            scored(10, true, 0),
            scored(30, true, 1),
            scored(4, false, 2),
            scored(2, false, 3),
            scored(3, false, 4),
        ];

        let summary = summarize(&transactions);

        assert_eq!(summary.total_amount, 49.0);
        assert_eq!(summary.avg_fraud_amount, 20.0);
        assert_eq!(summary.avg_safe_amount, 3.0);
    }

    #[test]
    fn average_without_fraud_is_zero() {
        let transactions = [scored(1, false, 0), scored(5, false, 1)];

        let summary = summarize(&transactions);

        assert_eq!(summary.avg_fraud_amount, 0.0);
        assert_eq!(summary.avg_safe_amount, 3.0);
        assert_eq!(summary.total_amount, 6.0);
    }

    #[test]
    fn recent_is_newest_first() {
        let transactions = [scored(1, true, 0), scored(2, false, 10), scored(3, true, 5)];

        let ids: Vec<_> = recent(&transactions, 2).iter().map(|t| t.id).collect();

        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn recent_breaks_ties_by_id() {
        let transactions = [scored(1, true, 0), scored(2, false, 0)];

        let ids: Vec<_> = recent(&transactions, 5).iter().map(|t| t.id).collect();

        assert_eq!(ids, vec![2, 1]);
    }
}
