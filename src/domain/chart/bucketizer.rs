use super::classifier::{classify, Flow};
use crate::domain::models::{Bucket, Granularity, Transaction};
use chrono::{DateTime, Datelike, FixedOffset, Month};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;

pub const UNKNOWN_PERIOD: &str = "Unknown";
pub const UNKNOWN_TIME: &str = "--:--";
pub const INVALID_DATE: &str = "Invalid date";

struct Dated<'a> {
    transaction: &'a Transaction,
    at: Option<DateTime<FixedOffset>>,
}

/// Groups `transactions` into chronologically ordered credit/debit buckets as
/// seen by `account`, with times rendered in `zone`.
pub fn bucketize(
    transactions: &[Transaction],
    granularity: Granularity,
    account: &str,
    zone: &FixedOffset,
) -> Vec<Bucket> {
    let sorted = sort_chronologically(transactions, zone);
    match granularity {
        Granularity::Transaction => per_transaction(&sorted, account),
        Granularity::Week => per_period(&sorted, Period::Week, account),
        Granularity::Month => per_period(&sorted, Period::Month, account),
    }
}

fn sort_chronologically<'a>(transactions: &'a [Transaction], zone: &FixedOffset) -> Vec<Dated<'a>> {
    let mut dated: Vec<Dated<'a>> = transactions
        .iter()
        .map(|transaction| Dated {
            transaction,
            at: transaction
                .recorded_at(zone)
                .inspect_err(|e| {
                    tracing::warn!("Transaction {} charted with placeholder: {}", transaction.id, e)
                })
                .ok(),
        })
        .collect();
    // `sort_by` is stable, equal timestamps keep their input order.
    dated.sort_by(|a, b| known_first(a.at.as_ref(), b.at.as_ref()));
    dated
}

// Unknown values order after every known one.
fn known_first<T: Ord>(a: Option<&T>, b: Option<&T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn split(flow: Flow, amount: Decimal) -> (Decimal, Decimal) {
    let credit = if flow.credit { amount } else { Decimal::ZERO };
    let debit = if flow.debit { amount } else { Decimal::ZERO };
    (credit, debit)
}

fn per_transaction(sorted: &[Dated<'_>], account: &str) -> Vec<Bucket> {
    sorted
        .iter()
        .enumerate()
        .map(|(order_index, dated)| {
            let (label, full_date) = match dated.at {
                Some(at) => (
                    at.format("%H:%M").to_string(),
                    at.format("%b %d, %Y %H:%M").to_string(),
                ),
                None => (UNKNOWN_TIME.to_string(), INVALID_DATE.to_string()),
            };
            let (credit, debit) = split(
                classify(dated.transaction, account),
                dated.transaction.amount,
            );
            Bucket {
                label,
                full_date: Some(full_date),
                credit,
                debit,
                order_index,
            }
        })
        .collect()
}

/// Aggregate groupings, the granularities that merge transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Period {
    Week,
    Month,
}

fn per_period(sorted: &[Dated<'_>], period: Period, account: &str) -> Vec<Bucket> {
    let mut totals: HashMap<String, (Decimal, Decimal)> = HashMap::new();
    for dated in sorted {
        let label = dated
            .at
            .map(|at| period_label(&at, period))
            .unwrap_or_else(|| UNKNOWN_PERIOD.to_string());
        let (credit, debit) = split(
            classify(dated.transaction, account),
            dated.transaction.amount,
        );
        // Sums clamp at `Decimal::MAX` instead of overflowing.
        let entry = totals.entry(label).or_default();
        entry.0 = entry.0.saturating_add(credit);
        entry.1 = entry.1.saturating_add(debit);
    }

    let mut periods: Vec<(Option<(i32, u32)>, String, (Decimal, Decimal))> = totals
        .into_iter()
        .map(|(label, sums)| (parse_period(&label, period), label, sums))
        .collect();
    periods.sort_by(|a, b| known_first(a.0.as_ref(), b.0.as_ref()));

    periods
        .into_iter()
        .enumerate()
        .map(|(order_index, (_, label, (credit, debit)))| Bucket {
            label,
            full_date: None,
            credit,
            debit,
            order_index,
        })
        .collect()
}

/// Grouping key of `at`: `"Mar 2024"` per month, `"W2, 2024"` per week of the month.
fn period_label(at: &DateTime<FixedOffset>, period: Period) -> String {
    match period {
        Period::Month => at.format("%b %Y").to_string(),
        // Weeks are counted from the first of the month, not ISO weeks.
        Period::Week => format!("W{}, {}", at.day().div_ceil(7), at.year()),
    }
}

/// Reads a grouping key back into `(year, period)`, where the period is the
/// calendar month (1-12) or the week of the month.
fn parse_period(label: &str, period: Period) -> Option<(i32, u32)> {
    match period {
        Period::Month => {
            let (month, year) = label.split_once(' ')?;
            let month = month.parse::<Month>().ok()?;
            Some((year.parse().ok()?, month.number_from_month()))
        }
        Period::Week => {
            let (week, year) = label.strip_prefix('W')?.split_once(", ")?;
            Some((year.parse().ok()?, week.parse().ok()?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TransactionKind;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn tx(id: &str, kind: TransactionKind, amount: i64, timestamp: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            kind,
            amount: Decimal::from(amount),
            timestamp: timestamp.to_string(),
        }
    }

    fn deposit(id: &str, amount: i64, timestamp: &str) -> Transaction {
        tx(id, TransactionKind::Deposit, amount, timestamp)
    }

    fn labels(buckets: &[Bucket]) -> Vec<&str> {
        buckets.iter().map(|b| b.label.as_str()).collect()
    }

    #[test]
    fn empty_history_has_no_buckets() {
        for granularity in [Granularity::Transaction, Granularity::Week, Granularity::Month] {
            assert!(bucketize(&[], granularity, "A", &utc()).is_empty());
        }
    }

    #[test]
    fn one_bucket_per_transaction_in_time_order() {
        let history = vec![
            tx(
                "w",
                TransactionKind::Withdrawal { fee: None },
                40,
                "2024-01-05T11:00",
            ),
            deposit("d", 100, "2024-01-05T10:00"),
        ];
        let buckets = bucketize(&history, Granularity::Transaction, "A", &utc());

        assert_eq!(labels(&buckets), vec!["10:00", "11:00"]);
        assert_eq!(buckets[0].credit, Decimal::from(100));
        assert_eq!(buckets[0].debit, Decimal::ZERO);
        assert_eq!(buckets[1].credit, Decimal::ZERO);
        assert_eq!(buckets[1].debit, Decimal::from(40));
        assert_eq!(buckets[0].full_date.as_deref(), Some("Jan 05, 2024 10:00"));
        assert_eq!(buckets[1].order_index, 1);
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let history = vec![
            deposit("first", 1, "2024-01-05T10:00"),
            deposit("second", 2, "2024-01-05T10:00"),
        ];
        let buckets = bucketize(&history, Granularity::Transaction, "A", &utc());
        assert_eq!(buckets[0].credit, Decimal::from(1));
        assert_eq!(buckets[1].credit, Decimal::from(2));
    }

    #[test]
    fn per_transaction_sums_match_classified_amounts() {
        let transfer = |id: &str, sender: &str, receiver: &str, amount: i64, at: &str| {
            tx(
                id,
                TransactionKind::Transfer {
                    sender: sender.to_string(),
                    receiver: receiver.to_string(),
                },
                amount,
                at,
            )
        };
        let history = vec![
            transfer("1", "A", "B", 15, "2024-02-01T09:00"),
            transfer("2", "B", "A", 20, "2024-02-01T08:00"),
            transfer("3", "B", "C", 99, "2024-02-01T07:00"),
            deposit("4", 5, "2024-02-02T07:00"),
        ];
        let buckets = bucketize(&history, Granularity::Transaction, "A", &utc());

        let credit: Decimal = buckets.iter().map(|b| b.credit).sum();
        let debit: Decimal = buckets.iter().map(|b| b.debit).sum();
        assert_eq!(credit, Decimal::from(25));
        assert_eq!(debit, Decimal::from(15));
        assert_eq!(buckets.len(), 4);
    }

    #[test]
    fn weeks_merge_regardless_of_input_order() {
        let history = vec![
            deposit("c", 30, "2024-03-10T12:00"),
            deposit("a", 50, "2024-03-02T12:00"),
            deposit("b", 50, "2024-03-06T12:00"),
        ];
        let buckets = bucketize(&history, Granularity::Week, "A", &utc());

        assert_eq!(labels(&buckets), vec!["W1, 2024", "W2, 2024"]);
        assert_eq!(buckets[0].credit, Decimal::from(100));
        assert_eq!(buckets[1].credit, Decimal::from(30));
        assert_eq!(buckets[0].full_date, None);
    }

    #[test]
    fn months_order_by_calendar_not_text() {
        let history = vec![
            deposit("1", 1, "2024-02-10T12:00"),
            deposit("2", 2, "2023-12-10T12:00"),
            deposit("3", 3, "2024-01-10T12:00"),
            deposit("4", 4, "2024-11-10T12:00"),
        ];
        let buckets = bucketize(&history, Granularity::Month, "A", &utc());

        assert_eq!(
            labels(&buckets),
            vec!["Dec 2023", "Jan 2024", "Feb 2024", "Nov 2024"]
        );
        let indices: Vec<usize> = buckets.iter().map(|b| b.order_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn weeks_order_by_year_then_week() {
        let history = vec![
            deposit("1", 1, "2024-01-03T12:00"),
            deposit("2", 2, "2023-12-30T12:00"),
            deposit("3", 3, "2024-01-29T12:00"),
        ];
        let buckets = bucketize(&history, Granularity::Week, "A", &utc());
        assert_eq!(labels(&buckets), vec!["W5, 2023", "W1, 2024", "W5, 2024"]);
    }

    #[test]
    fn unparsable_timestamps_get_placeholders() {
        let history = vec![
            deposit("bad", 7, "not a date"),
            deposit("good", 3, "2024-01-05T10:00"),
        ];

        let per_tx = bucketize(&history, Granularity::Transaction, "A", &utc());
        assert_eq!(labels(&per_tx), vec!["10:00", UNKNOWN_TIME]);
        assert_eq!(per_tx[1].full_date.as_deref(), Some(INVALID_DATE));
        assert_eq!(per_tx[1].credit, Decimal::from(7));

        let per_month = bucketize(&history, Granularity::Month, "A", &utc());
        assert_eq!(labels(&per_month), vec!["Jan 2024", UNKNOWN_PERIOD]);
    }

    #[test]
    fn labels_use_display_zone() {
        let zone = FixedOffset::west_opt(2 * 3600).unwrap();
        let history = vec![deposit("1", 1, "2024-03-01T01:00:00Z")];

        let per_tx = bucketize(&history, Granularity::Transaction, "A", &zone);
        assert_eq!(labels(&per_tx), vec!["23:00"]);

        let per_month = bucketize(&history, Granularity::Month, "A", &zone);
        assert_eq!(labels(&per_month), vec!["Feb 2024"]);
    }

    #[test]
    fn parses_period_labels() {
        assert_eq!(parse_period("Mar 2024", Period::Month), Some((2024, 3)));
        assert_eq!(parse_period("W4, 2023", Period::Week), Some((2023, 4)));
        assert_eq!(parse_period(UNKNOWN_PERIOD, Period::Month), None);
        assert_eq!(parse_period(UNKNOWN_PERIOD, Period::Week), None);
        assert_eq!(parse_period("W4 2023", Period::Week), None);
    }

    #[test]
    fn malformed_timestamps_share_one_trailing_week() {
        let history = vec![
            deposit("bad-1", 7, "soon"),
            deposit("late", 30, "2024-03-10T12:00"),
            deposit("bad-2", 8, "2024-13-40T99:00"),
            deposit("early", 50, "2024-03-02T12:00"),
            deposit("bad-3", 9, ""),
        ];
        let buckets = bucketize(&history, Granularity::Week, "A", &utc());

        assert_eq!(labels(&buckets), vec!["W1, 2024", "W2, 2024", UNKNOWN_PERIOD]);
        assert_eq!(buckets[0].credit, Decimal::from(50));
        assert_eq!(buckets[1].credit, Decimal::from(30));
        assert_eq!(buckets[2].credit, Decimal::from(24));
        assert_eq!(buckets[2].order_index, 2);
    }

    #[test]
    fn huge_sums_clamp_instead_of_overflowing() {
        let huge = Decimal::from_scientific("5e28").unwrap();
        let history: Vec<Transaction> = ["a", "b"]
            .iter()
            .map(|id| Transaction {
                id: id.to_string(),
                kind: TransactionKind::Deposit,
                amount: huge,
                timestamp: "2024-03-02T12:00".to_string(),
            })
            .collect();

        let buckets = bucketize(&history, Granularity::Week, "A", &utc());
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].credit, Decimal::MAX);
    }
}
