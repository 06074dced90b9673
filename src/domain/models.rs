use super::errors::{StorageError, TimestampError};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Naive timestamps are read in the display time zone.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A wallet transaction as seen by the chart pipeline.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Transaction {
    /// Backend identifier of the transaction
    pub id: String,
    /// What kind of movement this is, with the fields relevant to it
    #[serde(flatten)]
    pub kind: TransactionKind,
    /// Non-negative amount moved
    pub amount: Decimal,
    /// Raw timestamp as recorded by the backend
    pub timestamp: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransactionKind {
    Transfer { sender: String, receiver: String },
    Deposit,
    Withdrawal { fee: Option<Decimal> },
}

impl Transaction {
    /// Parses the raw timestamp into the given display time zone.
    pub fn recorded_at(&self, zone: &FixedOffset) -> Result<DateTime<FixedOffset>, TimestampError> {
        parse_timestamp(&self.timestamp, zone)
    }
}

/// Parses an ISO-8601 timestamp. Values carrying an offset are converted into
/// `zone`, naive values are taken to already be in `zone`.
pub fn parse_timestamp(raw: &str, zone: &FixedOffset) -> Result<DateTime<FixedOffset>, TimestampError> {
    let raw = raw.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Ok(datetime.with_timezone(zone));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| TimestampError::Unparsable(raw.to_string()))?;

    naive
        .and_local_timezone(*zone)
        .single()
        .ok_or_else(|| TimestampError::Unparsable(raw.to_string()))
}

/// Time grouping applied to the history before charting.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One bucket per transaction
    #[default]
    Transaction,
    /// One bucket per week of the month
    Week,
    /// One bucket per calendar month
    Month,
}

/// An aggregated time slice of the history.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Bucket {
    /// Grouping key, or clock time in per-transaction mode
    pub label: String,
    /// Tooltip date, only set in per-transaction mode
    pub full_date: Option<String>,
    /// Sum of incoming amounts
    pub credit: Decimal,
    /// Sum of outgoing amounts
    pub debit: Decimal,
    /// Position in the full, unzoomed sequence
    pub order_index: usize,
}

/// Y-axis range of the chart, always anchored at zero.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct YDomain(pub Decimal, pub Decimal);

/// Trait for per-account history storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait HistoryStore {
    /// Appends transactions to an account's history, skipping ids it already
    /// holds. Returns how many were stored.
    async fn store_transactions(
        &self,
        account: String,
        transactions: Vec<Transaction>,
    ) -> Result<usize, StorageError>;

    /// Retrieves an account's history in the order it was stored.
    async fn get_transactions(&self, account: String) -> Result<Vec<Transaction>, StorageError>;

    /// Drops an account's history.
    async fn clear(&self, account: String) -> Result<(), StorageError>;
}
