//! History records as the wallet backend returns them, and their mapping
//! onto [`Transaction`].

use crate::domain::errors::RecordError;
use crate::domain::models::{Transaction, TransactionKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A scalar the backend sends either as a JSON string or as a number.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(text) => f.write_str(text.trim()),
            Scalar::Number(number) => write!(f, "{}", number),
        }
    }
}

impl Scalar {
    fn to_decimal(&self) -> Option<Decimal> {
        let text = self.to_string();
        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .ok()
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TransferRecord {
    pub trans_id: Scalar,
    pub sender: Scalar,
    pub receiver: Scalar,
    pub amount: Scalar,
    pub time_stamp: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct WithdrawalRecord {
    pub trans_id: Scalar,
    pub amount: Scalar,
    #[serde(default)]
    pub withdrawal_fee: Option<Scalar>,
    pub time_stamp: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct DepositRecord {
    pub transaction_id: Scalar,
    pub amount: Scalar,
    pub time_stamp: String,
}

/// The three history lists of one account.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct HistoryPayload {
    #[serde(default)]
    pub transfers: Vec<TransferRecord>,
    #[serde(default)]
    pub withdrawals: Vec<WithdrawalRecord>,
    #[serde(default)]
    pub deposits: Vec<DepositRecord>,
}

#[derive(Debug, Default)]
pub struct Normalized {
    pub transactions: Vec<Transaction>,
    pub rejected: Vec<RecordError>,
}

/// Largest amount or fee accepted from the backend (10^18).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA764_0000, 0x0DE0_B6B3, 0, false, 0);

fn amount_of(id: &str, raw: &Scalar) -> Result<Decimal, RecordError> {
    let amount = raw
        .to_decimal()
        .ok_or_else(|| RecordError::InvalidAmount(id.to_string(), raw.to_string()))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(RecordError::NegativeAmount(id.to_string()));
    }
    if amount > MAX_AMOUNT {
        return Err(RecordError::AmountTooLarge(id.to_string(), raw.to_string()));
    }
    Ok(amount)
}

fn fee_of(id: &str, raw: Option<&Scalar>) -> Result<Option<Decimal>, RecordError> {
    raw.map(|fee| {
        fee.to_decimal()
            .filter(|fee| (!fee.is_sign_negative() || fee.is_zero()) && *fee <= MAX_AMOUNT)
            .ok_or_else(|| RecordError::InvalidFee(id.to_string(), fee.to_string()))
    })
    .transpose()
}

impl TransferRecord {
    pub fn into_transaction(self) -> Result<Transaction, RecordError> {
        let id = self.trans_id.to_string();
        Ok(Transaction {
            amount: amount_of(&id, &self.amount)?,
            kind: TransactionKind::Transfer {
                sender: self.sender.to_string(),
                receiver: self.receiver.to_string(),
            },
            timestamp: self.time_stamp,
            id,
        })
    }
}

impl WithdrawalRecord {
    pub fn into_transaction(self) -> Result<Transaction, RecordError> {
        let id = self.trans_id.to_string();
        Ok(Transaction {
            amount: amount_of(&id, &self.amount)?,
            kind: TransactionKind::Withdrawal {
                fee: fee_of(&id, self.withdrawal_fee.as_ref())?,
            },
            timestamp: self.time_stamp,
            id,
        })
    }
}

impl DepositRecord {
    pub fn into_transaction(self) -> Result<Transaction, RecordError> {
        let id = self.transaction_id.to_string();
        Ok(Transaction {
            amount: amount_of(&id, &self.amount)?,
            kind: TransactionKind::Deposit,
            timestamp: self.time_stamp,
            id,
        })
    }
}

impl HistoryPayload {
    pub fn len(&self) -> usize {
        self.transfers.len() + self.withdrawals.len() + self.deposits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maps every record onto a [`Transaction`]. Records that cannot be
    /// mapped are reported in `rejected` and left out.
    pub fn normalize(self) -> Normalized {
        let results = self
            .transfers
            .into_iter()
            .map(TransferRecord::into_transaction)
            .chain(
                self.withdrawals
                    .into_iter()
                    .map(WithdrawalRecord::into_transaction),
            )
            .chain(self.deposits.into_iter().map(DepositRecord::into_transaction));

        let mut normalized = Normalized::default();
        for result in results {
            match result {
                Ok(transaction) => normalized.transactions.push(transaction),
                Err(e) => {
                    tracing::warn!("Rejected history record: {}", e);
                    normalized.rejected.push(e);
                }
            }
        }
        normalized
    }
}
