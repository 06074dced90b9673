use crate::domain::models::{Transaction, TransactionKind};

/// Which side(s) of the chart a transaction contributes to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flow {
    pub credit: bool,
    pub debit: bool,
}

impl Flow {
    pub const CREDIT: Flow = Flow {
        credit: true,
        debit: false,
    };
    pub const DEBIT: Flow = Flow {
        credit: false,
        debit: true,
    };
}

/// Classifies `transaction` from the point of view of `account`.
///
/// The credit and debit checks are independent of each other, so a transfer
/// from an account to itself is flagged on both sides.
pub fn classify(transaction: &Transaction, account: &str) -> Flow {
    match &transaction.kind {
        TransactionKind::Deposit => Flow::CREDIT,
        TransactionKind::Withdrawal { .. } => Flow::DEBIT,
        TransactionKind::Transfer { sender, receiver } => Flow {
            credit: receiver == account,
            debit: sender == account,
        },
    }
}
