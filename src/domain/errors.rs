use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RecordError {
    #[error("Invalid amount `{1}` in record {0}")]
    InvalidAmount(String, String),
    #[error("Negative amount in record {0}")]
    NegativeAmount(String),
    #[error("Amount `{1}` in record {0} exceeds the accepted maximum")]
    AmountTooLarge(String, String),
    #[error("Invalid withdrawal fee `{1}` in record {0}")]
    InvalidFee(String, String),
}

#[derive(Error, Debug, PartialEq)]
pub enum TimestampError {
    #[error("Unparsable timestamp `{0}`")]
    Unparsable(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum StorageError {
    #[error("No history stored for account {0}")]
    AccountNotFound(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum SessionError {
    #[error("Session carries no account identity")]
    Unauthenticated,
    #[error("One-time password verification pending for account {0}")]
    OtpRequired(String),
    #[error("Invalid two-factor status `{0}`")]
    InvalidTwoFactor(String),
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Session rejected")]
    Session(#[from] SessionError),
    #[error("History storage failed")]
    Storage(#[from] StorageError),
}
