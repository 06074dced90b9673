use super::errors::SessionError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// State of the one-time password check for a session.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TwoFactor {
    /// The account has no second factor configured
    #[default]
    Disabled,
    /// An OTP was issued and not yet confirmed
    Pending,
    /// The OTP was confirmed
    Verified,
}

impl FromStr for TwoFactor {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" => Ok(Self::Disabled),
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            other => Err(SessionError::InvalidTwoFactor(other.to_string())),
        }
    }
}

/// Identity and authentication state of the caller, passed explicitly to
/// every operation that renders account data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionContext {
    pub account: String,
    pub two_factor: TwoFactor,
}

impl SessionContext {
    pub fn new(account: impl Into<String>, two_factor: TwoFactor) -> Self {
        Self {
            account: account.into(),
            two_factor,
        }
    }

    /// Returns the account identity if the session may see protected data.
    pub fn authorize(&self) -> Result<&str, SessionError> {
        let account = self.account.trim();
        if account.is_empty() {
            return Err(SessionError::Unauthenticated);
        }
        match self.two_factor {
            TwoFactor::Pending => Err(SessionError::OtpRequired(account.to_string())),
            TwoFactor::Disabled | TwoFactor::Verified => Ok(account),
        }
    }
}
