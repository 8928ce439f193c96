use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::domain::{MemberId, Timestamp, TransactionKind};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error type that captures ledger, rollup, and backend failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Plan limit of {limit} {kind} transactions reached for month {month}")]
    PlanLimitExceeded {
        month: Timestamp,
        kind: TransactionKind,
        limit: i64,
    },
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(Timestamp),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl LedgerError {
    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }
}

impl From<ValidationErrors> for LedgerError {
    fn from(errors: ValidationErrors) -> Self {
        LedgerError::Validation(errors)
    }
}

/// Field-level validation messages collected before any rollup is computed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub title: Option<String>,
    pub amount: Option<String>,
    pub members_amount: BTreeMap<MemberId, String>,
    pub date: Option<String>,
    pub period: Option<String>,
    pub general: Option<String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.amount.is_none()
            && self.members_amount.is_empty()
            && self.date.is_none()
            && self.period.is_none()
            && self.general.is_none()
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            general: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn date(message: impl Into<String>) -> Self {
        Self {
            date: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns `Ok(())` when no field failed, otherwise wraps `self` into an error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(message) = &self.general {
            parts.push(message.clone());
        }
        if let Some(message) = &self.title {
            parts.push(format!("title: {}", message));
        }
        if let Some(message) = &self.amount {
            parts.push(format!("amount: {}", message));
        }
        for (member, message) in &self.members_amount {
            parts.push(format!("member {}: {}", member, message));
        }
        if let Some(message) = &self.date {
            parts.push(format!("date: {}", message));
        }
        if let Some(message) = &self.period {
            parts.push(format!("period: {}", message));
        }
        write!(f, "{}", parts.join("; "))
    }
}
