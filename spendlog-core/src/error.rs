//! Error types for reminder rule validation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("invalid date range {start}-{end}: days must be within 1-31 and start <= end")]
    InvalidDateRange { start: u32, end: u32 },

    #[error("malformed date range {0:?}: expected <start>-<end>")]
    MalformedDateRange(String),

    #[error("invalid due day {0}: must be within 1-31")]
    InvalidDueDay(u32),
}
