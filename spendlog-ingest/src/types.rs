use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One understood line of an expense message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedLine {
    /// 1-based position in the original message
    pub line_no: usize,
    pub description: String,
    /// Amount text as typed, e.g. `500+50+75` or `1,200`
    pub expression: String,
    /// Sum of the `+`-joined terms
    pub amount: f64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line_no} could not be understood: no amount found in {line:?}")]
    NoAmount { line_no: usize, line: String },

    #[error("line {line_no} could not be understood: missing description in {line:?}")]
    NoDescription { line_no: usize, line: String },
}

impl ParseError {
    pub fn line_no(&self) -> usize {
        match self {
            ParseError::NoAmount { line_no, .. } | ParseError::NoDescription { line_no, .. } => *line_no,
        }
    }

    pub fn line(&self) -> &str {
        match self {
            ParseError::NoAmount { line, .. } | ParseError::NoDescription { line, .. } => line,
        }
    }
}
