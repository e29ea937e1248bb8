//! spendlog-ingest: turns free-text chat lines into (description, amount) pairs.

pub mod parsers;
pub mod types;

pub use parsers::expense_line::{parse_line, parse_lines, parse_numbered_line};
pub use types::{ParseError, ParsedLine};
