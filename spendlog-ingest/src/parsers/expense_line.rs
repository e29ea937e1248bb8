//! Free-text expense line parser
//!
//! Expected shape, one expense per line:
//!   Restaurant bill 500+50+75
//!   Room 101 rent 1,200
//!
//! The amount is the rightmost maximal run of `+`-joined numbers; everything
//! before it is the description.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::types::{ParseError, ParsedLine};

fn line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(?P<desc>.*?\S)\s+",
            r"(?P<expr>[0-9][0-9,]*(?:\.[0-9]+)?(?:\s*\+\s*[0-9][0-9,]*(?:\.[0-9]+)?)*)$"
        ))
        .expect("invalid expense line regex")
    })
}

fn bare_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9][0-9,]*(?:\.[0-9]+)?(?:\s*\+\s*[0-9][0-9,]*(?:\.[0-9]+)?)*$")
            .expect("invalid bare amount regex")
    })
}

/// Parse a single line (reported as line 1 on failure).
pub fn parse_line(text: &str) -> Result<ParsedLine, ParseError> {
    parse_numbered_line(1, text)
}

/// Parse a line known to sit at `line_no` of a larger message.
pub fn parse_numbered_line(line_no: usize, text: &str) -> Result<ParsedLine, ParseError> {
    let line = text.trim();

    let Some(caps) = line_re().captures(line) else {
        if bare_amount_re().is_match(line) {
            return Err(ParseError::NoDescription {
                line_no,
                line: line.to_string(),
            });
        }
        return Err(ParseError::NoAmount {
            line_no,
            line: line.to_string(),
        });
    };

    let expression = caps["expr"].split_whitespace().collect::<String>();
    let Some(amount) = sum_terms(&expression) else {
        return Err(ParseError::NoAmount {
            line_no,
            line: line.to_string(),
        });
    };
    let description = caps["desc"].trim().to_string();
    debug!(line_no, %description, %expression, amount, "parsed expense line");

    Ok(ParsedLine {
        line_no,
        description,
        expression,
        amount,
    })
}

/// Parse every non-blank line of a message. Failures are reported per line
/// and never discard the lines that did parse.
pub fn parse_lines(text: &str) -> Vec<Result<ParsedLine, ParseError>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_numbered_line(i + 1, line))
        .collect()
}

/// `None` when a term does not parse or the total is not finite.
fn sum_terms(expression: &str) -> Option<f64> {
    let mut total = 0.0;
    for term in expression.split('+') {
        total += term.replace(',', "").parse::<f64>().ok()?;
    }
    total.is_finite().then_some(total)
}
