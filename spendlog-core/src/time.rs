//! Time utilities: the injected "today" and month naming.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

/// Source of the current date. The evaluator and intake only ever see the
/// `NaiveDate` this returns.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in an IANA timezone like "Asia/Kolkata".
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: &str) -> Result<Self> {
        let tz: Tz = tz
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
        Ok(Self { tz })
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// English month name used to partition the ledger, e.g. "October".
pub fn month_sheet_name(date: NaiveDate) -> String {
    date.format("%B").to_string()
}

/// Accepts `YYYY-MM-DD` or `DD/MM/YYYY`.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .map_err(|e| anyhow::anyhow!("invalid date '{s}': {e}"))
}
