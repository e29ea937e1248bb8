//! Expense record: the normalized unit produced per logged line

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::categorizer::Categorization;

/// One logged spend event, ready for the storage collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Row ordinal assigned by storage; opaque to the core
    pub sequence_id: Option<u64>,
    /// Date the message was processed
    pub date: NaiveDate,
    /// Trimmed, non-empty free text
    pub description: String,
    /// Amount as typed (may keep thousands separators or a `+` expression)
    pub raw_amount: String,
    /// Empty until categorized
    pub main_category: String,
    /// Empty until categorized
    pub sub_category: String,
    /// Name of the user who logged the expense
    pub logged_by: String,
    /// True when the category was assigned by the categorizer rather than a human
    pub bot_identified: bool,
    #[serde(skip)]
    numeric: OnceLock<f64>,
}

impl ExpenseRecord {
    pub fn new(date: NaiveDate, description: impl Into<String>, raw_amount: impl Into<String>) -> Self {
        Self {
            sequence_id: None,
            date,
            description: description.into().trim().to_string(),
            raw_amount: raw_amount.into().trim().to_string(),
            main_category: String::new(),
            sub_category: String::new(),
            logged_by: String::new(),
            bot_identified: false,
            numeric: OnceLock::new(),
        }
    }

    pub fn with_logged_by(mut self, user: impl Into<String>) -> Self {
        self.logged_by = user.into();
        self
    }

    pub fn with_sequence_id(mut self, id: u64) -> Self {
        self.sequence_id = Some(id);
        self
    }

    /// Attach categories that came from a human (e.g. a history row).
    pub fn with_categories(mut self, main: impl Into<String>, sub: impl Into<String>) -> Self {
        self.main_category = main.into();
        self.sub_category = sub.into();
        self
    }

    /// Decimal value of `raw_amount`, computed once.
    pub fn numeric_amount(&self) -> f64 {
        *self.numeric.get_or_init(|| parse_amount(&self.raw_amount))
    }

    pub fn is_categorized(&self) -> bool {
        !self.main_category.is_empty() && !self.sub_category.is_empty()
    }

    /// Stamp the categorizer's verdict onto the record.
    ///
    /// Only the first call on an uncategorized record has any effect; returns
    /// whether the record changed. An unmatched verdict leaves the categories
    /// empty and `bot_identified` false.
    pub fn apply(&mut self, verdict: &Categorization) -> bool {
        if !self.main_category.is_empty() || !self.sub_category.is_empty() {
            return false;
        }
        if !verdict.source.is_matched() {
            self.bot_identified = false;
            return false;
        }
        self.main_category = verdict.main_category.clone();
        self.sub_category = verdict.sub_category.clone();
        self.bot_identified = true;
        true
    }
}

impl PartialEq for ExpenseRecord {
    fn eq(&self, other: &Self) -> bool {
        self.sequence_id == other.sequence_id
            && self.date == other.date
            && self.description == other.description
            && self.raw_amount == other.raw_amount
            && self.main_category == other.main_category
            && self.sub_category == other.sub_category
            && self.logged_by == other.logged_by
            && self.bot_identified == other.bot_identified
    }
}

/// Parse an amount string, dropping thousands separators.
///
/// Accepts a plain number (`1,500.75`), a `+`-joined sum (`500+50+75`) and the
/// spreadsheet formula form (`=500+50`). Anything else yields `0.0`.
pub fn parse_amount(raw: &str) -> f64 {
    let expr = raw.trim();
    let expr = expr.strip_prefix('=').unwrap_or(expr);
    if expr.trim().is_empty() {
        return 0.0;
    }

    let mut total = 0.0;
    for term in expr.split('+') {
        let cleaned: String = term.trim().chars().filter(|c| *c != ',').collect();
        match cleaned.parse::<f64>() {
            Ok(v) if v.is_finite() => total += v,
            _ => return 0.0,
        }
    }
    total
}
