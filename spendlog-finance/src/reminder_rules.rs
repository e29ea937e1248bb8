//! Load reminder rules from disk.
//!
//! Recurring bills come from `reminders.json`:
//!   [{"desc": "Electricity", "main_type": "Utilities", "sub_type": "Electricity",
//!     "date_range": "1-5"}]
//!
//! Credit cards come from a CSV with columns:
//!   Due Date,Name,Amount,Status
//!   15/06,HDFC Regalia,"12,450",Unpaid
//!
//! Malformed rules are rejected here and reported next to the accepted ones.

use anyhow::{Context, Result};
use serde::Deserialize;
use spendlog_core::{DayWindow, PaidStatus, ReminderRule, RuleError};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
struct ReminderDef {
    #[serde(alias = "description")]
    desc: String,
    #[serde(default)]
    main_type: String,
    #[serde(default)]
    sub_type: String,
    date_range: String,
}

impl TryFrom<ReminderDef> for ReminderRule {
    type Error = RuleError;

    fn try_from(def: ReminderDef) -> Result<Self, Self::Error> {
        let window: DayWindow = def.date_range.parse()?;
        Ok(ReminderRule::window(
            def.desc.trim(),
            def.main_type.trim(),
            def.sub_type.trim(),
            window,
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRule {
    /// 0-based position in the source file
    pub index: usize,
    pub description: String,
    pub error: RuleError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedRules {
    pub rules: Vec<ReminderRule>,
    pub rejected: Vec<RejectedRule>,
}

impl LoadedRules {
    pub fn extend(&mut self, other: LoadedRules) {
        self.rules.extend(other.rules);
        self.rejected.extend(other.rejected);
    }

    fn reject(&mut self, index: usize, description: &str, error: RuleError) {
        warn!(index, rule = description, error = %error, "rejected reminder rule");
        self.rejected.push(RejectedRule {
            index,
            description: description.to_string(),
            error,
        });
    }
}

pub fn parse_reminders_json(json: &str) -> Result<LoadedRules> {
    let defs: Vec<ReminderDef> = serde_json::from_str(json).context("parse reminders")?;
    let mut loaded = LoadedRules::default();
    for (i, def) in defs.into_iter().enumerate() {
        let desc = def.desc.clone();
        match ReminderRule::try_from(def) {
            Ok(rule) => loaded.rules.push(rule),
            Err(e) => loaded.reject(i, &desc, e),
        }
    }
    Ok(loaded)
}

/// Read `reminders.json`; a missing file means no reminders.
pub fn load_reminders(path: impl AsRef<Path>) -> Result<LoadedRules> {
    let path = path.as_ref();
    if !path.exists() {
        warn!(path = %path.display(), "reminders file not found");
        return Ok(LoadedRules::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_reminders_json(&s).with_context(|| format!("parsing {}", path.display()))
}

/// Parse credit card rows. Rows with fewer than four columns are ignored.
pub fn parse_cards_csv(reader: impl Read) -> Result<LoadedRules> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let mut loaded = LoadedRules::default();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        if record.len() < 4 {
            continue;
        }

        let name = record.get(1).unwrap_or("").trim();
        let due = record.get(0).unwrap_or("").trim();
        let due_day = match parse_due_day(due) {
            Some(d) => d,
            None => {
                loaded.reject(i, name, RuleError::MalformedDateRange(due.to_string()));
                continue;
            }
        };

        let rule = ReminderRule::card(
            name,
            due_day,
            parse_card_amount(record.get(2).unwrap_or("")),
            PaidStatus::from_label(record.get(3).unwrap_or("")),
        );
        match rule.validate() {
            Ok(()) => loaded.rules.push(rule),
            Err(e) => loaded.reject(i, name, e),
        }
    }
    Ok(loaded)
}

/// Read the card CSV; a missing file means no cards.
pub fn load_cards(path: impl AsRef<Path>) -> Result<LoadedRules> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(LoadedRules::default());
    }
    let f = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_cards_csv(f).with_context(|| format!("parsing {}", path.display()))
}

/// "15", "15/06" or "15/06/2025" -> 15
fn parse_due_day(s: &str) -> Option<u32> {
    s.split('/').next()?.trim().parse().ok()
}

/// Blank or unreadable amounts are unknown, not zero.
fn parse_card_amount(s: &str) -> Option<f64> {
    let cleaned = s.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}
