//! Reminder rules and the date-window evaluator.
//!
//! Rules are stateless input: `evaluate` is a pure function of the date and
//! the rule list, so repeated calls give the same answer.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

use crate::error::RuleError;
use crate::record::ExpenseRecord;

/// Inclusive day-of-month window, e.g. `1-5`. Never wraps across months.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayWindow {
    pub start_day: u32,
    pub end_day: u32,
}

impl DayWindow {
    pub fn new(start_day: u32, end_day: u32) -> Result<Self, RuleError> {
        let w = Self { start_day, end_day };
        w.validate()?;
        Ok(w)
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        let in_month = |d: u32| (1..=31).contains(&d);
        if !in_month(self.start_day) || !in_month(self.end_day) || self.start_day > self.end_day {
            return Err(RuleError::InvalidDateRange {
                start: self.start_day,
                end: self.end_day,
            });
        }
        Ok(())
    }

    pub fn contains(&self, day: u32) -> bool {
        self.start_day <= day && day <= self.end_day
    }
}

impl FromStr for DayWindow {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| RuleError::MalformedDateRange(s.to_string()))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| RuleError::MalformedDateRange(s.to_string()))
        };
        DayWindow::new(parse(start)?, parse(end)?)
    }
}

/// Payment state of a credit card for the current cycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaidStatus {
    Paid,
    Unpaid,
    #[default]
    Unknown,
}

impl PaidStatus {
    /// Read the free-text status cell kept next to a card.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "paid" => PaidStatus::Paid,
            "" => PaidStatus::Unknown,
            "unpaid" | "due" | "pending" | "not paid" => PaidStatus::Unpaid,
            _ => PaidStatus::Unknown,
        }
    }
}

/// When a rule fires
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReminderSchedule {
    /// Recurring bill: fires every day inside the window
    Window(DayWindow),
    /// Credit card: fires the day before and on the due day
    CardDue {
        due_day: u32,
        amount: Option<f64>,
        status: PaidStatus,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReminderRule {
    pub description: String,
    /// Category stamped on the expense when the reminder is paid
    pub main_category: String,
    pub sub_category: String,
    pub schedule: ReminderSchedule,
}

impl ReminderRule {
    pub fn window(
        description: impl Into<String>,
        main: impl Into<String>,
        sub: impl Into<String>,
        window: DayWindow,
    ) -> Self {
        Self {
            description: description.into(),
            main_category: main.into(),
            sub_category: sub.into(),
            schedule: ReminderSchedule::Window(window),
        }
    }

    pub fn card(
        description: impl Into<String>,
        due_day: u32,
        amount: Option<f64>,
        status: PaidStatus,
    ) -> Self {
        Self {
            description: description.into(),
            main_category: String::new(),
            sub_category: String::new(),
            schedule: ReminderSchedule::CardDue {
                due_day,
                amount,
                status,
            },
        }
    }

    pub fn with_categories(mut self, main: impl Into<String>, sub: impl Into<String>) -> Self {
        self.main_category = main.into();
        self.sub_category = sub.into();
        self
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        match self.schedule {
            ReminderSchedule::Window(w) => w.validate(),
            ReminderSchedule::CardDue { due_day, .. } => {
                if (1..=31).contains(&due_day) {
                    Ok(())
                } else {
                    Err(RuleError::InvalidDueDay(due_day))
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// Inside a recurring bill window
    Routine,
    DueTomorrow,
    DueToday,
}

/// A rule whose trigger holds today
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FiredReminder {
    /// Position of the rule in the evaluated list
    pub rule_index: usize,
    pub description: String,
    pub main_category: String,
    pub sub_category: String,
    pub amount: Option<f64>,
    pub urgency: Urgency,
    /// Due date for card reminders
    pub due_date: Option<NaiveDate>,
}

/// Evaluate every rule against `today`, keeping input order.
///
/// Malformed rules are logged and skipped; they never stop the rest.
pub fn evaluate(today: NaiveDate, rules: &[ReminderRule]) -> Vec<FiredReminder> {
    let mut fired = Vec::new();

    for (i, rule) in rules.iter().enumerate() {
        if let Err(e) = rule.validate() {
            warn!(rule = %rule.description, error = %e, "skipping malformed reminder rule");
            continue;
        }

        let hit = match rule.schedule {
            ReminderSchedule::Window(w) => w
                .contains(today.day())
                .then_some((Urgency::Routine, None, None)),
            ReminderSchedule::CardDue {
                due_day,
                amount,
                status,
            } => {
                if status == PaidStatus::Paid || amount == Some(0.0) {
                    None
                } else {
                    card_urgency(today, due_day).map(|(u, due)| (u, amount, Some(due)))
                }
            }
        };

        if let Some((urgency, amount, due_date)) = hit {
            fired.push(FiredReminder {
                rule_index: i,
                description: rule.description.clone(),
                main_category: rule.main_category.clone(),
                sub_category: rule.sub_category.clone(),
                amount,
                urgency,
                due_date,
            });
        }
    }

    fired
}

/// Drop window reminders whose category pair already shows up in `logged`
/// (typically the current month's records). Card reminders pass through.
pub fn outstanding(fired: Vec<FiredReminder>, logged: &[ExpenseRecord]) -> Vec<FiredReminder> {
    fired
        .into_iter()
        .filter(|f| {
            if f.urgency != Urgency::Routine || f.main_category.is_empty() {
                return true;
            }
            !logged
                .iter()
                .any(|r| r.main_category == f.main_category && r.sub_category == f.sub_category)
        })
        .collect()
}

fn card_urgency(today: NaiveDate, due_day: u32) -> Option<(Urgency, NaiveDate)> {
    let this_month = due_date_in(today.year(), today.month(), due_day)?;
    if today == this_month {
        return Some((Urgency::DueToday, this_month));
    }

    let (ny, nm) = next_month(today.year(), today.month());
    let next = due_date_in(ny, nm, due_day)?;
    [this_month, next]
        .into_iter()
        .find(|due| due.pred_opt() == Some(today))
        .map(|due| (Urgency::DueTomorrow, due))
}

/// The due date for a month, clamped to the month's last day.
pub fn due_date_in(year: i32, month: u32, due_day: u32) -> Option<NaiveDate> {
    let last = last_day_of_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, due_day.min(last.day()))
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (ny, nm) = next_month(year, month);
    NaiveDate::from_ymd_opt(ny, nm, 1)?.pred_opt()
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}
