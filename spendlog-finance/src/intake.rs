//! Intake: chat message -> categorized expense records, plus the daily summary.

use chrono::NaiveDate;
use spendlog_core::{categorize_record, ExpenseRecord, KnowledgeBase, MatchSource};
use spendlog_ingest::{parse_lines, ParseError};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Outcome of logging one message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntakeReport {
    /// One record per understood line, in message order
    pub records: Vec<ExpenseRecord>,
    /// Match source for each entry of `records`
    pub sources: Vec<MatchSource>,
    /// Lines that could not be understood
    pub failures: Vec<ParseError>,
}

impl IntakeReport {
    /// Records the categorizer could not place; storage marks them unidentified.
    pub fn uncategorized(&self) -> impl Iterator<Item = &ExpenseRecord> {
        self.records.iter().filter(|r| !r.is_categorized())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.failures.is_empty()
    }
}

/// Parse every line of `text`, categorize what parsed, and collect per-line
/// failures without dropping the lines that succeeded.
pub fn intake_message(text: &str, date: NaiveDate, user: &str, kb: &KnowledgeBase) -> IntakeReport {
    let mut report = IntakeReport::default();

    for result in parse_lines(text) {
        match result {
            Ok(line) => {
                let mut rec = ExpenseRecord::new(date, line.description, line.expression)
                    .with_logged_by(user);
                let verdict = categorize_record(&mut rec, kb);
                debug!(line_no = line.line_no, source = verdict.source.as_str(), "categorized line");
                report.sources.push(verdict.source);
                report.records.push(rec);
            }
            Err(e) => report.failures.push(e),
        }
    }

    info!(
        logged = report.records.len(),
        failed = report.failures.len(),
        "message processed"
    );
    report
}

/// One day's expenses
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub items: Vec<(String, String)>,
    pub total: f64,
    /// Total per main category; uncategorized spend sits under ""
    pub by_category: BTreeMap<String, f64>,
}

pub fn summarize_day(records: &[ExpenseRecord], date: NaiveDate) -> DailySummary {
    let mut items = Vec::new();
    let mut total = 0.0;
    let mut by_category: BTreeMap<String, f64> = BTreeMap::new();

    for r in records.iter().filter(|r| r.date == date) {
        let amount = r.numeric_amount();
        items.push((r.description.clone(), r.raw_amount.clone()));
        total += amount;
        *by_category.entry(r.main_category.clone()).or_insert(0.0) += amount;
    }

    DailySummary {
        date,
        items,
        total,
        by_category,
    }
}

impl DailySummary {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Plain two-column table of description and amount.
    pub fn render_table(&self) -> String {
        if self.items.is_empty() {
            return "No expenses to display.".to_string();
        }
        let width = self
            .items
            .iter()
            .map(|(d, _)| d.chars().count())
            .max()
            .unwrap_or(0)
            .max("Description".len());

        let mut out = format!("{:<width$}  Amount\n", "Description");
        for (desc, amount) in &self.items {
            out.push_str(&format!("{desc:<width$}  {amount}\n"));
        }
        out.push_str(&format!("\nTotal: {:.2}", self.total));
        out
    }
}
