use anyhow::Result;
use chrono::NaiveDate;
use spendlog_core::{evaluate, outstanding, FiredReminder, Urgency};
use spendlog_finance::{ledger_path, load_cards, load_reminders, read_ledger};
use tracing::info;

use crate::config::PathsSection;

/// Evaluate bill and card reminders for `today` and print what is still open.
pub fn run(paths: &PathsSection, today: NaiveDate, include_logged: bool) -> Result<()> {
    let mut loaded = load_reminders(&paths.reminders)?;
    loaded.extend(load_cards(&paths.cards)?);

    for r in &loaded.rejected {
        println!("Ignoring reminder '{}': {}", r.description, r.error);
    }

    let fired = evaluate(today, &loaded.rules);
    let fired = if include_logged {
        fired
    } else {
        let month = read_ledger(ledger_path(&paths.ledger_dir, today))?;
        outstanding(fired, &month)
    };
    info!(rules = loaded.rules.len(), open = fired.len(), "reminders evaluated");

    if fired.is_empty() {
        println!("No reminders for today. Enjoy your day!");
        return Ok(());
    }

    println!("Today's reminders:");
    for f in &fired {
        println!("- {}", render(f, today));
    }
    Ok(())
}

fn render(f: &FiredReminder, today: NaiveDate) -> String {
    let due = f.due_date.unwrap_or(today).format("%d/%m");
    let amount = f
        .amount
        .map(|a| format!(", amount {a:.2}"))
        .unwrap_or_default();
    match f.urgency {
        Urgency::Routine => f.description.clone(),
        Urgency::DueTomorrow => format!(
            "Credit card payment for {} is due tomorrow - {due}{amount}",
            f.description
        ),
        Urgency::DueToday => format!(
            "Credit card payment for {} is due today - {due}{amount}",
            f.description
        ),
    }
}
