//! spendlog-finance: file-backed collaborators around the core (keyword table,
//! learned types store, reminder loaders, monthly ledger) and the intake pipeline.

pub mod intake;
pub mod keyword_rules;
pub mod ledger;
pub mod reminder_rules;
pub mod types_store;

pub use intake::{intake_message, summarize_day, DailySummary, IntakeReport};
pub use keyword_rules::{default_keyword_rules, load_keyword_rules};
pub use ledger::{append_records, ledger_path, read_ledger};
pub use reminder_rules::{load_cards, load_reminders, LoadedRules, RejectedRule};
pub use types_store::{build_knowledge, load_types, merge_history, save_types, TypeEntry};
