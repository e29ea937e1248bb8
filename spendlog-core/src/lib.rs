//! spendlog-core: expense records, category matching and reminder evaluation

pub mod categorizer;
pub mod error;
pub mod knowledge;
pub mod record;
pub mod reminders;
pub mod time;

pub use categorizer::{categorize, categorize_record, Categorization, MatchSource};
pub use error::RuleError;
pub use knowledge::{
    normalize, refresh, similarity, CategoryMatch, CategoryPair, KeywordRule, KnowledgeBase,
    KnowledgeBuilder, SharedKnowledge, DEFAULT_FUZZY_THRESHOLD,
};
pub use record::{parse_amount, ExpenseRecord};
pub use reminders::{
    evaluate, outstanding, DayWindow, FiredReminder, PaidStatus, ReminderRule, ReminderSchedule,
    Urgency,
};
pub use time::{month_sheet_name, Clock, FixedClock, SystemClock};
