//! Assigns a (main, sub) category pair to a parsed description.

use serde::{Deserialize, Serialize};

use crate::knowledge::KnowledgeBase;
use crate::record::ExpenseRecord;

/// Where a category verdict came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum MatchSource {
    /// Curated keyword rule
    Keyword,
    /// Learned history, with its similarity score
    Fuzzy { score: u8 },
    /// Nothing matched; the record stays uncategorized
    #[serde(rename = "none")]
    Unmatched,
}

impl MatchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchSource::Keyword => "keyword",
            MatchSource::Fuzzy { .. } => "fuzzy",
            MatchSource::Unmatched => "none",
        }
    }

    pub fn is_matched(&self) -> bool {
        !matches!(self, MatchSource::Unmatched)
    }
}

/// Categorization result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Categorization {
    pub main_category: String,
    pub sub_category: String,
    pub source: MatchSource,
}

impl Categorization {
    pub fn unmatched() -> Self {
        Self {
            main_category: String::new(),
            sub_category: String::new(),
            source: MatchSource::Unmatched,
        }
    }
}

/// Categorize a description against a knowledge base snapshot.
///
/// No match is a normal outcome: empty categories with `MatchSource::Unmatched`.
pub fn categorize(description: &str, kb: &KnowledgeBase) -> Categorization {
    match kb.lookup(description) {
        Some(m) => Categorization {
            main_category: m.pair.main,
            sub_category: m.pair.sub,
            source: m.source,
        },
        None => Categorization::unmatched(),
    }
}

/// Categorize a record in place. Returns the verdict that was applied.
pub fn categorize_record(record: &mut ExpenseRecord, kb: &KnowledgeBase) -> Categorization {
    let verdict = categorize(&record.description, kb);
    record.apply(&verdict);
    verdict
}
