//! Category knowledge base: curated keyword rules plus a learned mapping from
//! past descriptions to (main, sub) category pairs.
//!
//! A `KnowledgeBase` is an immutable snapshot. Refreshing builds a new one;
//! `SharedKnowledge` swaps the snapshot readers observe.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::categorizer::MatchSource;
use crate::record::ExpenseRecord;

/// Minimum similarity (0-100) for a fuzzy hit to be accepted
pub const DEFAULT_FUZZY_THRESHOLD: u8 = 75;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryPair {
    pub main: String,
    pub sub: String,
}

impl CategoryPair {
    pub fn new(main: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            main: main.into(),
            sub: sub.into(),
        }
    }
}

/// Curated description -> category association. Wins over learned history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub main_category: String,
    pub sub_category: String,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new(main: impl Into<String>, sub: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            main_category: main.into(),
            sub_category: sub.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// True if any keyword appears as a whole word (or whole-word phrase).
    pub fn matches(&self, normalized: &str) -> bool {
        let words = words_of(normalized);
        self.keywords.iter().any(|kw| {
            let kw = normalize(kw);
            let phrase = words_of(&kw);
            !phrase.is_empty() && words.windows(phrase.len()).any(|w| w == phrase.as_slice())
        })
    }

    fn pair(&self) -> CategoryPair {
        CategoryPair::new(&self.main_category, &self.sub_category)
    }
}

/// A successful lookup
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMatch {
    pub pair: CategoryPair,
    pub source: MatchSource,
}

#[derive(Debug, Clone)]
struct Observation {
    pair: CategoryPair,
    count: u32,
    last_seen: u64,
}

#[derive(Debug, Clone, Default)]
struct Entry {
    observations: Vec<Observation>,
    last_seen: u64,
}

impl Entry {
    /// Most frequent pair; the most recent one on equal counts.
    fn best(&self) -> Option<&Observation> {
        self.observations.iter().max_by_key(|o| (o.count, o.last_seen))
    }
}

#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    keyword_rules: Vec<KeywordRule>,
    entries: HashMap<String, Entry>,
    fuzzy_threshold: u8,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::empty()
    }
}

impl KnowledgeBase {
    /// A base that matches nothing.
    pub fn empty() -> Self {
        Self {
            keyword_rules: Vec::new(),
            entries: HashMap::new(),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }

    pub fn builder() -> KnowledgeBuilder {
        KnowledgeBuilder::new()
    }

    /// Rebuild from history, keeping this base's keyword rules and threshold.
    pub fn refreshed(&self, history: &[ExpenseRecord]) -> KnowledgeBase {
        let mut builder = KnowledgeBuilder::new()
            .keyword_rules(self.keyword_rules.clone())
            .fuzzy_threshold(self.fuzzy_threshold);
        builder.observe_all(history);
        builder.build()
    }

    pub fn keyword_rules(&self) -> &[KeywordRule] {
        &self.keyword_rules
    }

    pub fn fuzzy_threshold(&self) -> u8 {
        self.fuzzy_threshold
    }

    /// Number of distinct learned descriptions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.keyword_rules.is_empty()
    }

    /// Find the category for a description.
    ///
    /// Keyword rules are tried first, in configuration order. Otherwise the
    /// best-scoring learned description at or above the threshold wins, ties
    /// going to the most recently observed one.
    pub fn lookup(&self, description: &str) -> Option<CategoryMatch> {
        let query = normalize(description);
        if query.is_empty() {
            return None;
        }

        if let Some(rule) = self.keyword_rules.iter().find(|r| r.matches(&query)) {
            debug!(description = %query, main = %rule.main_category, "keyword match");
            return Some(CategoryMatch {
                pair: rule.pair(),
                source: MatchSource::Keyword,
            });
        }

        let mut best: Option<(u8, u64, &Entry)> = None;
        for (known, entry) in &self.entries {
            let score = similarity(known, &query);
            if score < self.fuzzy_threshold {
                continue;
            }
            let better = match best {
                None => true,
                Some((s, seen, _)) => (score, entry.last_seen) > (s, seen),
            };
            if better {
                best = Some((score, entry.last_seen, entry));
            }
        }

        let (score, _, entry) = best?;
        let obs = entry.best()?;
        debug!(description = %query, score, main = %obs.pair.main, "fuzzy match");
        Some(CategoryMatch {
            pair: obs.pair.clone(),
            source: MatchSource::Fuzzy { score },
        })
    }
}

/// Rebuild a base from history alone (no keyword rules, default threshold).
pub fn refresh(history: &[ExpenseRecord]) -> KnowledgeBase {
    KnowledgeBase::empty().refreshed(history)
}

/// Incremental construction of a `KnowledgeBase`.
#[derive(Debug, Default)]
pub struct KnowledgeBuilder {
    keyword_rules: Vec<KeywordRule>,
    entries: HashMap<String, Entry>,
    fuzzy_threshold: Option<u8>,
    seq: u64,
    skipped: usize,
}

impl KnowledgeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword_rules(mut self, rules: Vec<KeywordRule>) -> Self {
        self.keyword_rules = rules;
        self
    }

    pub fn fuzzy_threshold(mut self, threshold: u8) -> Self {
        self.fuzzy_threshold = Some(threshold.min(100));
        self
    }

    /// Record one description/category association. Later observations count
    /// as more recent. Returns false when the input was skipped.
    pub fn observe(&mut self, description: &str, main: &str, sub: &str) -> bool {
        let key = normalize(description);
        let (main, sub) = (main.trim(), sub.trim());
        if key.is_empty() || main.is_empty() || sub.is_empty() {
            warn!(
                description,
                main,
                sub,
                "skipping history record without description or category"
            );
            self.skipped += 1;
            return false;
        }

        self.seq += 1;
        let seq = self.seq;
        let entry = self.entries.entry(key).or_default();
        entry.last_seen = seq;
        match entry
            .observations
            .iter_mut()
            .find(|o| o.pair.main == main && o.pair.sub == sub)
        {
            Some(o) => {
                o.count += 1;
                o.last_seen = seq;
            }
            None => entry.observations.push(Observation {
                pair: CategoryPair::new(main, sub),
                count: 1,
                last_seen: seq,
            }),
        }
        true
    }

    /// Learn from a history record. Uncategorized records and records the
    /// categorizer itself labelled are skipped.
    pub fn observe_record(&mut self, record: &ExpenseRecord) -> bool {
        if record.bot_identified {
            debug!(description = %record.description, "skipping bot-identified history record");
            self.skipped += 1;
            return false;
        }
        self.observe(&record.description, &record.main_category, &record.sub_category)
    }

    pub fn observe_all(&mut self, history: &[ExpenseRecord]) {
        for record in history {
            self.observe_record(record);
        }
    }

    /// Inputs rejected so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn build(self) -> KnowledgeBase {
        info!(
            learned = self.entries.len(),
            skipped = self.skipped,
            keyword_rules = self.keyword_rules.len(),
            "knowledge base built"
        );
        KnowledgeBase {
            keyword_rules: self.keyword_rules,
            entries: self.entries,
            fuzzy_threshold: self.fuzzy_threshold.unwrap_or(DEFAULT_FUZZY_THRESHOLD),
        }
    }
}

/// Holder for the current snapshot. Readers clone the `Arc`; a refresh builds
/// the next base off to the side and swaps it in whole.
#[derive(Debug, Default)]
pub struct SharedKnowledge {
    current: RwLock<Arc<KnowledgeBase>>,
}

impl SharedKnowledge {
    pub fn new(base: KnowledgeBase) -> Self {
        Self {
            current: RwLock::new(Arc::new(base)),
        }
    }

    pub fn snapshot(&self) -> Arc<KnowledgeBase> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Install a new base, returning the previous snapshot.
    pub fn replace(&self, base: KnowledgeBase) -> Arc<KnowledgeBase> {
        self.install(Arc::new(base))
    }

    /// Rebuild from history against the current snapshot's configuration.
    pub fn refresh(&self, history: &[ExpenseRecord]) -> Arc<KnowledgeBase> {
        let next = Arc::new(self.snapshot().refreshed(history));
        self.install(Arc::clone(&next));
        next
    }

    fn install(&self, next: Arc<KnowledgeBase>) -> Arc<KnowledgeBase> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, next)
    }
}

/// Lowercase, trim and collapse internal whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn words_of(s: &str) -> Vec<&str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Similarity on a 0-100 scale: `200 * LCS / (len_a + len_b)` over characters.
/// Zero when either side is empty.
pub fn similarity(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let lcs = lcs_len(&a, &b);
    let ratio = (200.0 * lcs as f64) / (a.len() + b.len()) as f64;
    ratio.round() as u8
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                cur[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(desc: &str, main: &str, sub: &str) -> ExpenseRecord {
        ExpenseRecord::new(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(), desc, "100")
            .with_categories(main, sub)
    }

    fn food_rules() -> Vec<KeywordRule> {
        vec![
            KeywordRule::new(
                "Food",
                "Outside Food/Dining/Snacks",
                &["pizza", "burger", "ice cream"],
            ),
            KeywordRule::new("Household", "Groceries", &["milk", "vegetables", "pizza"]),
        ]
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Morning   COFFEE \t at Cafe "), "morning coffee at cafe");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_similarity_scores() {
        assert_eq!(similarity("abcd", "abcd"), 100);
        assert_eq!(similarity("abcd", "abef"), 50);
        assert_eq!(similarity("", "abc"), 0);
        assert_eq!(similarity("abc", "xyz"), 0);
    }

    #[test]
    fn test_empty_history_matches_nothing() {
        let kb = refresh(&[]);
        assert!(kb.is_empty());
        assert_eq!(kb.lookup("coffee"), None);
        assert_eq!(kb.lookup(""), None);
    }

    #[test]
    fn test_exact_history_match() {
        let kb = refresh(&[rec("Coffee", "Food", "Beverages")]);
        let m = kb.lookup("  COFFEE ").unwrap();
        assert_eq!(m.pair, CategoryPair::new("Food", "Beverages"));
        assert_eq!(m.source, MatchSource::Fuzzy { score: 100 });
    }

    #[test]
    fn test_fuzzy_match_above_threshold() {
        let kb = refresh(&[rec("Electricity bill", "Utilities", "Electricity")]);
        let m = kb.lookup("electricity bil").unwrap();
        assert_eq!(m.pair.sub, "Electricity");
        assert!(matches!(m.source, MatchSource::Fuzzy { score } if score >= 75));
    }

    #[test]
    fn test_fuzzy_match_below_threshold_is_none() {
        let kb = refresh(&[rec("abcd", "Misc", "Letters")]);
        assert_eq!(similarity("abcd", "abef"), 50);
        assert_eq!(kb.lookup("abef"), None);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut b = KnowledgeBase::builder().fuzzy_threshold(50);
        b.observe("abcd", "Misc", "Letters");
        let kb = b.build();
        assert!(kb.lookup("abef").is_some());
    }

    #[test]
    fn test_refresh_skips_uncategorized_and_bot_rows() {
        let mut bot = rec("Taxi", "Transport", "Cab");
        bot.bot_identified = true;
        let kb = refresh(&[rec("Lunch", "", ""), rec("Snacks", "Food", ""), bot]);
        assert_eq!(kb.len(), 0);
        assert_eq!(kb.lookup("taxi"), None);
    }

    #[test]
    fn test_builder_counts_skipped_records() {
        let mut bot = rec("Taxi", "Transport", "Cab");
        bot.bot_identified = true;
        let mut b = KnowledgeBuilder::new();
        b.observe_all(&[rec("Lunch", "", ""), bot, rec("Coffee", "Food", "Beverages")]);
        assert!(!b.observe("   ", "Food", "Snacks"));
        assert_eq!(b.skipped(), 3);
        assert_eq!(b.build().len(), 1);
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let kb = refresh(&[
            rec("Milk Packet", "Household", "Groceries"),
            rec("milk   packet", "Household", "Groceries"),
        ]);
        assert_eq!(kb.len(), 1);
    }

    #[test]
    fn test_most_frequent_pair_wins_then_most_recent() {
        let kb = refresh(&[
            rec("Swiggy", "Food", "Delivery"),
            rec("Swiggy", "Food", "Delivery"),
            rec("Swiggy", "Household", "Groceries"),
        ]);
        assert_eq!(kb.lookup("swiggy").unwrap().pair.sub, "Delivery");

        let kb = refresh(&[
            rec("Swiggy", "Food", "Delivery"),
            rec("Swiggy", "Household", "Groceries"),
        ]);
        assert_eq!(kb.lookup("swiggy").unwrap().pair.sub, "Groceries");
    }

    #[test]
    fn test_equal_scores_prefer_recent_entry() {
        // "abcx" and "abcy" both score 75 against "abcz"
        let kb = KnowledgeBase::builder().build().refreshed(&[
            rec("abcx", "Old", "One"),
            rec("abcy", "New", "Two"),
        ]);
        assert_eq!(similarity("abcx", "abcz"), 75);
        assert_eq!(kb.lookup("abcz").unwrap().pair.main, "New");
    }

    #[test]
    fn test_higher_score_beats_recency() {
        let kb = refresh(&[
            rec("grocery store", "Household", "Groceries"),
            rec("grocery stand", "Shopping", "Market"),
        ]);
        assert_eq!(kb.lookup("grocery store").unwrap().pair.main, "Household");
    }

    #[test]
    fn test_keyword_rules_take_precedence() {
        let mut b = KnowledgeBase::builder().keyword_rules(food_rules());
        b.observe("pizza hut", "Travel", "Flights");
        let kb = b.build();
        let m = kb.lookup("Pizza Hut").unwrap();
        assert_eq!(m.source, MatchSource::Keyword);
        assert_eq!(m.pair.main, "Food");
    }

    #[test]
    fn test_keyword_whole_word_and_phrase() {
        let rule = KeywordRule::new("Food", "Snacks", &["ice cream", "tea"]);
        assert!(rule.matches("ice cream cone"));
        assert!(rule.matches("masala tea, biscuits"));
        assert!(!rule.matches("steam iron"));
        assert!(!rule.matches("ice box cream"));
    }

    #[test]
    fn test_refreshed_keeps_configuration() {
        let kb = KnowledgeBase::builder()
            .keyword_rules(food_rules())
            .fuzzy_threshold(90)
            .build();
        let next = kb.refreshed(&[rec("Coffee", "Food", "Beverages")]);
        assert_eq!(next.fuzzy_threshold(), 90);
        assert_eq!(next.keyword_rules().len(), 2);
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn test_shared_knowledge_swaps_snapshots() {
        let shared = SharedKnowledge::new(KnowledgeBase::empty());
        let before = shared.snapshot();
        let after = shared.refresh(&[rec("Coffee", "Food", "Beverages")]);
        assert_eq!(before.lookup("coffee"), None);
        assert!(after.lookup("coffee").is_some());
        assert!(shared.snapshot().lookup("coffee").is_some());
    }

    #[test]
    fn test_shared_refresh_returns_installed_base() {
        let shared = SharedKnowledge::new(KnowledgeBase::empty());
        let installed = shared.refresh(&[rec("Coffee", "Food", "Beverages")]);
        assert!(Arc::ptr_eq(&installed, &shared.snapshot()));

        let previous = shared.replace(KnowledgeBase::empty());
        assert!(Arc::ptr_eq(&installed, &previous));
    }
}
