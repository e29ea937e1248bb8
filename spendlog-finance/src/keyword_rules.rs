//! Curated keyword table consulted before learned history.
//!
//! File format (JSON), first matching rule wins:
//! [{"main_category": "Food", "sub_category": "Outside Food/Dining/Snacks",
//!   "keywords": ["pizza", "ice cream"]}]

use anyhow::{Context, Result};
use spendlog_core::KeywordRule;
use std::fs;
use std::path::Path;

/// Built-in table used when no keyword file is configured
pub fn default_keyword_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new(
            "Food",
            "Outside Food/Dining/Snacks",
            &[
                "pizza", "burger", "biryani", "dosa", "idli", "samosa", "snacks", "restaurant",
                "dining", "dinner", "lunch", "breakfast", "swiggy", "zomato", "cafe", "ice cream",
            ],
        ),
        KeywordRule::new(
            "Household",
            "Groceries",
            &[
                "groceries", "grocery", "vegetables", "veggies", "fruits", "milk", "eggs", "bread",
                "rice", "atta", "dal", "dmart", "bigbasket", "blinkit", "zepto",
            ],
        ),
    ]
}

pub fn parse_keyword_rules(json: &str) -> Result<Vec<KeywordRule>> {
    let rules: Vec<KeywordRule> = serde_json::from_str(json).context("parse keyword rules")?;
    Ok(rules
        .into_iter()
        .filter(|r| !r.main_category.trim().is_empty() && !r.keywords.is_empty())
        .collect())
}

pub fn load_keyword_rules(path: impl AsRef<Path>) -> Result<Vec<KeywordRule>> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_keyword_rules(&s).with_context(|| format!("parsing {}", path.display()))
}
