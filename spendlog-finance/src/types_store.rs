//! Persisted learned types (`types_data.json`): every human-categorized
//! description seen so far, used to seed the knowledge base between runs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spendlog_core::{ExpenseRecord, KeywordRule, KnowledgeBase, KnowledgeBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeEntry {
    pub desc: String,
    pub main_type: String,
    pub sub_type: String,
}

impl TypeEntry {
    fn is_complete(&self) -> bool {
        !self.desc.trim().is_empty() && !self.main_type.trim().is_empty() && !self.sub_type.trim().is_empty()
    }
}

/// Read the store; a missing file is an empty store.
pub fn load_types(path: impl AsRef<Path>) -> Result<Vec<TypeEntry>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let entries: Vec<TypeEntry> =
        serde_json::from_str(&s).with_context(|| format!("parsing {}", path.display()))?;
    Ok(entries.into_iter().filter(TypeEntry::is_complete).collect())
}

pub fn save_types(path: impl AsRef<Path>, entries: &[TypeEntry]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(entries).context("serialize types data")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Append human-categorized history descriptions not already in the store
/// (case-insensitive). Returns how many were added.
pub fn merge_history(entries: &mut Vec<TypeEntry>, history: &[ExpenseRecord]) -> usize {
    let mut seen: HashSet<String> = entries.iter().map(|e| e.desc.to_lowercase()).collect();
    let before = entries.len();

    for r in history {
        if r.bot_identified || !r.is_categorized() {
            continue;
        }
        if seen.insert(r.description.to_lowercase()) {
            entries.push(TypeEntry {
                desc: r.description.clone(),
                main_type: r.main_category.clone(),
                sub_type: r.sub_category.clone(),
            });
        }
    }

    let added = entries.len() - before;
    info!(added, total = entries.len(), "merged history into types data");
    added
}

/// Build a knowledge base from the store, then from `history` on top so the
/// most recent rows count as the most recent observations.
pub fn build_knowledge(
    entries: &[TypeEntry],
    history: &[ExpenseRecord],
    keyword_rules: Vec<KeywordRule>,
    fuzzy_threshold: u8,
) -> KnowledgeBase {
    let mut builder = KnowledgeBuilder::new()
        .keyword_rules(keyword_rules)
        .fuzzy_threshold(fuzzy_threshold);
    for e in entries {
        builder.observe(&e.desc, &e.main_type, &e.sub_type);
    }
    builder.observe_all(history);
    builder.build()
}
