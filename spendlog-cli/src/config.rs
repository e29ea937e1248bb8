use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spendlog_core::DEFAULT_FUZZY_THRESHOLD;
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{ensure_spendlog_home, resolve};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralSection,
    pub matching: MatchingSection,
    pub paths: PathsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSection {
    /// IANA timezone used to decide what "today" is
    pub timezone: String,
    /// Name written to the ledger's User column
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSection {
    /// 0-100; fuzzy hits below this are ignored
    pub fuzzy_threshold: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    /// Keyword rule JSON; built-in table when unset
    pub keywords: Option<PathBuf>,
    pub types_data: PathBuf,
    pub reminders: PathBuf,
    pub cards: PathBuf,
    pub ledger_dir: PathBuf,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            timezone: "Asia/Kolkata".to_string(),
            user: "me".to_string(),
        }
    }
}

impl Default for MatchingSection {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            keywords: None,
            types_data: PathBuf::from("types_data.json"),
            reminders: PathBuf::from("reminders.json"),
            cards: PathBuf::from("cards.csv"),
            ledger_dir: PathBuf::from("ledger"),
        }
    }
}

impl PathsSection {
    /// Same section with every path anchored at `home`.
    pub fn resolved(&self, home: &Path) -> PathsSection {
        PathsSection {
            keywords: self.keywords.as_deref().map(|p| resolve(home, p)),
            types_data: resolve(home, &self.types_data),
            reminders: resolve(home, &self.reminders),
            cards: resolve(home, &self.cards),
            ledger_dir: resolve(home, &self.ledger_dir),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_spendlog_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(s)?;
    if cfg.matching.fuzzy_threshold > 100 {
        anyhow::bail!(
            "matching.fuzzy_threshold must be within 0-100, got {}",
            cfg.matching.fuzzy_threshold
        );
    }
    Ok(cfg)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let cfg = Config::default();
    save_config(&cfg)?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let cfg = parse_config("[general]\nuser = \"Gopi\"\n").unwrap();
        assert_eq!(cfg.general.user, "Gopi");
        assert_eq!(cfg.general.timezone, "Asia/Kolkata");
        assert_eq!(cfg.matching.fuzzy_threshold, 75);
        assert_eq!(cfg.paths.ledger_dir, PathBuf::from("ledger"));
        assert!(cfg.paths.keywords.is_none());
    }

    #[test]
    fn test_threshold_out_of_range() {
        assert!(parse_config("[matching]\nfuzzy_threshold = 120\n").is_err());
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        let back = parse_config(&s).unwrap();
        assert_eq!(back.paths.cards, PathBuf::from("cards.csv"));
    }

    #[test]
    fn test_paths_resolve_against_home() {
        let home = Path::new("/home/gopi/.spendlog");
        let cfg = parse_config("[paths]\nkeywords = \"/etc/spendlog/keywords.json\"\n").unwrap();
        let paths = cfg.paths.resolved(home);
        assert_eq!(paths.keywords, Some(PathBuf::from("/etc/spendlog/keywords.json")));
        assert_eq!(paths.types_data, PathBuf::from("/home/gopi/.spendlog/types_data.json"));
    }
}
