use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn spendlog_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".spendlog"))
}

pub fn ensure_spendlog_home() -> Result<PathBuf> {
    let dir = spendlog_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Relative paths from the config file live under the home directory.
pub fn resolve(home: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        home.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_and_absolute() {
        let home = Path::new("/home/gopi/.spendlog");
        assert_eq!(
            resolve(home, Path::new("ledger")),
            PathBuf::from("/home/gopi/.spendlog/ledger")
        );
        assert_eq!(resolve(home, Path::new("/data/cards.csv")), PathBuf::from("/data/cards.csv"));
    }
}
