//! Monthly ledger stored as one CSV per month (`<dir>/October.csv`).
//!
//! Columns:
//! Date,Description,Amount,Main Type,Sub Type,User,Bot Identified

use anyhow::{Context, Result};
use chrono::NaiveDate;
use spendlog_core::{month_sheet_name, time::parse_date, ExpenseRecord};
use std::fs::{self, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const HEADER: [&str; 7] = [
    "Date",
    "Description",
    "Amount",
    "Main Type",
    "Sub Type",
    "User",
    "Bot Identified",
];

/// CSV partition holding the given date's month
pub fn ledger_path(dir: impl AsRef<Path>, date: NaiveDate) -> PathBuf {
    dir.as_ref().join(format!("{}.csv", month_sheet_name(date)))
}

/// Parse ledger rows; `sequence_id` is the 1-based data row ordinal.
/// Rows without a readable date or description are skipped.
pub fn parse_ledger_csv(reader: impl Read) -> Result<Vec<ExpenseRecord>> {
    Ok(scan_ledger(reader)?.records)
}

struct LedgerScan {
    records: Vec<ExpenseRecord>,
    /// Every data row after the header, skipped ones included
    data_rows: u64,
}

fn scan_ledger(reader: impl Read) -> Result<LedgerScan> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(reader);

    let mut out = Vec::new();
    let mut header_found = false;
    let mut row = 0u64;

    for result in rdr.records() {
        let record = result?;
        // Skip until we find the header row
        if !header_found {
            if record.get(0).map(|s| s.trim()) == Some("Date") {
                header_found = true;
            }
            continue;
        }
        row += 1;

        let date_str = record.get(0).unwrap_or("").trim();
        let description = record.get(1).unwrap_or("").trim();
        if date_str.is_empty() || description.is_empty() {
            warn!(row, "skipping ledger row without date or description");
            continue;
        }
        let date = match parse_date(date_str) {
            Ok(d) => d,
            Err(e) => {
                warn!(row, error = %e, "skipping ledger row");
                continue;
            }
        };

        let mut rec = ExpenseRecord::new(date, description, record.get(2).unwrap_or(""))
            .with_categories(
                record.get(3).unwrap_or("").trim(),
                record.get(4).unwrap_or("").trim(),
            )
            .with_logged_by(record.get(5).unwrap_or("").trim())
            .with_sequence_id(row);
        rec.bot_identified = record
            .get(6)
            .map(|s| s.trim().eq_ignore_ascii_case("yes"))
            .unwrap_or(false);
        out.push(rec);
    }

    Ok(LedgerScan {
        records: out,
        data_rows: row,
    })
}

/// Read a month file; a missing file is an empty month.
pub fn read_ledger(path: impl AsRef<Path>) -> Result<Vec<ExpenseRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let f = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_ledger_csv(f).with_context(|| format!("parsing {}", path.display()))
}

/// Append records, creating the file and header on demand. Assigns each
/// record the `sequence_id` of its new row.
pub fn append_records(path: impl AsRef<Path>, records: &mut [ExpenseRecord]) -> Result<()> {
    let path = path.as_ref();
    if records.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }

    let existing = count_rows(path)?;
    let needs_header = !path.exists() || fs::metadata(path)?.len() == 0;
    let f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(f);
    if needs_header {
        w.write_record(HEADER)?;
    }
    for (i, rec) in records.iter_mut().enumerate() {
        let date = rec.date.format("%d/%m/%Y").to_string();
        let bot = if rec.bot_identified { "Yes" } else { "No" };
        w.write_record([
            date.as_str(),
            rec.description.as_str(),
            rec.raw_amount.as_str(),
            rec.main_category.as_str(),
            rec.sub_category.as_str(),
            rec.logged_by.as_str(),
            bot,
        ])?;
        rec.sequence_id = Some(existing + i as u64 + 1);
    }
    w.flush().with_context(|| format!("write {}", path.display()))?;

    info!(path = %path.display(), appended = records.len(), "ledger updated");
    Ok(())
}

fn count_rows(path: &Path) -> Result<u64> {
    if !path.exists() {
        return Ok(0);
    }
    let f = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(scan_ledger(f)?.data_rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_ledger_path_uses_month_name() {
        let p = ledger_path("/tmp/ledger", d(2025, 10, 15));
        assert_eq!(p, PathBuf::from("/tmp/ledger/October.csv"));
    }

    #[test]
    fn test_parse_ledger_rows() {
        let csv = "\n\
                   Date,Description,Amount,Main Type,Sub Type,User,Bot Identified\n\
                   24/07/2025,Coffee,150.50,Food,Beverages,Gopi,Yes\n\
                   not a date,Broken,10,,,,\n\
                   25/07/2025,Lunch,\"1,300\",,,Asha\n";
        let rows = parse_ledger_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].date, d(2025, 7, 24));
        assert_eq!(rows[0].sequence_id, Some(1));
        assert!(rows[0].bot_identified);
        assert_eq!(rows[0].sub_category, "Beverages");

        assert_eq!(rows[1].sequence_id, Some(3));
        assert_eq!(rows[1].numeric_amount(), 1300.0);
        assert!(!rows[1].is_categorized());
        assert!(!rows[1].bot_identified);
        assert_eq!(rows[1].logged_by, "Asha");
    }

    #[test]
    fn test_append_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = ledger_path(dir.path().join("ledger"), d(2025, 7, 24));

        let mut first = vec![
            ExpenseRecord::new(d(2025, 7, 24), "Coffee", "150").with_logged_by("Gopi"),
            ExpenseRecord::new(d(2025, 7, 24), "Groceries", "500+50").with_categories("Household", "Groceries"),
        ];
        append_records(&path, &mut first).unwrap();
        assert_eq!(first[1].sequence_id, Some(2));

        let mut second = vec![ExpenseRecord::new(d(2025, 7, 25), "Taxi, airport", "1,200")];
        append_records(&path, &mut second).unwrap();
        assert_eq!(second[0].sequence_id, Some(3));

        let rows = read_ledger(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].logged_by, "Gopi");
        assert_eq!(rows[1].numeric_amount(), 550.0);
        assert_eq!(rows[2].description, "Taxi, airport");
        assert_eq!(rows[2].numeric_amount(), 1200.0);
        assert_eq!(rows[2].date, d(2025, 7, 25));
    }

    #[test]
    fn test_append_after_skipped_trailing_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("July.csv");
        fs::write(
            &path,
            "Date,Description,Amount,Main Type,Sub Type,User,Bot Identified\n\
             24/07/2025,Tea,20,,,Gopi,No\n\
             ,Lost row,30,,,Gopi,No\n",
        )
        .unwrap();

        let mut new = vec![ExpenseRecord::new(d(2025, 7, 25), "Coffee", "150")];
        append_records(&path, &mut new).unwrap();
        assert_eq!(new[0].sequence_id, Some(3));

        let ids: Vec<(String, Option<u64>)> = read_ledger(&path)
            .unwrap()
            .into_iter()
            .map(|r| (r.description, r.sequence_id))
            .collect();
        assert_eq!(
            ids,
            vec![("Tea".to_string(), Some(1)), ("Coffee".to_string(), Some(3))]
        );
    }

    #[test]
    fn test_read_missing_month_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_ledger(dir.path().join("March.csv")).unwrap().is_empty());
    }
}
