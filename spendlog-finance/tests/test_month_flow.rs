use chrono::NaiveDate;
use spendlog_core::{evaluate, outstanding, MatchSource, SharedKnowledge, Urgency};
use spendlog_finance::{
    append_records, build_knowledge, default_keyword_rules, intake_message, ledger_path,
    load_cards, load_reminders, load_types, merge_history, read_ledger, save_types,
    summarize_day,
};
use std::fs;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// A month of usage: human-categorized rows teach the matcher, new messages get
/// categorized from it, and reminders skip bills that were already logged.
#[test]
fn test_learn_log_and_remind() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_dir = dir.path().join("ledger");
    let month = ledger_path(&ledger_dir, d(2025, 3, 1));

    fs::create_dir_all(&ledger_dir).unwrap();
    fs::write(
        &month,
        "Date,Description,Amount,Main Type,Sub Type,User,Bot Identified\n\
         01/03/2025,Electricity bill,\"1,840\",Utilities,Electricity,Asha,No\n\
         02/03/2025,Metro card recharge,500,Transport,Metro,Asha,No\n\
         02/03/2025,Pizza,300,Food,Outside Food/Dining/Snacks,Gopi,Yes\n",
    )
    .unwrap();

    // Refresh: merge the month into the types store
    let types_path = dir.path().join("types_data.json");
    let history = read_ledger(&month).unwrap();
    let mut entries = load_types(&types_path).unwrap();
    assert_eq!(merge_history(&mut entries, &history), 2);
    save_types(&types_path, &entries).unwrap();

    let shared = SharedKnowledge::new(build_knowledge(
        &load_types(&types_path).unwrap(),
        &[],
        default_keyword_rules(),
        75,
    ));
    let kb = shared.snapshot();
    assert_eq!(kb.len(), 2);

    // Log a new message against the snapshot
    let today = d(2025, 3, 3);
    let report = intake_message(
        "metro card recharge 200+300\nSamosa and tea 40\n???\nDry cleaning 250",
        today,
        "Gopi",
        &kb,
    );
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].line_no(), 3);
    assert_eq!(report.records[0].sub_category, "Metro");
    assert!(matches!(report.sources[0], MatchSource::Fuzzy { .. }));
    assert_eq!(report.records[1].main_category, "Food");
    assert_eq!(report.sources[2], MatchSource::Unmatched);

    let mut records = report.records;
    append_records(&month, &mut records).unwrap();
    assert_eq!(records[0].sequence_id, Some(4));

    let all = read_ledger(&month).unwrap();
    assert_eq!(all.len(), 6);
    assert!(all[5].main_category.is_empty());
    assert!(!all[5].bot_identified);

    let summary = summarize_day(&all, today);
    assert_eq!(summary.items.len(), 3);
    assert_eq!(summary.total, 790.0);

    // Reminders: electricity was already paid this month, water was not
    let reminders_path = dir.path().join("reminders.json");
    fs::write(
        &reminders_path,
        r#"[
            {"desc": "Electricity", "main_type": "Utilities", "sub_type": "Electricity", "date_range": "1-5"},
            {"desc": "Water", "main_type": "Utilities", "sub_type": "Water", "date_range": "1-10"},
            {"desc": "Wraps", "main_type": "X", "sub_type": "Y", "date_range": "28-3"}
        ]"#,
    )
    .unwrap();
    let cards_path = dir.path().join("cards.csv");
    fs::write(
        &cards_path,
        "Due Date,Name,Amount,Status\n04/03,HDFC,\"12,000\",Unpaid\n04/03,ICICI,800,Paid\n",
    )
    .unwrap();

    let mut loaded = load_reminders(&reminders_path).unwrap();
    assert_eq!(loaded.rejected.len(), 1);
    loaded.extend(load_cards(&cards_path).unwrap());
    assert_eq!(loaded.rules.len(), 4);

    let fired = evaluate(today, &loaded.rules);
    assert_eq!(fired, evaluate(today, &loaded.rules));
    let left = outstanding(fired, &all);
    let names: Vec<&str> = left.iter().map(|f| f.description.as_str()).collect();
    assert_eq!(names, vec!["Water", "HDFC"]);
    assert_eq!(left[1].urgency, Urgency::DueTomorrow);
    assert_eq!(left[1].amount, Some(12000.0));
}
