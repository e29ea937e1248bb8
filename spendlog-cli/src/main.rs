use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use spendlog_core::{month_sheet_name, Clock, FixedClock, KnowledgeBase, SystemClock};
use spendlog_finance::{
    append_records, build_knowledge, default_keyword_rules, intake_message, ledger_path,
    load_keyword_rules, load_types, merge_history, read_ledger, save_types, summarize_day,
};
use std::io::Read;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod reminders_cmd;
mod state;

use config::{Config, PathsSection};

#[derive(Parser, Debug)]
#[command(name = "spendlog", version, about = "Log chat-style expenses and keep up with bills")]
struct Cli {
    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log one message of expenses, one "<description> <amount>" per line
    Log {
        /// Message text; read from stdin when omitted
        text: Option<String>,

        /// Date to log under (YYYY-MM-DD or DD/MM/YYYY, default: today)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        /// Name for the ledger's User column (default: general.user)
        #[arg(long)]
        user: Option<String>,

        /// Categorize and print without writing the ledger
        #[arg(long)]
        dry_run: bool,
    },

    /// Show one day's expenses and total
    Summary {
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },

    /// Merge this month's human-categorized rows into the types store
    Refresh {
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },

    /// Show bill and credit card reminders that are due
    Remind {
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        /// Include reminders whose category was already logged this month
        #[arg(long)]
        all: bool,
    },

    /// Manage ~/.spendlog/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    spendlog_core::time::parse_date(s).map_err(|e| e.to_string())
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::Config { command } = &cli.command {
        return match command {
            ConfigCommand::Init => config::init_config(),
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
                Ok(())
            }
        };
    }

    let cfg = config::load_config()?;
    let home = state::ensure_spendlog_home()?;
    let paths = cfg.paths.resolved(&home);

    match cli.command {
        Command::Log {
            text,
            date,
            user,
            dry_run,
        } => {
            let today = resolve_today(&cfg, date)?;
            let user = user.unwrap_or_else(|| cfg.general.user.clone());
            let text = match text {
                Some(t) => t,
                None => read_stdin()?,
            };
            log_message(&cfg, &paths, &text, today, &user, dry_run)?;
        }

        Command::Summary { date } => {
            let today = resolve_today(&cfg, date)?;
            let records = read_ledger(ledger_path(&paths.ledger_dir, today))?;
            let summary = summarize_day(&records, today);
            println!("Expenses for {}", today.format("%d/%m/%Y"));
            println!("{}", summary.render_table());
            if !summary.is_empty() {
                println!();
                for (main, amount) in &summary.by_category {
                    let label = if main.is_empty() { "(uncategorized)" } else { main };
                    println!("  {label}: {amount:.2}");
                }
            }
        }

        Command::Refresh { date } => {
            let today = resolve_today(&cfg, date)?;
            let history = read_ledger(ledger_path(&paths.ledger_dir, today))?;
            let mut entries = load_types(&paths.types_data)?;
            let added = merge_history(&mut entries, &history);
            save_types(&paths.types_data, &entries)?;
            info!(added, total = entries.len(), sheet = %month_sheet_name(today), "types refreshed");
            println!("Types data refreshed: {added} new, {} total", entries.len());
        }

        Command::Remind { date, all } => {
            let today = resolve_today(&cfg, date)?;
            reminders_cmd::run(&paths, today, all)?;
        }

        Command::Config { .. } => unreachable!("handled above"),
    }

    Ok(())
}

fn resolve_today(cfg: &Config, date: Option<NaiveDate>) -> Result<NaiveDate> {
    let clock: Box<dyn Clock> = match date {
        Some(d) => Box::new(FixedClock(d)),
        None => Box::new(SystemClock::new(&cfg.general.timezone)?),
    };
    Ok(clock.today())
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("read message from stdin")?;
    Ok(buf)
}

/// Knowledge from the types store plus the given month's ledger.
fn load_knowledge(cfg: &Config, paths: &PathsSection, today: NaiveDate) -> Result<KnowledgeBase> {
    let keyword_rules = match &paths.keywords {
        Some(p) => load_keyword_rules(p)?,
        None => default_keyword_rules(),
    };
    let entries = load_types(&paths.types_data)?;
    let history = read_ledger(ledger_path(&paths.ledger_dir, today))?;
    Ok(build_knowledge(
        &entries,
        &history,
        keyword_rules,
        cfg.matching.fuzzy_threshold,
    ))
}

fn log_message(
    cfg: &Config,
    paths: &PathsSection,
    text: &str,
    today: NaiveDate,
    user: &str,
    dry_run: bool,
) -> Result<()> {
    let kb = load_knowledge(cfg, paths, today)?;
    debug!(known = kb.len(), rules = kb.keyword_rules().len(), "knowledge loaded");

    let mut report = intake_message(text, today, user, &kb);
    if report.is_empty() {
        println!("Nothing to log.");
        return Ok(());
    }

    if !dry_run {
        let sheet = ledger_path(&paths.ledger_dir, today);
        append_records(&sheet, &mut report.records)?;
    }

    for (rec, source) in report.records.iter().zip(&report.sources) {
        let category = if rec.is_categorized() {
            format!("{} / {}", rec.main_category, rec.sub_category)
        } else {
            "(uncategorized)".to_string()
        };
        println!(
            "Noted: {} {} -> {category} [{}]",
            rec.description,
            rec.raw_amount,
            source.as_str()
        );
    }

    if !report.failures.is_empty() {
        println!("Some lines could not be added:");
        for f in &report.failures {
            println!("  {f}");
        }
    }
    Ok(())
}
