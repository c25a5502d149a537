//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::fs_screenshot_adapter::FsScreenshotAdapter;
use crate::domain::calculator::PnlMode;
use crate::domain::config_validation::{
    BACKEND_CSV, BACKEND_SQLITE, is_valid_user_id, validate_journal_config,
};
use crate::domain::error::JournalError;
use crate::domain::journal::{Journal, TradeForm};
use crate::domain::ledger::TradeFilter;
use crate::domain::symbols;
use crate::domain::trade::{
    Direction, FieldUpdate, Outcome, ScreenshotSlot, TradeId, TradeRecord,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_store::LedgerStore;
use crate::ports::reward_port::RewardPort;

#[derive(Parser, Debug)]
#[command(name = "tradejournal", about = "Forex trade journal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options every command needs to open a journal.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    /// Overrides `[journal] user`
    #[arg(short, long)]
    pub user: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record a new trade
    Log {
        #[command(flatten)]
        session: SessionArgs,
        /// Trade date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        direction: String,
        #[arg(long)]
        outcome: String,
        #[arg(long)]
        lots: f64,
        #[arg(long)]
        entry: Option<f64>,
        #[arg(long)]
        stop: Option<f64>,
        #[arg(long)]
        exit: Option<f64>,
        /// Derive PnL and R from the prices
        #[arg(long, conflicts_with_all = ["pnl", "rr"])]
        calculate: bool,
        #[arg(long, allow_hyphen_values = true)]
        pnl: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        rr: Option<f64>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(long, default_value = "")]
        rationale: String,
        #[arg(long, default_value = "")]
        strategy: String,
    },
    /// List trades, newest first
    List {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        outcome: Vec<String>,
        #[arg(long)]
        symbol: Vec<String>,
        #[arg(long)]
        direction: Vec<String>,
        #[arg(long)]
        tag: Vec<String>,
    },
    /// Correct PnL, R-multiple or size of a trade
    Edit {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        id: String,
        #[arg(long, allow_hyphen_values = true)]
        pnl: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        rr: Option<f64>,
        #[arg(long)]
        lots: Option<f64>,
    },
    /// Save post-trade journal notes
    Notes {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        id: String,
        #[arg(long)]
        text: String,
    },
    /// Attach an entry or exit screenshot
    Attach {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        id: String,
        #[arg(long)]
        slot: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete a trade and its screenshots
    Delete {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        id: String,
    },
    /// Show performance statistics
    Stats {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Show tag suggestions
    Tags {
        #[command(flatten)]
        session: SessionArgs,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Log {
            session,
            date,
            symbol,
            direction,
            outcome,
            lots,
            entry,
            stop,
            exit,
            calculate,
            pnl,
            rr,
            tags,
            rationale,
            strategy,
        } => with_journal(&session, |journal| {
            let form = TradeForm {
                date: parse_date(date.as_deref())?,
                symbol,
                direction: direction.parse()?,
                outcome: outcome.parse()?,
                size_lots: lots,
                entry_price: entry,
                stop_loss: stop,
                final_exit: exit,
                mode: pnl_mode(calculate, pnl, rr),
                tags: split_tags(tags.as_deref()),
                entry_rationale: rationale,
                strategy,
            };
            if !symbols::is_curated(form.symbol.trim()) {
                eprintln!("note: {} is not one of the curated pairs", form.symbol.trim());
            }
            let id = journal.log_trade(form)?;
            println!("{id}");
            Ok(())
        }),
        Command::List {
            session,
            outcome,
            symbol,
            direction,
            tag,
        } => with_journal(&session, |journal| {
            let filter = build_filter(&outcome, &symbol, &direction, &tag)?;
            let trades = journal.playbook(&filter);
            for trade in &trades {
                println!("{}", format_trade(trade));
            }
            eprintln!("{} trade(s)", trades.len());
            Ok(())
        }),
        Command::Edit {
            session,
            id,
            pnl,
            rr,
            lots,
        } => with_journal(&session, |journal| {
            let id = TradeId::parse(&id)?;
            let updates: Vec<FieldUpdate> = [
                pnl.map(FieldUpdate::Pnl),
                rr.map(FieldUpdate::RMultiple),
                lots.map(FieldUpdate::SizeLots),
            ]
            .into_iter()
            .flatten()
            .collect();
            if updates.is_empty() {
                return Err(JournalError::invalid_input(
                    "nothing to edit, pass --pnl, --rr or --lots",
                ));
            }
            journal.update_fields(&id, updates)?;
            eprintln!("Updated {id}");
            Ok(())
        }),
        Command::Notes { session, id, text } => with_journal(&session, |journal| {
            let id = TradeId::parse(&id)?;
            let saved = journal.save_notes(&id, &text)?;
            if saved.xp_awarded > 0 {
                eprintln!("Notes saved (+{} XP)", saved.xp_awarded);
            } else {
                eprintln!("Notes saved");
            }
            Ok(())
        }),
        Command::Attach {
            session,
            id,
            slot,
            file,
        } => with_journal(&session, |journal| {
            let id = TradeId::parse(&id)?;
            let slot: ScreenshotSlot = slot.parse()?;
            let bytes = fs::read(&file)?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("image");
            let reference = journal.attach_screenshot(&id, slot, file_name, &bytes)?;
            println!("{reference}");
            Ok(())
        }),
        Command::Delete { session, id } => with_journal(&session, |journal| {
            let id = TradeId::parse(&id)?;
            let removed = journal.delete_trade(&id)?;
            eprintln!("Deleted {} ({} {})", removed.id, removed.date, removed.symbol);
            Ok(())
        }),
        Command::Stats { session } => with_journal(&session, |journal| {
            print_stats(journal);
            Ok(())
        }),
        Command::Tags { session } => with_journal(&session, |journal| {
            for tag in symbols::tag_suggestions(journal.ledger()) {
                println!("{tag}");
            }
            Ok(())
        }),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite { path: PathBuf, pool_size: u32 },
    Csv { dir: PathBuf },
}

/// Settings resolved from the INI file and command-line overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalConfig {
    pub user: String,
    pub backend: StorageBackend,
    pub screenshot_dir: PathBuf,
}

pub fn build_journal_config(
    config: &dyn ConfigPort,
    user_override: Option<&str>,
) -> Result<JournalConfig, JournalError> {
    let user = match user_override {
        Some(user) if is_valid_user_id(user) => user.trim().to_string(),
        Some(user) => {
            return Err(JournalError::invalid_input(format!(
                "invalid user name: {user}"
            )));
        }
        None => config
            .get_string("journal", "user")
            .map(|u| u.trim().to_string())
            .ok_or_else(|| JournalError::ConfigMissing {
                section: "journal".into(),
                key: "user".into(),
            })?,
    };

    let backend_name = config
        .get_string("storage", "backend")
        .unwrap_or_else(|| BACKEND_SQLITE.to_string())
        .to_lowercase();

    let backend = match backend_name.as_str() {
        BACKEND_CSV => StorageBackend::Csv {
            dir: required_path(config, "csv", "dir")?,
        },
        BACKEND_SQLITE => StorageBackend::Sqlite {
            path: required_path(config, "sqlite", "path")?,
            pool_size: config.get_int("sqlite", "pool_size", 4).max(1) as u32,
        },
        other => {
            return Err(JournalError::ConfigInvalid {
                section: "storage".into(),
                key: "backend".into(),
                reason: format!("unknown backend '{other}'"),
            });
        }
    };

    let screenshot_dir = config
        .get_path("screenshots", "dir")
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(JournalConfig {
        user,
        backend,
        screenshot_dir,
    })
}

fn required_path(config: &dyn ConfigPort, section: &str, key: &str) -> Result<PathBuf, JournalError> {
    config
        .get_path(section, key)
        .ok_or_else(|| JournalError::ConfigMissing {
            section: section.into(),
            key: key.into(),
        })
}

/// Opened storage for one backend. The same adapter serves both the ledger
/// and the reward log.
pub enum Stores {
    #[cfg(feature = "sqlite")]
    Sqlite(crate::adapters::sqlite_adapter::SqliteAdapter),
    Csv(CsvAdapter),
}

impl Stores {
    pub fn open(backend: &StorageBackend) -> Result<Self, JournalError> {
        match backend {
            #[cfg(feature = "sqlite")]
            StorageBackend::Sqlite { path, pool_size } => {
                use crate::adapters::sqlite_adapter::SqliteAdapter;
                let adapter = SqliteAdapter::open(path, *pool_size)?;
                adapter.initialize_schema()?;
                Ok(Stores::Sqlite(adapter))
            }
            #[cfg(not(feature = "sqlite"))]
            StorageBackend::Sqlite { .. } => Err(JournalError::ConfigInvalid {
                section: "storage".into(),
                key: "backend".into(),
                reason: "built without sqlite support".into(),
            }),
            StorageBackend::Csv { dir } => Ok(Stores::Csv(CsvAdapter::new(dir.clone()))),
        }
    }

    pub fn ledger(&self) -> &dyn LedgerStore {
        match self {
            #[cfg(feature = "sqlite")]
            Stores::Sqlite(adapter) => adapter,
            Stores::Csv(adapter) => adapter,
        }
    }

    pub fn rewards(&self) -> &dyn RewardPort {
        match self {
            #[cfg(feature = "sqlite")]
            Stores::Sqlite(adapter) => adapter,
            Stores::Csv(adapter) => adapter,
        }
    }
}

fn with_journal<F>(session: &SessionArgs, action: F) -> ExitCode
where
    F: FnOnce(&mut Journal<'_>) -> Result<(), JournalError>,
{
    let config = match load_config(&session.config) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = validate_journal_config(&config)
        .and_then(|()| build_journal_config(&config, session.user.as_deref()))
        .and_then(|settings| {
            let stores = Stores::open(&settings.backend)?;
            let screenshots = FsScreenshotAdapter::new(settings.screenshot_dir.clone());
            let mut journal = Journal::open(
                settings.user.as_str(),
                stores.ledger(),
                stores.rewards(),
                &screenshots,
            )?;
            action(&mut journal)
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn parse_date(value: Option<&str>) -> Result<NaiveDate, JournalError> {
    match value {
        None => Ok(chrono::Local::now().date_naive()),
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(
            |e: chrono::ParseError| {
                JournalError::invalid_input(format!("invalid date '{raw}': {e}"))
            },
        ),
    }
}

/// Manual mode takes PnL and R as given, defaulting to zero.
pub fn pnl_mode(calculate: bool, pnl: Option<f64>, rr: Option<f64>) -> PnlMode {
    if calculate {
        PnlMode::Computed
    } else {
        PnlMode::Manual {
            pnl: pnl.unwrap_or(0.0),
            r_multiple: rr.unwrap_or(0.0),
        }
    }
}

pub fn split_tags(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Empty option lists place no constraint on that field.
pub fn build_filter(
    outcomes: &[String],
    symbols: &[String],
    directions: &[String],
    tags: &[String],
) -> Result<TradeFilter, JournalError> {
    let mut filter = TradeFilter::all();
    if !outcomes.is_empty() {
        let parsed = outcomes
            .iter()
            .map(|o| o.parse::<Outcome>())
            .collect::<Result<Vec<_>, _>>()?;
        filter = filter.with_outcomes(parsed);
    }
    if !symbols.is_empty() {
        filter = filter.with_symbols(symbols.iter().map(|s| s.trim().to_string()));
    }
    if !directions.is_empty() {
        let parsed = directions
            .iter()
            .map(|d| d.parse::<Direction>())
            .collect::<Result<Vec<_>, _>>()?;
        filter = filter.with_directions(parsed);
    }
    if !tags.is_empty() {
        filter = filter.with_tags(tags);
    }
    Ok(filter)
}

pub fn format_trade(trade: &TradeRecord) -> String {
    format!(
        "{}  {}  {:<8} {:<5} {:<14} {:>6.2} lots  PnL {:>10.2}  R {:>6.2}  [{}]",
        trade.id,
        trade.date,
        trade.symbol,
        trade.direction,
        trade.outcome,
        trade.size_lots,
        trade.pnl,
        trade.r_multiple,
        trade.tags
    )
}

fn print_stats(journal: &Journal<'_>) {
    let summary = journal.summary();
    println!("Trades:         {}", summary.trade_count);
    println!("Wins / Losses:  {} / {}", summary.wins, summary.losses);
    println!("Win rate:       {:.1}%", summary.win_rate);
    println!("Total PnL:      {:.2}", summary.total_pnl);
    println!("Average win:    {:.2}", summary.avg_win);
    println!("Average loss:   {:.2}", summary.avg_loss);
    println!("Profit factor:  {:.2}", summary.profit_factor);
    println!("Largest win:    {:.2}", summary.largest_win);
    println!("Largest loss:   {:.2}", summary.largest_loss);
    println!("Total R:        {:.2}", summary.total_r);
    println!("Average R:      {:.2}", summary.avg_r_multiple);

    let curve = journal.equity_curve();
    if !curve.is_empty() {
        println!();
        println!("Equity curve:");
        for point in &curve {
            println!(
                "  {}  {}  {:>10.2}  {:>12.2}",
                point.date, point.trade_id, point.pnl, point.cumulative_pnl
            );
        }
    }

    let by_symbol = journal.pnl_by_symbol();
    if !by_symbol.is_empty() {
        println!();
        println!("PnL by symbol:");
        for row in &by_symbol {
            println!(
                "  {:<10} {:>4} trade(s)  {:>12.2}",
                row.symbol, row.trades, row.total_pnl
            );
        }
    }
}
