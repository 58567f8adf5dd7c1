//! CLI definition and dispatch.

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::{open_store, SharedStore};
use crate::domain::analytics::{Analytics, SummaryStats};
use crate::domain::error::JournalError;
use crate::domain::filter::TradeFilter;
use crate::domain::trade::{format_timestamp, sample_trades, Direction, Trade, TradeId};
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_store::TradeStore;

#[derive(Parser, Debug)]
#[command(name = "tradejournal", about = "Trading journal with performance analytics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print trades, oldest first
    List {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print summary statistics and max drawdown
    Stats {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Write all trades as CSV
    Export {
        #[arg(short, long)]
        config: PathBuf,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import trades from a CSV file
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Insert the sample trades
    Seed {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Delete one trade
    Delete {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        id: i64,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Substring of the pair, case-insensitive
    #[arg(long)]
    pub pair: Option<String>,
    #[arg(long)]
    pub direction: Option<Direction>,
    /// First close date to include (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last close date to include (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,
    /// Substring of the notes or pair
    #[arg(long)]
    pub search: Option<String>,
}

impl From<FilterArgs> for TradeFilter {
    fn from(args: FilterArgs) -> Self {
        TradeFilter {
            pair: args.pair,
            direction: args.direction,
            from: args.from,
            to: args.to,
            search: args.search,
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn execute(cli: Cli) -> Result<(), JournalError> {
    match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::List { config, filter } => run_list(&config, filter.into()),
        Command::Stats { config, filter } => run_stats(&config, filter.into()),
        Command::Export { config, output } => run_export(&config, output.as_deref()),
        Command::Import { config, file } => run_import(&config, &file),
        Command::Seed { config } => run_seed(&config),
        Command::Delete { config, id } => run_delete(&config, TradeId(id)),
    }
}

/// Loads the INI file and installs the log subscriber at `[log] level`.
pub fn load_config(path: &Path) -> Result<FileConfigAdapter, JournalError> {
    let config = FileConfigAdapter::from_file(path)?;
    init_tracing(&config.get_string_or("log", "level", "info"));
    Ok(config)
}

/// `RUST_LOG` wins over the configured level. Logs go to stderr.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A second call (tests, repeated runs in one process) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn open(config_path: &Path) -> Result<(FileConfigAdapter, SharedStore), JournalError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    Ok((config, store))
}

fn load_trades(store: &SharedStore, filter: &TradeFilter) -> Result<Vec<Trade>, JournalError> {
    let trades = store.list()?;
    Ok(if filter.is_empty() {
        trades
    } else {
        filter.apply(&trades)
    })
}

fn run_list(config_path: &Path, filter: TradeFilter) -> Result<(), JournalError> {
    let (_, store) = open(config_path)?;
    let trades = load_trades(&store, &filter)?;

    let mut out = io::stdout().lock();
    for trade in &trades {
        writeln!(out, "{}", format_trade_line(trade))?;
    }
    eprintln!("{} trade(s)", trades.len());
    Ok(())
}

pub fn format_trade_line(trade: &Trade) -> String {
    format!(
        "{:>5}  {}  {:<10} {:<4} {:>12.2}  {}",
        trade.id.0,
        format_timestamp(&trade.close_time),
        trade.pair,
        trade.direction.as_str(),
        trade.result_amount,
        trade.notes.as_deref().unwrap_or("")
    )
    .trim_end()
    .to_string()
}

fn run_stats(config_path: &Path, filter: TradeFilter) -> Result<(), JournalError> {
    let (_, store) = open(config_path)?;
    let trades = load_trades(&store, &filter)?;
    let analytics = Analytics::compute(&trades);

    let mut out = io::stdout().lock();
    write_stats(&mut out, &analytics.summary_stats.rounded(2), analytics.max_drawdown)?;
    Ok(())
}

pub fn write_stats<W: Write>(out: &mut W, stats: &SummaryStats, max_drawdown: f64) -> io::Result<()> {
    writeln!(out, "Total trades:    {}", stats.total_trades)?;
    writeln!(
        out,
        "Wins/Losses/BE:  {}/{}/{}",
        stats.winning_trades, stats.losing_trades, stats.breakeven_trades
    )?;
    writeln!(out, "Win rate:        {:.2}%", stats.win_rate)?;
    writeln!(out, "Total profit:    {:.2}", stats.total_profit)?;
    writeln!(out, "Profit factor:   {:.2}", stats.profit_factor)?;
    writeln!(out, "Largest win:     {:.2}", stats.largest_win)?;
    writeln!(out, "Largest loss:    {:.2}", stats.largest_loss)?;
    writeln!(out, "Average win:     {:.2}", stats.average_win)?;
    writeln!(out, "Average loss:    {:.2}", stats.average_loss)?;
    writeln!(out, "Max drawdown:    {:.2}%", max_drawdown)?;
    Ok(())
}

fn run_export(config_path: &Path, output: Option<&Path>) -> Result<(), JournalError> {
    let (_, store) = open(config_path)?;
    let trades = store.list()?;

    match output {
        Some(path) => {
            let file = BufWriter::new(File::create(path)?);
            csv_adapter::write_trades(&trades, file)?;
            eprintln!("Exported {} trade(s) to {}", trades.len(), path.display());
        }
        None => {
            csv_adapter::write_trades(&trades, io::stdout().lock())?;
            eprintln!(
                "Exported {} trade(s); suggested filename {}",
                trades.len(),
                csv_adapter::export_filename(Utc::now().naive_utc())
            );
        }
    }
    Ok(())
}

fn run_import(config_path: &Path, csv_path: &Path) -> Result<(), JournalError> {
    let (_, store) = open(config_path)?;

    eprintln!("Reading trades from {}", csv_path.display());
    let inputs = csv_adapter::read_trades(File::open(csv_path)?)?;
    let created = store.create_many(&inputs)?;

    tracing::info!(count = created.len(), file = %csv_path.display(), "imported trades");
    eprintln!("Imported {} trade(s)", created.len());
    Ok(())
}

fn run_seed(config_path: &Path) -> Result<(), JournalError> {
    let (_, store) = open(config_path)?;
    let created = store.create_many(&sample_trades())?;
    eprintln!("Inserted {} sample trade(s)", created.len());
    Ok(())
}

fn run_delete(config_path: &Path, id: TradeId) -> Result<(), JournalError> {
    let (_, store) = open(config_path)?;
    let deleted = store.delete(id)?;
    eprintln!("Deleted trade {deleted}");
    Ok(())
}

#[cfg(feature = "web")]
fn run_serve(config_path: &Path) -> Result<(), JournalError> {
    use crate::adapters::web::{self, AppState, DEFAULT_LISTEN};
    use std::net::SocketAddr;

    let (config, store) = open(config_path)?;

    let listen = config.get_string_or("web", "listen", DEFAULT_LISTEN);
    let addr: SocketAddr = listen.parse().map_err(|e: std::net::AddrParseError| {
        JournalError::ConfigInvalid {
            section: "web".into(),
            key: "listen".into(),
            reason: e.to_string(),
        }
    })?;

    eprintln!("Starting web server on {addr}");
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(web::serve(addr, AppState { store }))
}

#[cfg(not(feature = "web"))]
fn run_serve(_config_path: &Path) -> Result<(), JournalError> {
    Err(JournalError::ConfigInvalid {
        section: "web".into(),
        key: "listen".into(),
        reason: "built without the web feature".into(),
    })
}
