//! Tickerset CLI: download several tickers at once and merge them into one table.
//!
//! Commands:
//! - `download`: fetch history for a ticker list from a CSV directory, print a
//!   per-symbol summary and optionally export the combined table
//! - `symbols`: show normalized symbols and their attribute names
//! - `config`: print a starter TOML configuration

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tickerset_core::data::StdoutProgress;
use tickerset_core::export::{write_csv, write_parquet};
use tickerset_core::symbols::parse_tickers;
use tickerset_core::{
    CheckedHandles, CsvDirProvider, DownloadOptions, Frame, GroupBy, Interval, MultiDownloader,
    Period, TickerInput, Tickers, TickersConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tickerset",
    about = "Tickerset CLI: download many tickers at once into one combined table"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download history for several tickers and merge it into one table.
    Download {
        /// Tickers, separated by spaces and/or commas (e.g. "aapl,msft" brk.b).
        tickers: Vec<String>,

        /// Add the tickers of a watchlist from the config file.
        #[arg(long)]
        watchlist: Option<String>,

        /// TOML config with download defaults and watchlists.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding one {SYMBOL}.csv per ticker. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Lookback period: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max.
        #[arg(long)]
        period: Option<String>,

        /// Bar interval (the CSV provider serves 1d only).
        #[arg(long)]
        interval: Option<String>,

        /// Start date (YYYY-MM-DD). Overrides --period.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD), exclusive. Defaults to tomorrow.
        #[arg(long)]
        end: Option<String>,

        /// Column grouping of the combined table: column or ticker.
        #[arg(long)]
        group_by: Option<String>,

        /// Leave out dividend and split columns.
        #[arg(long, default_value_t = false)]
        no_actions: bool,

        /// Keep raw prices plus an Adj Close column.
        #[arg(long, default_value_t = false)]
        no_adjust: bool,

        /// Include pre/post market bars (intraday only).
        #[arg(long, default_value_t = false)]
        prepost: bool,

        /// Fetch one symbol at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// No progress lines and no summary.
        #[arg(long, default_value_t = false)]
        quiet: bool,

        /// Extra downloader option as KEY=VALUE (e.g. rounding=true). Repeatable.
        #[arg(long = "opt", value_parser = parse_key_val)]
        extra: Vec<(String, String)>,

        /// Write the combined table to a .csv or .parquet file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show normalized symbols and their attribute names.
    Symbols {
        /// Tickers, separated by spaces and/or commas.
        tickers: Vec<String>,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print a starter TOML configuration.
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,tickerset_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            tickers,
            watchlist,
            config,
            data_dir,
            period,
            interval,
            start,
            end,
            group_by,
            no_actions,
            no_adjust,
            prepost,
            sequential,
            quiet,
            extra,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            let input = gather_tickers(&tickers, watchlist.as_deref(), &config)?;
            let flags = DownloadFlags {
                period,
                interval,
                start,
                end,
                group_by,
                no_actions,
                no_adjust,
                prepost,
                sequential,
                quiet,
                extra,
            };
            let options = build_options(config.download.clone(), flags)?;
            run_download(input, &data_dir, &options, quiet, output.as_deref())
        }
        Commands::Symbols { tickers, json } => run_symbols(&tickers, json),
        Commands::Config => {
            print!("{}", TickersConfig::sample().to_toml()?);
            Ok(())
        }
    }
}

/// Download flags that override config defaults.
struct DownloadFlags {
    period: Option<String>,
    interval: Option<String>,
    start: Option<String>,
    end: Option<String>,
    group_by: Option<String>,
    no_actions: bool,
    no_adjust: bool,
    prepost: bool,
    sequential: bool,
    quiet: bool,
    extra: Vec<(String, String)>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn load_config(path: Option<&Path>) -> Result<TickersConfig> {
    match path {
        Some(path) => Ok(TickersConfig::from_file(path)?),
        None => Ok(TickersConfig::default()),
    }
}

/// Watchlist symbols first, then command-line tickers.
fn gather_tickers(
    args: &[String],
    watchlist: Option<&str>,
    config: &TickersConfig,
) -> Result<TickerInput> {
    let mut symbols: Vec<String> = Vec::new();
    if let Some(name) = watchlist {
        symbols.extend(config.watchlist(name)?.symbols().iter().map(|s| s.to_string()));
    }
    symbols.extend(parse_tickers(&args.join(" ")).iter().map(|s| s.to_string()));
    Ok(TickerInput::List(symbols))
}

fn build_options(mut options: DownloadOptions, flags: DownloadFlags) -> Result<DownloadOptions> {
    if let Some(period) = flags.period {
        options.period = period.parse::<Period>()?;
    }
    if let Some(interval) = flags.interval {
        options.interval = interval.parse::<Interval>()?;
    }
    if let Some(start) = flags.start {
        options.start = Some(parse_date(&start)?);
    }
    if let Some(end) = flags.end {
        options.end = Some(parse_date(&end)?);
    }
    if let Some(group_by) = flags.group_by {
        options.group_by = group_by.parse::<GroupBy>()?;
    }
    if flags.no_actions {
        options.actions = false;
    }
    if flags.no_adjust {
        options.auto_adjust = false;
    }
    if flags.prepost {
        options.prepost = true;
    }
    if flags.sequential {
        options.threads = false;
    }
    if flags.quiet {
        options.progress = false;
    }
    for (key, value) in flags.extra {
        options.extra.insert(key, value);
    }
    Ok(options)
}

fn run_download(
    input: TickerInput,
    data_dir: &Path,
    options: &DownloadOptions,
    quiet: bool,
    output: Option<&Path>,
) -> Result<()> {
    let provider = CsvDirProvider::new(data_dir);
    let progress = StdoutProgress;
    let downloader = MultiDownloader::new(&provider).with_progress(&progress);

    let mut tickers = Tickers::with_handles(input, &CheckedHandles::new(&provider))?;
    if tickers.is_empty() {
        bail!("no tickers given (pass tickers or --watchlist)");
    }

    let table = tickers.download(&downloader, options)?;

    if !quiet {
        print_summary(&tickers, &table, options.group_by);
    }

    if let Some(path) = output {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => write_csv(&table, path)?,
            Some("parquet") => write_parquet(&table, path)?,
            _ => bail!("unsupported output format: {} (use .csv or .parquet)", path.display()),
        }
        if !quiet {
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn summary_header(tickers: &Tickers, table: &Frame, group_by: GroupBy) -> String {
    format!(
        "{} ({} rows x {} columns, grouped by {})",
        tickers,
        table.height(),
        table.width(),
        group_by
    )
}

fn print_summary(tickers: &Tickers, table: &Frame, group_by: GroupBy) {
    println!();
    println!("{}", summary_header(tickers, table, group_by));
    println!("{:<12} {:<14} {:>6} {:>12}", "SYMBOL", "ATTR", "ROWS", "LAST CLOSE");

    for (attr, ticker) in tickers.iter() {
        let history = ticker.history();
        let rows = history.map_or(0, |h| {
            h.field("Close")
                .map_or(0, |c| c.iter().filter(|v| !v.is_nan()).count())
        });
        let last_close = history
            .and_then(|h| h.field("Close"))
            .and_then(|c| c.iter().rev().find(|v| !v.is_nan()).copied())
            .map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
        println!(
            "{:<12} {:<14} {:>6} {:>12}",
            ticker.symbol(),
            attr,
            rows,
            last_close
        );
    }
}

#[derive(Serialize)]
struct SymbolRow<'a> {
    symbol: &'a str,
    attr: &'a str,
}

fn run_symbols(args: &[String], json: bool) -> Result<()> {
    let tickers = Tickers::new(args.join(" "));

    if json {
        let rows: Vec<SymbolRow<'_>> = tickers
            .iter()
            .map(|(attr, ticker)| SymbolRow {
                symbol: ticker.symbol().as_str(),
                attr,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for (attr, ticker) in tickers.iter() {
            println!("{:<12} {}", ticker.symbol(), attr);
        }
    }
    Ok(())
}
