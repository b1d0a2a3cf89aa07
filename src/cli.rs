//! CLI definition, dispatch and the polling loop.

use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_action_log::{read_events, CsvActionLog};
use crate::adapters::csv_price_feed::CsvPriceFeed;
use crate::adapters::csv_summary_adapter::CsvSummaryAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::action::{Action, ActionEvent, BTC_DP, EUR_DP};
use crate::domain::config::{build_trader_config, TraderConfig};
use crate::domain::error::TraderError;
use crate::domain::simulation::{Simulation, TickOutcome};
use crate::domain::summary::Summary;
use crate::ports::action_sink::ActionSink;
use crate::ports::price_feed::PriceFeed;
use crate::ports::price_log::PriceLog;
use crate::ports::summary_port::SummaryPort;

#[derive(Parser, Debug)]
#[command(name = "trendtrader", about = "Simulated BTC/EUR moving-average trader")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Trade against the live price feed
    Run {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Stop after this many polls
        #[arg(long)]
        max_ticks: Option<usize>,
        #[arg(short, long)]
        verbose: bool,
    },
    /// Replay recorded prices from a CSV file or directory
    Replay {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Overrides [simulation] log_dir
        #[arg(long)]
        log_dir: Option<PathBuf>,
        #[arg(short, long)]
        verbose: bool,
    },
    /// Write a summary of one day's action log
    Summarize {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Day to summarize (YYYY-MM-DD), today by default
        #[arg(long)]
        date: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run {
            config,
            max_ticks,
            verbose,
        } => {
            init_logging(verbose);
            run_live(config.as_deref(), max_ticks)
        }
        Command::Replay {
            input,
            config,
            log_dir,
            verbose,
        } => {
            init_logging(verbose);
            run_replay(&input, config.as_deref(), log_dir)
        }
        Command::Summarize { config, date } => {
            init_logging(false);
            run_summarize(config.as_deref(), date.as_deref())
        }
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Installs the fmt subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "trendtrader=debug"
    } else {
        "trendtrader=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests, repeated calls) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Loads and validates the configuration; no file means all defaults.
pub fn load_config(path: Option<&Path>) -> Result<TraderConfig, TraderError> {
    match path {
        Some(path) => {
            let adapter = FileConfigAdapter::from_file(path)?;
            build_trader_config(&adapter)
        }
        None => Ok(TraderConfig::default()),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoopOptions {
    /// Pause between polls; `None` polls back to back.
    pub poll_interval: Option<Duration>,
    pub max_ticks: Option<usize>,
}

/// Counters for one run of the loop, plus the executor's final state.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub ticks: usize,
    pub skipped: usize,
    pub buys: usize,
    pub sells: usize,
    pub summaries: usize,
    pub final_capital: Decimal,
    pub position: Decimal,
    pub last_price: Option<Decimal>,
}

impl RunReport {
    fn new(sim: &Simulation) -> Self {
        RunReport {
            ticks: 0,
            skipped: 0,
            buys: 0,
            sells: 0,
            summaries: 0,
            final_capital: sim.executor().capital(),
            position: sim.executor().position(),
            last_price: None,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ticks:         {}", self.ticks)?;
        writeln!(f, "Skipped:       {}", self.skipped)?;
        writeln!(f, "Buys:          {}", self.buys)?;
        writeln!(f, "Sells:         {}", self.sells)?;
        writeln!(f, "Summaries:     {}", self.summaries)?;
        writeln!(
            f,
            "Final capital: {} EUR",
            self.final_capital.round_dp(EUR_DP)
        )?;
        write!(f, "Position:      {} BTC", self.position.round_dp(BTC_DP))?;
        if let Some(price) = self.last_price {
            write!(f, " (last price {} EUR)", price.round_dp(EUR_DP))?;
        }
        Ok(())
    }
}

/// Polls `feed` until it is exhausted, `max_ticks` polls were made, or a
/// fatal error occurs.
///
/// Every poll is recorded in `price_log` when one is given. When the hourly
/// schedule fires, the summary covers every event `sink` holds for the
/// current day, including those logged before a restart.
pub fn run_loop(
    feed: &mut dyn PriceFeed,
    sim: &mut Simulation,
    sink: &mut dyn ActionSink,
    mut price_log: Option<&mut dyn PriceLog>,
    summary: Option<&dyn SummaryPort>,
    options: LoopOptions,
) -> Result<RunReport, TraderError> {
    let mut report = RunReport::new(sim);

    loop {
        if options.max_ticks.is_some_and(|max| report.ticks >= max) {
            info!(ticks = report.ticks, "tick limit reached");
            break;
        }
        let Some(sample) = feed.next_sample() else {
            info!(ticks = report.ticks, "price feed exhausted");
            break;
        };
        report.ticks += 1;

        if let Some(log) = price_log.as_deref_mut() {
            match &sample {
                Ok(s) => log.record(s.timestamp(), Some(s.close()))?,
                Err(_) => log.record(Local::now().naive_local(), None)?,
            }
        }

        match sim.tick(sample, sink)? {
            TickOutcome::Skipped { .. } => report.skipped += 1,
            TickOutcome::Acted {
                event, summary_due, ..
            } => {
                match event.action {
                    Action::Buy => report.buys += 1,
                    Action::Sell => report.sells += 1,
                    Action::None => {}
                }
                report.last_price = Some(event.price);

                if summary_due {
                    if let Some(port) = summary {
                        let day_events = sink.day_events(event.timestamp.date())?;
                        write_summary(port, event.timestamp, &day_events)?;
                        report.summaries += 1;
                    }
                }
            }
        }

        if let Some(interval) = options.poll_interval {
            if !options.max_ticks.is_some_and(|max| report.ticks >= max) {
                debug!(secs = interval.as_secs(), "sleeping until next poll");
                thread::sleep(interval);
            }
        }
    }

    report.final_capital = sim.executor().capital();
    report.position = sim.executor().position();
    Ok(report)
}

fn write_summary(
    port: &dyn SummaryPort,
    generated_at: NaiveDateTime,
    events: &[ActionEvent],
) -> Result<(), TraderError> {
    let summary = Summary::from_events(generated_at, events);
    let location = port.write(&summary)?;
    debug!(location = %location, "hourly summary");
    Ok(())
}

#[cfg(feature = "live")]
fn run_live(config_path: Option<&Path>, max_ticks: Option<usize>) -> Result<(), TraderError> {
    use crate::adapters::coingecko_adapter::CoinGeckoFeed;
    use crate::adapters::csv_price_log::CsvPriceLog;

    let config = load_config(config_path)?;
    let mut sim = Simulation::from_config(&config)?;
    let mut feed = CoinGeckoFeed::new(config.feed.clone())?;
    let mut sink = CsvActionLog::new(config.simulation.log_dir.clone());
    let mut price_log = CsvPriceLog::new(config.simulation.data_dir.clone());
    let summary = CsvSummaryAdapter::new(config.simulation.summary_dir.clone());

    info!(
        coin = %config.feed.coin_id,
        currency = %config.feed.vs_currency,
        interval_secs = config.simulation.poll_interval_secs,
        capital = %config.executor.initial_capital,
        "starting live simulation"
    );
    let price_log: Option<&mut dyn PriceLog> = if config.simulation.record_prices {
        Some(&mut price_log as &mut dyn PriceLog)
    } else {
        None
    };
    let report = run_loop(
        &mut feed,
        &mut sim,
        &mut sink,
        price_log,
        Some(&summary),
        LoopOptions {
            poll_interval: Some(Duration::from_secs(config.simulation.poll_interval_secs)),
            max_ticks,
        },
    )
    .inspect_err(|e| error!(error = %e, "trading loop aborted"))?;

    println!("{report}");
    Ok(())
}

#[cfg(not(feature = "live"))]
fn run_live(_config_path: Option<&Path>, _max_ticks: Option<usize>) -> Result<(), TraderError> {
    Err(TraderError::Feed {
        reason: "built without the `live` feature".into(),
    })
}

fn run_replay(
    input: &Path,
    config_path: Option<&Path>,
    log_dir: Option<PathBuf>,
) -> Result<(), TraderError> {
    let config = load_config(config_path)?;
    let mut sim = Simulation::from_config(&config)?;
    let mut feed = CsvPriceFeed::open(input)?;
    let log_dir = log_dir.unwrap_or_else(|| config.simulation.log_dir.clone());
    let mut sink = CsvActionLog::new(log_dir);
    let summary = CsvSummaryAdapter::new(config.simulation.summary_dir.clone());

    info!(input = %input.display(), "replaying recorded prices");
    let report = run_loop(
        &mut feed,
        &mut sim,
        &mut sink,
        None,
        Some(&summary),
        LoopOptions::default(),
    )
    .inspect_err(|e| error!(error = %e, "replay aborted"))?;

    if report.ticks == report.skipped {
        warn!("no usable price samples in input");
    }
    println!("Replay of {}", input.display());
    println!("{report}");
    Ok(())
}

fn run_summarize(config_path: Option<&Path>, date: Option<&str>) -> Result<(), TraderError> {
    let config = load_config(config_path)?;
    let now = Local::now().naive_local();
    let day = match date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            TraderError::InputData {
                reason: format!("invalid date '{raw}' (expected YYYY-MM-DD)"),
            }
        })?,
        None => now.date(),
    };

    let log = CsvActionLog::new(config.simulation.log_dir.clone());
    let events = read_events(&log.file_for(day))?;
    let summary = Summary::from_events(now, &events);
    let location = CsvSummaryAdapter::new(config.simulation.summary_dir.clone()).write(&summary)?;

    println!("Summary for {day}");
    println!("Trades:        {}", summary.trades_total);
    println!("Buys / sells:  {} / {}", summary.buys, summary.sells);
    println!("Total fees:    {} EUR", summary.total_fee.round_dp(EUR_DP));
    println!("Net profit:    {} EUR", summary.total_profit.round_dp(EUR_DP));
    println!(
        "Final capital: {} EUR",
        summary.final_capital.round_dp(EUR_DP)
    );
    println!("Written to {location}");
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TraderError> {
    let config = load_config(Some(config_path))?;
    Simulation::from_config(&config)?;

    println!("Configuration: {}", config_path.display());
    println!("  trend_confirmations: {}", config.trend_confirmations);
    println!("  initial_capital:     {}", config.executor.initial_capital);
    println!("  fee_rate:            {}", config.executor.fee_rate);
    println!("  min_expected_profit: {}", config.executor.min_expected_profit);
    println!(
        "  poll_interval_secs:  {}",
        config.simulation.poll_interval_secs
    );
    println!(
        "  feed:                {} {}/{}",
        config.feed.url, config.feed.coin_id, config.feed.vs_currency
    );
    println!("Configuration is valid.");
    Ok(())
}
