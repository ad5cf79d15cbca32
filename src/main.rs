use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use stock_screener::analysis::{evaluate_ticker, screen, MIN_INVESTMENT};
use stock_screener::api::{HistoryRange, PriceHistoryProvider, YahooChartClient};
use stock_screener::data::{CsvDatasetProvider, DatasetSource, ReloadPolicy};
use stock_screener::export::export_to_dir;
use stock_screener::models::{Config, Currency, FilterCriteria, WeightVector};
use stock_screener::ui::components::{create_ascii_chart, format_optional, format_price};
use stock_screener::ui::run_app;

/// Weighted-score stock screener and investment calculator
#[derive(Parser)]
#[command(name = "stock-screener")]
#[command(version)]
#[command(about = "Score, filter and rank stocks from a fundamentals CSV, and project investment returns")]
#[command(long_about = "
Loads a CSV of per-stock fundamentals with precomputed PE, ROE, ROA and dividend
sub-scores, combines them with user weights into a composite score, and filters and
ranks the result. Without a subcommand the interactive dashboard is started.

Examples:
  stock-screener                                   # dashboard
  stock-screener screen --max-pe 20 --min-roe 10   # ranked table on stdout
  stock-screener evaluate 2222.SR --amount 5000 --currency SAR
  stock-screener tickers --search rajhi
")]
struct Cli {
    /// CSV data file (overrides SCREENER_DATA_PATH)
    #[arg(long, short = 'd', global = true)]
    data: Option<PathBuf>,

    /// Reload policy: never or on-change (overrides SCREENER_RELOAD_POLICY)
    #[arg(long, global = true)]
    reload_policy: Option<ReloadPolicy>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive dashboard with screener and evaluator tabs
    Tui,

    /// Print the ranked, filtered table
    Screen {
        #[arg(long, default_value_t = 0.35, allow_negative_numbers = true)]
        pe_weight: f64,
        #[arg(long, default_value_t = 0.35, allow_negative_numbers = true)]
        roe_weight: f64,
        #[arg(long, default_value_t = 0.15, allow_negative_numbers = true)]
        roa_weight: f64,
        #[arg(long, default_value_t = 0.15, allow_negative_numbers = true)]
        dividend_weight: f64,

        /// Minimum composite score (defaults to the lowest observed score)
        #[arg(long, allow_negative_numbers = true)]
        min_score: Option<f64>,

        /// Maximum PE ratio (defaults to the highest observed)
        #[arg(long, allow_negative_numbers = true)]
        max_pe: Option<f64>,

        /// Minimum ROE (defaults to the lowest observed)
        #[arg(long, allow_negative_numbers = true)]
        min_roe: Option<f64>,

        /// Number of ranked rows to print (overrides SCREENER_TOP_N)
        #[arg(long, short = 'n')]
        top: Option<usize>,

        /// Write the filtered rows as CSV into this directory
        #[arg(long, short = 'o')]
        export: Option<PathBuf>,
    },

    /// Project the return of investing in one ticker at its target price
    Evaluate {
        ticker: String,

        #[arg(long, short = 'a', default_value_t = MIN_INVESTMENT)]
        amount: f64,

        #[arg(long, short = 'c', default_value_t = Currency::Usd)]
        currency: Currency,

        /// Also fetch and draw one year of closing prices
        #[arg(long)]
        history: bool,
    },

    /// List tickers in the dataset
    Tickers {
        /// Fuzzy filter over ticker and company name
        #[arg(long, short = 's')]
        search: Option<String>,
    },
}

fn init_logging(interactive: bool) {
    // The dashboard owns the terminal, so keep logs to errors there
    let default_directive = if interactive { "stock_screener=error" } else { "stock_screener=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {}", e);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Tui);
    init_logging(matches!(command, Command::Tui));

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(path) = cli.data {
        config.data_path = path;
    }
    if let Some(policy) = cli.reload_policy {
        config.reload_policy = policy;
    }

    let source = CsvDatasetProvider::new(config.data_path.clone(), config.reload_policy);

    let result = match command {
        Command::Tui => {
            let prices: Arc<dyn PriceHistoryProvider> = Arc::new(YahooChartClient::from_config(&config)?);
            run_app(&config, Box::new(source), prices).await
        }
        Command::Screen {
            pe_weight,
            roe_weight,
            roa_weight,
            dividend_weight,
            min_score,
            max_pe,
            min_roe,
            top,
            export,
        } => {
            let weights = WeightVector::new(pe_weight, roe_weight, roa_weight, dividend_weight);
            let criteria = FilterCriteria::new(
                min_score.unwrap_or(f64::NEG_INFINITY),
                max_pe.unwrap_or(f64::INFINITY),
                min_roe.unwrap_or(f64::NEG_INFINITY),
            );
            run_screen(&source, &weights, &criteria, top.unwrap_or(config.top_n), export)
        }
        Command::Evaluate {
            ticker,
            amount,
            currency,
            history,
        } => run_evaluate(&config, &source, &ticker, amount, currency, history).await,
        Command::Tickers { search } => run_tickers(&source, search.as_deref()),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

fn run_screen(
    source: &dyn DatasetSource,
    weights: &WeightVector,
    criteria: &FilterCriteria,
    top_n: usize,
    export: Option<PathBuf>,
) -> Result<()> {
    let dataset = source.load().context("Failed to load stock data")?;
    let outcome = screen(dataset.records(), weights, criteria, top_n)?;

    match outcome.best_pick() {
        Ok(best) => println!(
            "Top pick: {} ({}) with score {:.4}",
            best.record.company_name,
            best.ticker(),
            best.score
        ),
        Err(e) => println!("{}", e),
    }
    println!();
    for line in outcome.summary.lines() {
        println!("{}", line);
    }

    if !outcome.top.is_empty() {
        println!();
        println!(
            "{:>4}  {:<10} {:<30} {:>8} {:>10} {:>10} {:>8} {:>8}",
            "#", "Ticker", "Company", "Score", "Price", "Target", "PE", "ROE"
        );
        for (rank, row) in outcome.top.iter().enumerate() {
            let company: String = row.record.company_name.chars().take(30).collect();
            println!(
                "{:>4}  {:<10} {:<30} {:>8.4} {:>10} {:>10} {:>8} {:>8}",
                rank + 1,
                row.ticker(),
                company,
                row.score,
                format_price(row.record.price),
                format_price(row.record.y_target),
                format_optional(row.record.pe_ratio_ttm, 2),
                format_optional(row.record.roe, 2),
            );
        }
    }

    if let Some(dir) = export {
        let path = export_to_dir(&dir, dataset.columns(), &outcome.filtered, Utc::now())
            .with_context(|| format!("Failed to export to {}", dir.display()))?;
        info!("Exported {} rows to {}", outcome.filtered.len(), path.display());
        println!();
        println!("Exported {} rows to {}", outcome.filtered.len(), path.display());
    }

    Ok(())
}

async fn run_evaluate(
    config: &Config,
    source: &dyn DatasetSource,
    ticker: &str,
    amount: f64,
    currency: Currency,
    history: bool,
) -> Result<()> {
    if amount < MIN_INVESTMENT {
        bail!("Minimum investment is {:.0} {}", MIN_INVESTMENT, currency);
    }

    let dataset = source.load().context("Failed to load stock data")?;
    let evaluation = evaluate_ticker(&dataset, ticker, amount, currency)?;
    let record = &evaluation.record;

    println!("{} ({})", record.company_name, record.ticker);
    println!("  Price:        {}", format_price(record.price));
    println!("  Target:       {}", format_price(record.y_target));
    println!("  PE (TTM):     {}", format_optional(record.pe_ratio_ttm, 2));
    println!("  PE (Forward): {}", format_optional(record.pe_forward, 2));
    println!("  ROE:          {}", format_optional(record.roe, 2));
    println!("  ROA:          {}", format_optional(record.roa, 2));
    println!("  Dividend:     {}", format_optional(record.dividend_paid, 2));
    println!();
    println!("{}", evaluation.shares_line());
    println!("{}", evaluation.expected_value_line());
    println!("{}", evaluation.gain_line());

    if history {
        let client = YahooChartClient::from_config(config)?;
        let range = HistoryRange::OneYear;
        match client.price_history(&record.ticker, range).await {
            Ok(points) => {
                let data: Vec<(f64, f64)> = points
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (i as f64, p.close))
                    .collect();
                println!();
                println!("{} closing prices, last {}:", record.ticker, range);
                for line in create_ascii_chart(&data, 60, 12) {
                    println!("{}", line);
                }
            }
            // The calculation above stands on its own
            Err(e) => eprintln!("Price history unavailable: {}", e),
        }
    }

    Ok(())
}

fn run_tickers(source: &dyn DatasetSource, search: Option<&str>) -> Result<()> {
    let dataset = source.load().context("Failed to load stock data")?;
    match search {
        Some(query) => {
            for record in dataset.search(query) {
                println!("{:<12} {}", record.ticker, record.company_name);
            }
        }
        None => {
            for ticker in dataset.tickers() {
                println!("{}", ticker);
            }
        }
    }
    Ok(())
}
