use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use poly_toolkit::{
    clients::{OddsClient, PolymarketClient},
    config::Settings,
    dump::{dump_account, DumpAccountInput, DumpProgress},
    edge::{calculate_edges, poly_prices, vegas_odds},
    filters::PreFilter,
    render,
    scanner::{ArbScanner, ScanArbInput, ScanProgress},
    DumpError, ScanError,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "poly")]
#[command(about = "Polymarket arbitrage scanner and account toolkit", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./poly.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan multi-outcome events for sum-of-asks arbitrage
    Arb {
        /// Flag events whose best asks sum below this
        #[arg(long)]
        threshold: Option<f64>,
        /// Minimum active outcomes per event
        #[arg(long)]
        min_outcomes: Option<usize>,
        /// Minimum event volume in USD
        #[arg(long)]
        min_volume: Option<f64>,
        /// Minimum USD available at every outcome's best ask
        #[arg(long)]
        min_depth: Option<f64>,
        /// Print opportunities as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dump an account's activity, positions and summary to disk
    Dump {
        /// Wallet address (0x...)
        address: String,
        /// Days of history
        #[arg(short, long)]
        days: Option<u32>,
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Dump accounts now and then periodically
    Watch {
        /// Wallet addresses (0x...)
        #[arg(required = true)]
        addresses: Vec<String>,
        /// Hours between dumps
        #[arg(long)]
        interval_hours: Option<u64>,
    },
    /// Compare sportsbook odds with Polymarket prices
    Edge {
        /// Odds API sport key for the futures market
        #[arg(long, default_value = "basketball_nba_championship_winner")]
        sport: String,
        /// Polymarket event slug carrying the same futures market
        #[arg(long, default_value = "2026-nba-champion")]
        event_slug: String,
        /// Also list head-to-head game odds for this sport key (e.g. basketball_nba)
        #[arg(long)]
        games_sport: Option<String>,
        /// Odds API key
        #[arg(long, env = "ODDS_API_KEY", hide_env_values = true)]
        odds_api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        clear_progress();
        report(&err);
        std::process::exit(1);
    }
}

/// Stage-tagged failures print the underlying cause plus the stage; anything else prints
/// its full context chain.
fn report(err: &anyhow::Error) {
    if let Some(scan) = err.downcast_ref::<ScanError>() {
        eprintln!("Error: {}", scan.source);
        eprintln!("Stage: {}", scan.stage());
    } else if let Some(dump) = err.downcast_ref::<DumpError>() {
        match dump {
            DumpError::Api { source, .. } => eprintln!("Error: {source}"),
            DumpError::Write(source) => eprintln!("Error: {source}"),
        }
        eprintln!("Stage: {}", dump.stage());
    } else {
        eprintln!("Error: {err:#}");
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    let client = PolymarketClient::from_settings(&settings.api);

    match cli.command {
        Commands::Arb {
            threshold,
            min_outcomes,
            min_volume,
            min_depth,
            json,
        } => {
            let input = ScanArbInput {
                threshold: threshold.unwrap_or(settings.scan.threshold),
                min_outcomes: min_outcomes.unwrap_or(settings.scan.min_outcomes),
                min_volume: min_volume.unwrap_or(settings.scan.min_volume),
                min_depth: min_depth.unwrap_or(settings.scan.min_depth),
            };
            run_arb(client, &settings, &input, json).await
        }
        Commands::Dump { address, days, output } => {
            let input = DumpAccountInput {
                target: address,
                days: days.unwrap_or(settings.dump.days),
                output_dir: output.unwrap_or_else(|| settings.dump.output_dir.clone()),
            };
            let result = dump_account(&client, &input, show_dump_progress).await;
            clear_progress();
            print!("{}", render::render_dump_result(&result?));
            Ok(())
        }
        Commands::Watch {
            addresses,
            interval_hours,
        } => {
            let hours = interval_hours.unwrap_or(settings.dump.watch_interval_hours).max(1);
            run_watch(client, &settings, &addresses, Duration::from_secs(hours * 60 * 60)).await
        }
        Commands::Edge {
            sport,
            event_slug,
            games_sport,
            odds_api_key,
        } => {
            let api_key = odds_api_key
                .or_else(|| settings.edge.odds_api_key.clone())
                .filter(|key| !key.is_empty())
                .ok_or_else(|| anyhow!("No odds API key. Set ODDS_API_KEY or edge.odds_api_key"))?;
            let odds_client = OddsClient::new(&settings.edge.odds_url, api_key);
            run_edge(&client, &odds_client, &settings, &sport, &event_slug, games_sport.as_deref()).await
        }
    }
}

fn show_progress(line: &str) {
    let mut stderr = std::io::stderr();
    let _ = write!(stderr, "\r\x1b[2K{line}");
    let _ = stderr.flush();
}

fn clear_progress() {
    show_progress("");
}

fn show_dump_progress(progress: DumpProgress) {
    show_progress(&render::progress_line(
        progress.stage.label(),
        progress.current,
        progress.total,
    ));
}

async fn run_arb(client: PolymarketClient, settings: &Settings, input: &ScanArbInput, json: bool) -> Result<()> {
    let scanner = ArbScanner::new(client).with_prefilter(PreFilter::new(
        settings.scan.prefilter_margin,
        settings.scan.missing_indicative_price,
    ));

    info!(
        threshold = input.threshold,
        min_outcomes = input.min_outcomes,
        min_volume = input.min_volume,
        min_depth = input.min_depth,
        "Starting arbitrage scan"
    );

    let start = Instant::now();
    let result = scanner
        .scan(input, |progress: ScanProgress| {
            show_progress(&render::progress_line(&progress.message, progress.current, progress.total));
        })
        .await;
    clear_progress();
    let opportunities = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&opportunities)?);
    } else {
        print!(
            "{}",
            render::render_opportunities(&opportunities, input.threshold, start.elapsed().as_secs_f64())
        );
    }
    Ok(())
}

async fn run_watch(
    client: PolymarketClient,
    settings: &Settings,
    addresses: &[String],
    every: Duration,
) -> Result<()> {
    info!(accounts = addresses.len(), interval_secs = every.as_secs(), "Starting account watch");

    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;

        for address in addresses {
            info!(%address, "Dumping account");
            let input = DumpAccountInput {
                target: address.clone(),
                days: settings.dump.days,
                output_dir: settings.dump.output_dir.clone(),
            };
            let progress = |p: DumpProgress| info!(%address, stage = %p.stage, "{}", p.message);

            match dump_account(&client, &input, progress).await {
                Ok(result) => info!(
                    %address,
                    trades = result.summary.total_trades,
                    path = %result.output_path.display(),
                    "Dump complete"
                ),
                Err(e) => error!(%address, stage = %e.stage(), error = %e, "Dump failed"),
            }
        }
    }
}

async fn run_edge(
    client: &PolymarketClient,
    odds_client: &OddsClient,
    settings: &Settings,
    sport: &str,
    event_slug: &str,
    games_sport: Option<&str>,
) -> Result<()> {
    let book = &settings.edge.bookmaker;

    let futures = odds_client
        .fetch_odds(sport, None)
        .await
        .with_context(|| format!("Failed to fetch {sport} odds"))?;
    let vegas = futures.first().map(|event| vegas_odds(event, book)).unwrap_or_default();

    let event = client
        .fetch_event_by_slug(event_slug)
        .await
        .with_context(|| format!("Failed to fetch event {event_slug}"))?
        .ok_or_else(|| anyhow!("No Polymarket event with slug {event_slug}"))?;
    let poly = poly_prices(&event);

    info!(vegas = vegas.len(), poly = poly.len(), "Comparing prices");
    let edges = calculate_edges(&vegas, &poly, settings.edge.edge_threshold, settings.edge.match_similarity);

    println!("=== Sportsbook vs Polymarket Edge Scanner ===");
    println!();
    println!("Timestamp: {}", Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
    println!();
    print!("{}", render::render_edges(&event.title, &edges, settings.edge.edge_threshold));

    if let Some(games_sport) = games_sport {
        let games = odds_client
            .fetch_odds(games_sport, Some("h2h"))
            .await
            .with_context(|| format!("Failed to fetch {games_sport} games"))?;
        println!();
        println!("## Games: {games_sport}");
        println!();
        print!("{}", render::render_games(&games, book));
    }

    Ok(())
}
