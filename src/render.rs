//! Plain-text rendering for the `poly` binary. Everything returns a `String` so the
//! binary decides where it goes.

use crate::arbitrage_detector::ArbOpportunity;
use crate::dump::DumpAccountResult;
use crate::edge::{american_to_prob, normalize_team, Edge, OddsEvent, Signal};
use std::fmt::{self, Write};

const TOP_OUTCOMES: usize = 5;
const QUESTION_WIDTH: usize = 40;
const TOP_EDGES: usize = 15;
const TOP_BUYS: usize = 3;

/// Runs `write` against a fresh buffer. Formatting into a `String` never fails.
fn render_with<F>(write: F) -> String
where
    F: FnOnce(&mut String) -> fmt::Result,
{
    let mut out = String::new();
    let _ = write(&mut out);
    out
}

/// Single status line, e.g. `Fetching orderbooks... (12/40)`.
pub fn progress_line(message: &str, current: Option<usize>, total: Option<usize>) -> String {
    match (current, total) {
        (Some(current), Some(total)) => format!("{message} ({current}/{total})"),
        (Some(current), None) => format!("{message} ({current})"),
        _ => message.to_string(),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

pub fn render_opportunities(opportunities: &[ArbOpportunity], threshold: f64, elapsed_secs: f64) -> String {
    render_with(|out| write_opportunities(out, opportunities, threshold, elapsed_secs))
}

fn write_opportunities(
    out: &mut String,
    opportunities: &[ArbOpportunity],
    threshold: f64,
    elapsed_secs: f64,
) -> fmt::Result {
    if opportunities.is_empty() {
        writeln!(out, "No arbitrage opportunities found (threshold: {threshold})")?;
    } else {
        writeln!(out, "=== ARBITRAGE OPPORTUNITIES ===")?;
        writeln!(out)?;

        for opp in opportunities {
            let empty = if opp.outcomes_with_no_asks > 0 {
                format!(", {} empty", opp.outcomes_with_no_asks)
            } else {
                String::new()
            };

            writeln!(out, "{}", opp.event.slug)?;
            writeln!(
                out,
                "  Sum of asks: ${:.3} ({} outcomes{})",
                opp.sum_of_asks,
                opp.outcomes.len(),
                empty
            )?;
            writeln!(out, "  Profit margin: {:.1}%", opp.profit_margin * 100.0)?;
            writeln!(out, "  Min depth: ${:.0}", opp.min_depth)?;
            writeln!(out, "  Top outcomes:")?;

            for outcome in opp.outcomes.iter().filter(|o| o.is_priced()).take(TOP_OUTCOMES) {
                let question = truncate_chars(&outcome.question, QUESTION_WIDTH);
                let price = outcome
                    .best_ask
                    .map(|p| format!("{p:.3}"))
                    .unwrap_or_else(|| "N/A".to_string());
                writeln!(
                    out,
                    "    {:<width$} ${} (${:.0} avail)",
                    question,
                    price,
                    outcome.best_ask_size,
                    width = QUESTION_WIDTH + 2
                )?;
            }
            writeln!(out)?;
        }
    }

    writeln!(out, "Scanned in {elapsed_secs:.1}s | Threshold: {threshold}")
}

pub fn render_dump_result(result: &DumpAccountResult) -> String {
    let summary = &result.summary;
    [
        format!("Saved to {}", result.output_path.display()),
        format!(" Trades: {}", summary.total_trades),
        format!(" Volume: ${:.2}", summary.total_volume),
        format!(" Est. Profit: ${:.2}", summary.estimated_profit),
    ]
    .iter()
    .map(|line| format!("{line}\n"))
    .collect()
}

fn pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Markdown table of the largest edges followed by signal counts and the best BUYs.
pub fn render_edges(title: &str, edges: &[Edge], threshold: f64) -> String {
    render_with(|out| write_edges(out, title, edges, threshold))
}

fn write_edges(out: &mut String, title: &str, edges: &[Edge], threshold: f64) -> fmt::Result {
    writeln!(out, "## {title}")?;
    writeln!(out)?;

    if edges.is_empty() {
        return writeln!(out, "No matching teams between sportsbook and market prices.");
    }

    let book = edges.first().map(|e| e.book.as_str()).unwrap_or("Vegas");
    writeln!(out, "| Team | {book} | Polymarket | Edge | Signal |")?;
    writeln!(out, "|------|------|------------|------|--------|")?;
    for e in edges.iter().take(TOP_EDGES) {
        let signal = match e.signal {
            Signal::Buy => "BUY",
            Signal::Avoid => "AVOID",
            Signal::Neutral => "-",
        };
        writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            e.team,
            pct(e.vegas_prob),
            pct(e.poly_price),
            pct(e.edge),
            signal
        )?;
    }

    let buys: Vec<&Edge> = edges.iter().filter(|e| e.signal == Signal::Buy).collect();
    let avoids = edges.iter().filter(|e| e.signal == Signal::Avoid).count();
    let threshold_pct = threshold * 100.0;

    writeln!(out)?;
    writeln!(out, "### Summary")?;
    writeln!(out, "- BUY signals (edge > {threshold_pct}%): {}", buys.len())?;
    writeln!(out, "- AVOID signals (edge < -{threshold_pct}%): {avoids}")?;

    if !buys.is_empty() {
        writeln!(out)?;
        writeln!(out, "### Top Opportunities")?;
        for e in buys.iter().take(TOP_BUYS) {
            writeln!(
                out,
                "- {}: {} edge ({} {} vs Poly ${:.3})",
                e.team,
                pct(e.edge),
                e.book,
                pct(e.vegas_prob),
                e.poly_price
            )?;
        }
    }

    Ok(())
}

/// Head-to-head odds per game from the first market of `book_key`, grouped as `away @ home`.
pub fn render_games(events: &[OddsEvent], book_key: &str) -> String {
    render_with(|out| write_games(out, events, book_key))
}

fn write_games(out: &mut String, events: &[OddsEvent], book_key: &str) -> fmt::Result {
    let games: Vec<(String, Vec<(String, f64)>)> = events
        .iter()
        .filter_map(|event| {
            let game = event.game_key()?;
            let book = event.bookmakers.iter().find(|b| b.key == book_key)?;
            let market = book.markets.iter().find(|m| m.key == "h2h")?;
            let odds = market.outcomes.iter().map(|o| (o.name.clone(), o.price)).collect();
            Some((game, odds))
        })
        .collect();

    writeln!(out, "Found {} games with odds", games.len())?;
    writeln!(out)?;

    for (game, odds) in games {
        writeln!(out, "### {game}")?;
        for (team, price) in odds {
            let sign = if price > 0.0 { "+" } else { "" };
            writeln!(
                out,
                "  {}: {} ({sign}{price})",
                normalize_team(&team),
                pct(american_to_prob(price))
            )?;
        }
        writeln!(out)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Summary, TimeRange};
    use crate::arbitrage_detector::{EventRef, OutcomePrice};
    use std::path::PathBuf;

    fn opportunity() -> ArbOpportunity {
        ArbOpportunity {
            event: EventRef {
                id: "1".to_string(),
                title: "Who will win?".to_string(),
                slug: "who-will-win".to_string(),
            },
            outcomes: vec![
                OutcomePrice::priced(
                    "Will a candidate with a really long name win the election?",
                    "t1",
                    0.5,
                    400.0,
                ),
                OutcomePrice::priced("Will B win?", "t2", 0.45, 1_000.0),
                OutcomePrice::unpriced("Will C win?", "t3"),
            ],
            sum_of_asks: 0.95,
            profit_margin: 0.05,
            min_depth: 200.0,
            outcomes_with_no_asks: 1,
        }
    }

    #[test]
    fn test_progress_line() {
        assert_eq!(progress_line("Fetching events...", None, None), "Fetching events...");
        assert_eq!(
            progress_line("Fetching orderbooks...", Some(3), Some(10)),
            "Fetching orderbooks... (3/10)"
        );
    }

    #[test]
    fn test_render_opportunities() {
        let text = render_opportunities(&[opportunity()], 0.98, 12.34);

        assert!(text.contains("who-will-win\n"));
        assert!(text.contains("  Sum of asks: $0.950 (3 outcomes, 1 empty)"));
        assert!(text.contains("  Profit margin: 5.0%"));
        assert!(text.contains("  Min depth: $200"));
        assert!(text.contains(&format!(
            "    {:<42} $0.500 ($200 avail)",
            "Will a candidate with a really long name"
        )));
        assert!(!text.contains("Will C win?"));
        assert!(text.ends_with("Scanned in 12.3s | Threshold: 0.98\n"));
    }

    #[test]
    fn test_render_no_opportunities() {
        let text = render_opportunities(&[], 0.98, 1.0);
        assert!(text.starts_with("No arbitrage opportunities found (threshold: 0.98)\n"));
    }

    #[test]
    fn test_render_dump_result() {
        let result = DumpAccountResult {
            output_path: PathBuf::from("data/accounts/0xabc/2026-02-05"),
            address: "0xabc".to_string(),
            summary: Summary {
                total_trades: 12,
                total_volume: 1500.0,
                estimated_profit: -25.5,
                buy_count: 12,
                sell_count: 0,
                buy_ratio: 1.0,
                avg_trade_size: 125.0,
                trades_per_day: 1.0,
                time_range: TimeRange {
                    start: String::new(),
                    end: String::new(),
                },
                category_breakdown: Vec::new(),
                top_outcomes: Vec::new(),
                both_sides_trades: Vec::new(),
                large_positions: 0,
                open_positions_value: 0.0,
            },
        };

        let text = render_dump_result(&result);
        assert!(text.contains("Saved to data/accounts/0xabc/2026-02-05"));
        assert!(text.contains(" Trades: 12"));
        assert!(text.contains(" Est. Profit: $-25.50"));
    }

    #[test]
    fn test_render_edges() {
        let edges = vec![
            Edge {
                team: "boston celtics".to_string(),
                vegas_prob: 0.30,
                poly_price: 0.20,
                edge: 0.10,
                book: "DraftKings".to_string(),
                signal: Signal::Buy,
            },
            Edge {
                team: "new york knicks".to_string(),
                vegas_prob: 0.05,
                poly_price: 0.10,
                edge: -0.05,
                book: "DraftKings".to_string(),
                signal: Signal::Avoid,
            },
        ];

        let text = render_edges("NBA Championship Futures", &edges, 0.03);
        assert!(text.contains("| Team | DraftKings | Polymarket | Edge | Signal |"));
        assert!(text.contains("| boston celtics | 30.0% | 20.0% | 10.0% | BUY |"));
        assert!(text.contains("- BUY signals (edge > 3%): 1"));
        assert!(text.contains("- AVOID signals (edge < -3%): 1"));
        assert!(text.contains("- boston celtics: 10.0% edge (DraftKings 30.0% vs Poly $0.200)"));
    }

    #[test]
    fn test_render_games() {
        let events: Vec<OddsEvent> = serde_json::from_value(serde_json::json!([{
            "id": "g1",
            "sport_key": "basketball_nba",
            "home_team": "Boston Celtics",
            "away_team": "New York Knicks",
            "bookmakers": [{ "key": "draftkings", "title": "DraftKings", "markets": [
                { "key": "h2h", "outcomes": [
                    { "name": "Boston Celtics", "price": -300 },
                    { "name": "New York Knicks", "price": 250 }
                ]}
            ]}]
        }]))
        .unwrap();

        let text = render_games(&events, "draftkings");
        assert!(text.starts_with("Found 1 games with odds"));
        assert!(text.contains("### New York Knicks @ Boston Celtics"));
        assert!(text.contains("  boston celtics: 75.0% (-300)"));
        assert!(text.contains("  new york knicks: 28.6% (+250)"));

        assert!(render_games(&events, "fanduel").starts_with("Found 0 games"));
    }

    #[test]
    fn test_render_edges_without_matches_stops_after_title() {
        assert_eq!(
            render_edges("NBA Championship Futures", &[], 0.03),
            "## NBA Championship Futures\n\nNo matching teams between sportsbook and market prices.\n"
        );
    }
}
