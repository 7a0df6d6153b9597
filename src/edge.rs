//! Sportsbook vs. prediction-market price comparison.
//!
//! Converts bookmaker American odds into implied probabilities and compares them with
//! the platform's "Yes" prices for the same teams.

use crate::event::Event;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// One game or futures market as returned by the odds API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub sport_key: String,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub commence_time: Option<String>,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

impl OddsEvent {
    /// `away @ home`, when both teams are known.
    pub fn game_key(&self) -> Option<String> {
        match (&self.away_team, &self.home_team) {
            (Some(away), Some(home)) => Some(format!("{away} @ {home}")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmaker {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub markets: Vec<OddsMarket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsMarket {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<OddsOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsOutcome {
    pub name: String,
    /// American odds.
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VegasOdds {
    pub team: String,
    pub price: f64,
    pub prob: f64,
    pub book: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolyPrice {
    pub team: String,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Avoid,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub team: String,
    pub vegas_prob: f64,
    pub poly_price: f64,
    pub edge: f64,
    pub book: String,
    pub signal: Signal,
}

pub fn american_to_prob(odds: f64) -> f64 {
    if odds > 0.0 {
        100.0 / (odds + 100.0)
    } else {
        odds.abs() / (odds.abs() + 100.0)
    }
}

/// Reduces "Will the Boston Celtics win the 2026 NBA Finals?" and "Boston Celtics"
/// to the same key.
pub fn normalize_team(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = lowered.strip_prefix("will the ").unwrap_or(&lowered);
    let stripped = match stripped.find(" win") {
        Some(idx) => &stripped[..idx],
        None => stripped,
    };
    WHITESPACE.replace_all(stripped, " ").trim().to_string()
}

/// Odds from `book_key`'s first market, or empty when that book does not price the event.
pub fn vegas_odds(event: &OddsEvent, book_key: &str) -> Vec<VegasOdds> {
    let Some(book) = event.bookmakers.iter().find(|b| b.key == book_key) else {
        return Vec::new();
    };
    let Some(market) = book.markets.first() else {
        return Vec::new();
    };
    let book_name = if book.title.is_empty() { book.key.clone() } else { book.title.clone() };

    market
        .outcomes
        .iter()
        .map(|o| VegasOdds {
            team: normalize_team(&o.name),
            price: o.price,
            prob: american_to_prob(o.price),
            book: book_name.clone(),
        })
        .collect()
}

/// Platform "Yes" prices per team from a multi-outcome event.
pub fn poly_prices(event: &Event) -> Vec<PolyPrice> {
    event
        .markets
        .iter()
        .filter_map(|m| {
            m.yes_price().map(|price| PolyPrice {
                team: normalize_team(&m.question),
                price,
            })
        })
        .collect()
}

fn find_match<'a>(team: &str, poly: &'a [PolyPrice], similarity: f64) -> Option<&'a PolyPrice> {
    if let Some(exact) = poly.iter().find(|p| p.team == team) {
        return Some(exact);
    }

    poly.iter()
        .map(|p| (p, strsim::jaro_winkler(team, &p.team)))
        .filter(|(_, score)| *score >= similarity)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(p, _)| p)
}

/// Pairs each bookmaker price with the platform price for the same team.
///
/// Teams match exactly after normalization, or otherwise by Jaro-Winkler similarity at
/// or above `similarity`. Result is sorted by edge, largest first.
pub fn calculate_edges(vegas: &[VegasOdds], poly: &[PolyPrice], threshold: f64, similarity: f64) -> Vec<Edge> {
    let mut edges: Vec<Edge> = vegas
        .iter()
        .filter_map(|v| {
            let p = find_match(&v.team, poly, similarity)?;
            let edge = v.prob - p.price;
            let signal = if edge > threshold {
                Signal::Buy
            } else if edge < -threshold {
                Signal::Avoid
            } else {
                Signal::Neutral
            };

            Some(Edge {
                team: v.team.clone(),
                vegas_prob: v.prob,
                poly_price: p.price,
                edge,
                book: v.book.clone(),
                signal,
            })
        })
        .collect();

    edges.sort_by(|a, b| b.edge.partial_cmp(&a.edge).unwrap_or(Ordering::Equal));
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Market;

    fn vegas(team: &str, prob: f64) -> VegasOdds {
        VegasOdds {
            team: team.to_string(),
            price: 0.0,
            prob,
            book: "DraftKings".to_string(),
        }
    }

    fn poly(team: &str, price: f64) -> PolyPrice {
        PolyPrice {
            team: team.to_string(),
            price,
        }
    }

    #[test]
    fn test_american_to_prob() {
        assert!((american_to_prob(100.0) - 0.5).abs() < 1e-12);
        assert!((american_to_prob(300.0) - 0.25).abs() < 1e-12);
        assert!((american_to_prob(-300.0) - 0.75).abs() < 1e-12);
        assert!((american_to_prob(-100.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_team() {
        assert_eq!(
            normalize_team("Will the Boston Celtics win the 2026 NBA Finals?"),
            "boston celtics"
        );
        assert_eq!(normalize_team("  Boston   Celtics "), "boston celtics");
        assert_eq!(normalize_team("Boston\t\nCeltics"), "boston celtics");
        assert_eq!(normalize_team("Oklahoma City Thunder"), "oklahoma city thunder");
    }

    #[test]
    fn test_signals_and_ordering() {
        let edges = calculate_edges(
            &[vegas("a", 0.30), vegas("b", 0.10), vegas("c", 0.50), vegas("missing", 0.2)],
            &[poly("a", 0.20), poly("b", 0.20), poly("c", 0.49)],
            0.03,
            1.0,
        );

        let teams: Vec<_> = edges.iter().map(|e| e.team.as_str()).collect();
        assert_eq!(teams, vec!["a", "c", "b"]);
        assert_eq!(edges[0].signal, Signal::Buy);
        assert_eq!(edges[1].signal, Signal::Neutral);
        assert_eq!(edges[2].signal, Signal::Avoid);
    }

    #[test]
    fn test_fuzzy_fallback_respects_similarity() {
        let vegas_odds = [vegas("la clippers", 0.1)];
        let prices = [poly("los angeles lakers", 0.05), poly("la clipper", 0.08)];

        let edges = calculate_edges(&vegas_odds, &prices, 0.03, 0.92);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].poly_price, 0.08);

        assert!(calculate_edges(&vegas_odds, &prices, 0.03, 1.0).is_empty());
    }

    #[test]
    fn test_vegas_odds_uses_requested_book() {
        let event: OddsEvent = serde_json::from_value(serde_json::json!({
            "id": "x",
            "sport_key": "basketball_nba",
            "home_team": "Boston Celtics",
            "away_team": "New York Knicks",
            "bookmakers": [
                { "key": "fanduel", "title": "FanDuel", "markets": [
                    { "key": "h2h", "outcomes": [{ "name": "Boston Celtics", "price": -500 }] }
                ]},
                { "key": "draftkings", "title": "DraftKings", "markets": [
                    { "key": "h2h", "outcomes": [
                        { "name": "Boston Celtics", "price": -300 },
                        { "name": "New York Knicks", "price": 250 }
                    ]}
                ]}
            ]
        }))
        .unwrap();

        let odds = vegas_odds(&event, "draftkings");
        assert_eq!(odds.len(), 2);
        assert_eq!(odds[0].team, "boston celtics");
        assert!((odds[0].prob - 0.75).abs() < 1e-12);
        assert_eq!(odds[0].book, "DraftKings");
        assert_eq!(event.game_key().as_deref(), Some("New York Knicks @ Boston Celtics"));

        assert!(vegas_odds(&event, "pinnacle").is_empty());
    }

    #[test]
    fn test_poly_prices_from_event() {
        let mut celtics = Market::new("Will the Boston Celtics win the 2026 NBA Finals?", "[]");
        celtics.outcome_prices = "[\"0.21\", \"0.79\"]".to_string();
        let mut broken = Market::new("Will the Nobody win the 2026 NBA Finals?", "[]");
        broken.outcome_prices = "oops".to_string();

        let event = Event::new("1", "NBA Champion", "2026-nba-champion").with_markets(vec![celtics, broken]);
        assert_eq!(poly_prices(&event), vec![poly("boston celtics", 0.21)]);
    }
}
