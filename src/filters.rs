//! Cheap, network-free narrowing of the event universe down to arbitrage candidates.

use crate::event::Event;

/// Eligibility floors applied before any price is looked at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketFilters {
    pub min_outcomes: usize,
    pub min_volume: f64,
}

impl MarketFilters {
    pub fn new(min_outcomes: usize, min_volume: f64) -> Self {
        Self {
            min_outcomes,
            min_volume,
        }
    }

    pub fn is_eligible(&self, event: &Event) -> bool {
        event.active_market_count() >= self.min_outcomes && event.volume >= self.min_volume
    }

    pub fn filter_events(&self, events: &[Event]) -> Vec<Event> {
        events
            .iter()
            .filter(|event| self.is_eligible(event))
            .cloned()
            .collect()
    }
}

/// Indicative-price pre-filter.
///
/// Gamma listings already carry an approximate best ask per market, so events whose
/// indicative sum is clearly above the threshold can be dropped without touching the CLOB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreFilter {
    /// Slack added on top of the caller's threshold.
    pub margin: f64,
    /// Price assumed for a market without an indicative ask.
    pub missing_price: f64,
}

impl Default for PreFilter {
    fn default() -> Self {
        Self {
            margin: 0.05,
            missing_price: 1.0,
        }
    }
}

impl PreFilter {
    pub fn new(margin: f64, missing_price: f64) -> Self {
        Self {
            margin,
            missing_price,
        }
    }

    pub fn indicative_sum(&self, event: &Event) -> f64 {
        event
            .active_markets()
            .map(|m| m.best_ask.unwrap_or(self.missing_price))
            .sum()
    }

    pub fn passes(&self, event: &Event, threshold: f64) -> bool {
        self.indicative_sum(event) < threshold + self.margin
    }

    pub fn filter_events(&self, events: &[Event], threshold: f64) -> Vec<Event> {
        events
            .iter()
            .filter(|event| self.passes(event, threshold))
            .cloned()
            .collect()
    }
}
