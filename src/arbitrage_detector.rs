use crate::event::Event;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Live best-ask for one outcome's "Yes" token. `best_ask` is `None` when no ask could be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomePrice {
    pub question: String,
    pub token_id: String,
    pub best_ask: Option<f64>,
    /// USD notional at the best ask (price x size), 0 when unpriced.
    pub best_ask_size: f64,
}

impl OutcomePrice {
    pub fn priced(question: impl Into<String>, token_id: impl Into<String>, price: f64, size: f64) -> Self {
        Self {
            question: question.into(),
            token_id: token_id.into(),
            best_ask: Some(price),
            best_ask_size: price * size,
        }
    }

    pub fn unpriced(question: impl Into<String>, token_id: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            token_id: token_id.into(),
            best_ask: None,
            best_ask_size: 0.0,
        }
    }

    pub fn is_priced(&self) -> bool {
        self.best_ask.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRef {
    pub id: String,
    pub title: String,
    pub slug: String,
}

impl From<&Event> for EventRef {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            slug: event.slug.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbOpportunity {
    pub event: EventRef,
    /// Every resolved outcome, most expensive first; unpriced outcomes last.
    pub outcomes: Vec<OutcomePrice>,
    pub sum_of_asks: f64,
    pub profit_margin: f64,
    pub min_depth: f64,
    pub outcomes_with_no_asks: usize,
}

pub struct ArbitrageDetector {
    threshold: f64,
    min_depth: f64,
}

impl ArbitrageDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            min_depth: 0.0,
        }
    }

    pub fn with_min_depth(mut self, min_depth: f64) -> Self {
        self.min_depth = min_depth;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Buying every priced outcome at its best ask pays out 1 when the event resolves,
    /// so a sum of asks below the threshold is an opportunity, provided each leg has depth.
    pub fn check_arbitrage(&self, event: &Event, outcomes: &[OutcomePrice]) -> Option<ArbOpportunity> {
        let priced: Vec<&OutcomePrice> = outcomes.iter().filter(|o| o.is_priced()).collect();
        let outcomes_with_no_asks = outcomes.len() - priced.len();

        if priced.len() < 2 {
            return None;
        }

        let sum_of_asks: f64 = priced.iter().filter_map(|o| o.best_ask).sum();
        if sum_of_asks >= self.threshold {
            return None;
        }

        let min_depth = priced
            .iter()
            .map(|o| o.best_ask_size)
            .fold(f64::INFINITY, f64::min);
        if min_depth < self.min_depth {
            return None;
        }

        let mut sorted = outcomes.to_vec();
        sorted.sort_by(|a, b| {
            b.best_ask
                .unwrap_or(0.0)
                .partial_cmp(&a.best_ask.unwrap_or(0.0))
                .unwrap_or(Ordering::Equal)
        });

        Some(ArbOpportunity {
            event: EventRef::from(event),
            outcomes: sorted,
            sum_of_asks,
            profit_margin: 1.0 - sum_of_asks,
            min_depth,
            outcomes_with_no_asks,
        })
    }
}
