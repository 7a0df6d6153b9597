use crate::arbitrage_detector::{ArbOpportunity, ArbitrageDetector};
use crate::clients::MarketDataSource;
use crate::error::ScanError;
use crate::filters::{MarketFilters, PreFilter};
use crate::orderbook_resolver::resolve_outcomes;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanArbInput {
    pub threshold: f64,
    pub min_outcomes: usize,
    pub min_volume: f64,
    pub min_depth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStage {
    Events,
    Filtering,
    Orderbooks,
    Done,
}

impl ScanStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStage::Events => "events",
            ScanStage::Filtering => "filtering",
            ScanStage::Orderbooks => "orderbooks",
            ScanStage::Done => "done",
        }
    }
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress notification. `current`/`total` are set only for countable work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanProgress {
    pub stage: ScanStage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl ScanProgress {
    pub fn new(stage: ScanStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            current: None,
            total: None,
        }
    }

    pub fn counted(stage: ScanStage, message: impl Into<String>, current: usize, total: usize) -> Self {
        Self {
            stage,
            message: message.into(),
            current: Some(current),
            total: Some(total),
        }
    }
}

/// Scans every active event for cross-outcome arbitrage.
///
/// Stages run strictly in order: fetch the event listing, narrow it with the
/// eligibility filter and the indicative-price pre-filter, then resolve live order
/// books for the surviving candidates and run the detector on each.
pub struct ArbScanner<S> {
    source: S,
    prefilter: PreFilter,
}

impl<S: MarketDataSource> ArbScanner<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            prefilter: PreFilter::default(),
        }
    }

    pub fn with_prefilter(mut self, prefilter: PreFilter) -> Self {
        self.prefilter = prefilter;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Runs a full scan. `on_progress` is invoked inline and must not block.
    ///
    /// Returns opportunities sorted by profit margin, highest first. Only a failed
    /// event listing aborts the scan; order book failures degrade to unpriced outcomes.
    pub async fn scan<F>(&self, input: &ScanArbInput, mut on_progress: F) -> Result<Vec<ArbOpportunity>, ScanError>
    where
        F: FnMut(ScanProgress) + Send,
    {
        on_progress(ScanProgress::new(ScanStage::Events, "Fetching events..."));
        let events = {
            let mut on_page = |current: usize, total: usize| {
                on_progress(ScanProgress::counted(ScanStage::Events, "Fetching events...", current, total));
            };
            self.source
                .fetch_events(&mut on_page)
                .await
                .map_err(|e| ScanError::new(ScanStage::Events, e))?
        };
        info!(events = events.len(), "Fetched active events");

        let filters = MarketFilters::new(input.min_outcomes, input.min_volume);
        let eligible = filters.filter_events(&events);
        on_progress(ScanProgress::new(
            ScanStage::Filtering,
            format!(
                "{} events, {} with {}+ outcomes",
                events.len(),
                eligible.len(),
                input.min_outcomes
            ),
        ));

        let candidates = self.prefilter.filter_events(&eligible, input.threshold);
        let total_outcomes: usize = candidates.iter().map(|e| e.active_market_count()).sum();
        on_progress(ScanProgress::new(
            ScanStage::Filtering,
            format!(
                "{} candidates after price pre-filter ({} outcomes)",
                candidates.len(),
                total_outcomes
            ),
        ));
        info!(
            eligible = eligible.len(),
            candidates = candidates.len(),
            outcomes = total_outcomes,
            "Filtered events"
        );

        let detector = ArbitrageDetector::new(input.threshold).with_min_depth(input.min_depth);
        let mut opportunities = Vec::new();
        let mut outcomes_scanned = 0;

        for event in &candidates {
            let outcomes = resolve_outcomes(&self.source, event, || {
                outcomes_scanned += 1;
                on_progress(ScanProgress::counted(
                    ScanStage::Orderbooks,
                    "Fetching orderbooks...",
                    outcomes_scanned,
                    total_outcomes,
                ));
            })
            .await;

            if let Some(opportunity) = detector.check_arbitrage(event, &outcomes) {
                debug!(
                    event = %opportunity.event.slug,
                    sum_of_asks = opportunity.sum_of_asks,
                    min_depth = opportunity.min_depth,
                    "Arbitrage opportunity"
                );
                opportunities.push(opportunity);
            }
        }

        on_progress(ScanProgress::new(
            ScanStage::Done,
            format!("Scanned {} events ({} outcomes)", candidates.len(), total_outcomes),
        ));
        info!(opportunities = opportunities.len(), "Scan complete");

        opportunities.sort_by(|a, b| {
            b.profit_margin
                .partial_cmp(&a.profit_margin)
                .unwrap_or(Ordering::Equal)
        });

        Ok(opportunities)
    }
}
