use serde::{Deserialize, Deserializer, Serialize};

/// An event from the Gamma listing: a group of mutually exclusive outcome markets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub closed: bool,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume: f64,
    #[serde(default)]
    pub markets: Vec<Market>,
}

impl Event {
    pub fn new(id: impl Into<String>, title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            slug: slug.into(),
            active: true,
            closed: false,
            volume: 0.0,
            markets: Vec::new(),
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_markets(mut self, markets: Vec<Market>) -> Self {
        self.markets = markets;
        self
    }

    /// Markets that are still tradable (active and not closed), in listing order.
    pub fn active_markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.iter().filter(|m| m.is_tradable())
    }

    pub fn active_market_count(&self) -> usize {
        self.active_markets().count()
    }
}

/// One binary outcome inside an event.
///
/// `clob_token_ids` is a JSON-encoded array string, `["<yes>", "<no>"]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub clob_token_ids: String,
    #[serde(default)]
    pub best_ask: Option<f64>,
    #[serde(default)]
    pub outcome_prices: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub closed: bool,
}

impl Market {
    pub fn new(question: impl Into<String>, clob_token_ids: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            clob_token_ids: clob_token_ids.into(),
            best_ask: None,
            outcome_prices: String::new(),
            active: true,
            closed: false,
        }
    }

    pub fn with_best_ask(mut self, best_ask: f64) -> Self {
        self.best_ask = Some(best_ask);
        self
    }

    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    pub fn is_tradable(&self) -> bool {
        self.active && !self.closed
    }

    /// Token id of the "Yes" side, or `None` when the encoded pair is malformed or empty.
    pub fn yes_token_id(&self) -> Option<String> {
        parse_json_list(&self.clob_token_ids)
            .into_iter()
            .next()
            .filter(|id| !id.is_empty())
    }

    /// First entry of `outcome_prices` ("Yes" price), if it parses.
    pub fn yes_price(&self) -> Option<f64> {
        parse_json_list(&self.outcome_prices)
            .first()
            .and_then(|p| p.parse::<f64>().ok())
    }
}

/// Decodes the JSON-in-a-string lists Gamma uses. Anything malformed yields an empty list.
pub fn parse_json_list(raw: &str) -> Vec<String> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Snapshot of a CLOB order book for one token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Orderbook {
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub bids: Vec<BookLevel>,
    #[serde(default)]
    pub asks: Vec<BookLevel>,
}

impl Orderbook {
    /// Best ask as `(price, size)`, taken from the first ask level.
    pub fn best_ask(&self) -> Option<(f64, f64)> {
        self.asks.first().and_then(BookLevel::parsed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: String,
    pub size: String,
}

impl BookLevel {
    pub fn new(price: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            price: price.into(),
            size: size.into(),
        }
    }

    fn parsed(&self) -> Option<(f64, f64)> {
        let price = self.price.trim().parse::<f64>().ok().filter(|p| p.is_finite())?;
        let size = self.size.trim().parse::<f64>().ok().filter(|s| s.is_finite())?;
        Some((price, size))
    }
}

/// Accepts a number, a numeric string, or null (as 0).
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}
