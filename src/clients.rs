use crate::account::{Activity, MarketInfo, Position, Profile};
use crate::config::ApiSettings;
use crate::edge::OddsEvent;
use crate::error::ApiError;
use crate::event::{Event, Orderbook};
use crate::rate_limiter::RateLimiter;
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, warn};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

static WALLET_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("wallet address pattern"));

/// Market data consumed by the arbitrage scanner.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// All active, non-closed events. `on_page(fetched, estimated_total)` fires after each page.
    async fn fetch_events(
        &self,
        on_page: &mut (dyn FnMut(usize, usize) + Send),
    ) -> Result<Vec<Event>, ApiError>;

    /// Live order book for one outcome token.
    async fn fetch_orderbook(&self, token_id: &str) -> Result<Orderbook, ApiError>;
}

fn build_http_client(timeout: Option<Duration>) -> Client {
    let mut builder = Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|_| Client::new())
}

async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    url: String,
) -> Result<T, ApiError> {
    let response = request
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            url,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|source| ApiError::Decode { url, source })
}

// Polymarket public API client (data, gamma and CLOB hosts)
#[derive(Clone)]
pub struct PolymarketClient {
    http_client: Client,
    data_url: String,
    gamma_url: String,
    clob_url: String,
    page_size: usize,
    rate_limiter: Arc<RateLimiter>,
}

impl PolymarketClient {
    pub fn new() -> Self {
        Self::from_settings(&ApiSettings::default())
    }

    pub fn from_settings(settings: &ApiSettings) -> Self {
        Self {
            http_client: build_http_client(settings.request_timeout_secs.map(Duration::from_secs)),
            data_url: settings.data_url.trim_end_matches('/').to_string(),
            gamma_url: settings.gamma_url.trim_end_matches('/').to_string(),
            clob_url: settings.clob_url.trim_end_matches('/').to_string(),
            page_size: settings.page_size.max(1),
            rate_limiter: Arc::new(RateLimiter::from_millis(settings.rate_limit_ms)),
        }
    }

    pub fn with_data_url(mut self, url: impl Into<String>) -> Self {
        self.data_url = url.into();
        self
    }

    pub fn with_gamma_url(mut self, url: impl Into<String>) -> Self {
        self.gamma_url = url.into();
        self
    }

    pub fn with_clob_url(mut self, url: impl Into<String>) -> Self {
        self.clob_url = url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Throttled GET. Every outbound call goes through here.
    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        self.rate_limiter.until_ready().await;
        debug!("GET {}", url);
        send_json(self.http_client.get(&url), url).await
    }

    /// Only raw wallet addresses are accepted; usernames cannot be resolved.
    pub fn resolve_address(&self, target: &str) -> Result<String, ApiError> {
        if WALLET_ADDRESS.is_match(target) {
            Ok(target.to_string())
        } else {
            Err(ApiError::UnsupportedTarget(
                "Username lookup not supported. Please use wallet address (0x...)".to_string(),
            ))
        }
    }

    /// Activity for `address` over the last `days` days, newest first.
    pub async fn fetch_activity(
        &self,
        address: &str,
        days: u32,
        mut on_progress: impl FnMut(usize, usize) + Send,
    ) -> Result<Vec<Activity>, ApiError> {
        let cutoff = Utc::now().timestamp() - i64::from(days) * SECONDS_PER_DAY;
        let mut all = Vec::new();
        let mut offset = 0;

        loop {
            let url = format!(
                "{}/activity?user={}&limit={}&offset={}",
                self.data_url, address, self.page_size, offset
            );
            let page: Vec<Activity> = self.get_json(url).await?;
            if page.is_empty() {
                break;
            }

            let page_len = page.len();
            let in_range: Vec<Activity> = page.into_iter().filter(|a| a.timestamp >= cutoff).collect();
            let reached_cutoff = in_range.len() < page_len;
            all.extend(in_range);
            on_progress(all.len(), all.len() + self.page_size);

            if reached_cutoff {
                break;
            }
            offset += self.page_size;
        }

        Ok(all)
    }

    pub async fn fetch_positions(&self, address: &str) -> Result<Vec<Position>, ApiError> {
        self.get_json(format!("{}/positions?user={}", self.data_url, address))
            .await
    }

    /// Gamma market metadata per condition id. Ids that fail to resolve are left out.
    pub async fn fetch_markets(
        &self,
        condition_ids: &[String],
        mut on_progress: impl FnMut(usize, usize) + Send,
    ) -> BTreeMap<String, MarketInfo> {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = condition_ids
            .iter()
            .filter(|id| !id.is_empty() && seen.insert(id.as_str()))
            .collect();

        let mut markets = BTreeMap::new();
        for (i, id) in unique.iter().enumerate() {
            let url = format!("{}/markets?condition_id={}", self.gamma_url, id);
            match self.get_json::<Vec<MarketInfo>>(url).await {
                Ok(found) => {
                    if let Some(market) = found.into_iter().next() {
                        markets.insert((*id).clone(), market);
                    }
                }
                Err(e) => debug!(condition_id = %id, error = %e, "Market lookup failed"),
            }
            on_progress(i + 1, unique.len());
        }

        markets
    }

    pub async fn fetch_event_by_slug(&self, slug: &str) -> Result<Option<Event>, ApiError> {
        let events: Vec<Event> = self
            .get_json(format!("{}/events?slug={}", self.gamma_url, slug))
            .await?;
        Ok(events.into_iter().next())
    }

    /// Profile for `address` as carried on its activity records.
    pub fn extract_profile(&self, address: &str, activity: &[Activity]) -> Profile {
        Profile::from_activity(address, activity)
    }
}

impl Default for PolymarketClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataSource for PolymarketClient {
    async fn fetch_events(
        &self,
        on_page: &mut (dyn FnMut(usize, usize) + Send),
    ) -> Result<Vec<Event>, ApiError> {
        let mut all = Vec::new();
        let mut offset = 0;

        loop {
            let url = format!(
                "{}/events?closed=false&active=true&limit={}&offset={}",
                self.gamma_url, self.page_size, offset
            );
            let page: Vec<Event> = match self.get_json(url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(offset, error = %e, "Event page fetch failed");
                    return Err(e);
                }
            };
            if page.is_empty() {
                break;
            }

            all.extend(page);
            on_page(all.len(), all.len() + self.page_size);
            offset += self.page_size;
        }

        Ok(all)
    }

    async fn fetch_orderbook(&self, token_id: &str) -> Result<Orderbook, ApiError> {
        self.get_json(format!("{}/book?token_id={}", self.clob_url, token_id))
            .await
    }
}

// Sportsbook odds API client
#[derive(Clone)]
pub struct OddsClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl OddsClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http_client: build_http_client(None),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// American-format odds for a sport, US region. `markets` narrows the bet type (e.g. `h2h`).
    pub async fn fetch_odds(
        &self,
        sport: &str,
        markets: Option<&str>,
    ) -> Result<Vec<OddsEvent>, ApiError> {
        // The key stays out of the URL used in errors and logs.
        let url = format!("{}/v4/sports/{}/odds/", self.base_url, sport);
        let mut query = vec![
            ("apiKey", self.api_key.as_str()),
            ("regions", "us"),
            ("oddsFormat", "american"),
        ];
        if let Some(markets) = markets {
            query.push(("markets", markets));
        }

        debug!("GET {}", url);
        send_json(self.http_client.get(&url).query(&query), url).await
    }
}
