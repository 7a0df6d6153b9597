//! Account-level records from the data API, plus the derived dump records.

use crate::event::lenient_f64;
use serde::{Deserialize, Serialize};

/// One entry of an account's activity feed (trades, redemptions, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Activity {
    pub proxy_wallet: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub condition_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub size: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub usdc_size: f64,
    pub transaction_hash: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub price: f64,
    pub asset: String,
    pub side: String,
    pub outcome_index: i64,
    pub title: String,
    pub slug: String,
    pub icon: String,
    pub event_slug: String,
    pub outcome: String,
    pub name: String,
    pub pseudonym: String,
    pub bio: String,
    pub profile_image: String,
    pub profile_image_optimized: String,
}

impl Activity {
    pub fn is_trade(&self) -> bool {
        self.kind == "TRADE"
    }

    pub fn is_redeem(&self) -> bool {
        self.kind == "REDEEM"
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Position {
    pub proxy_wallet: String,
    pub asset: String,
    pub condition_id: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub size: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub avg_price: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub initial_value: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub current_value: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub cash_pnl: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub percent_pnl: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub total_bought: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub realized_pnl: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub percent_realized_pnl: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub cur_price: f64,
    pub redeemable: bool,
    pub mergeable: bool,
    pub title: String,
    pub slug: String,
    pub icon: String,
    pub event_id: String,
    pub event_slug: String,
    pub outcome: String,
    pub outcome_index: i64,
    pub opposite_outcome: String,
    pub opposite_asset: String,
    pub end_date: String,
    pub negative_risk: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub address: String,
    pub name: String,
    pub pseudonym: String,
    pub bio: String,
    pub profile_image: String,
}

impl Profile {
    /// The data API has no profile endpoint; profile fields ride along on activity records.
    pub fn from_activity(address: &str, activity: &[Activity]) -> Self {
        match activity.first() {
            Some(first) => Self {
                address: address.to_string(),
                name: first.name.clone(),
                pseudonym: first.pseudonym.clone(),
                bio: first.bio.clone(),
                profile_image: first.profile_image.clone(),
            },
            None => Self {
                address: address.to_string(),
                ..Default::default()
            },
        }
    }
}

/// Gamma market metadata looked up by condition id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketInfo {
    pub id: String,
    pub question: String,
    pub condition_id: String,
    pub slug: String,
    pub category: String,
    pub outcomes: String,
    pub outcome_prices: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_trades: usize,
    pub total_volume: f64,
    pub estimated_profit: f64,
    pub buy_count: usize,
    pub sell_count: usize,
    pub buy_ratio: f64,
    pub avg_trade_size: f64,
    pub trades_per_day: f64,
    pub time_range: TimeRange,
    pub category_breakdown: Vec<CategoryStat>,
    pub top_outcomes: Vec<OutcomeStat>,
    pub both_sides_trades: Vec<BothSidesEvent>,
    pub large_positions: usize,
    pub open_positions_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStat {
    pub category: String,
    pub trades: usize,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeStat {
    pub outcome: String,
    pub trades: usize,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BothSidesEvent {
    pub event: String,
    pub trades: usize,
}

/// Written next to the data files of each dump.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpMeta {
    pub address: String,
    pub username: Option<String>,
    pub dumped_at: String,
    pub days: u32,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_type_field_and_camel_case() {
        let activity: Activity = serde_json::from_value(serde_json::json!({
            "proxyWallet": "0xabc",
            "timestamp": 1738700000,
            "conditionId": "0xcond",
            "type": "TRADE",
            "usdcSize": 12.5,
            "side": "BUY",
            "eventSlug": "evt"
        }))
        .unwrap();

        assert!(activity.is_trade());
        assert_eq!(activity.usdc_size, 12.5);
        assert_eq!(activity.event_slug, "evt");

        let back = serde_json::to_value(&activity).unwrap();
        assert_eq!(back["type"], "TRADE");
        assert_eq!(back["usdcSize"], 12.5);
    }

    #[test]
    fn test_profile_from_first_activity() {
        let activity = vec![
            Activity {
                name: "countryside".to_string(),
                pseudonym: "Quiet-Fox".to_string(),
                ..Default::default()
            },
            Activity {
                name: "other".to_string(),
                ..Default::default()
            },
        ];
        let profile = Profile::from_activity("0xabc", &activity);
        assert_eq!(profile.name, "countryside");
        assert_eq!(profile.pseudonym, "Quiet-Fox");

        let empty = Profile::from_activity("0xabc", &[]);
        assert_eq!(empty.address, "0xabc");
        assert!(empty.name.is_empty());
    }

    #[test]
    fn test_market_info_accepts_string_volume() {
        let info: MarketInfo = serde_json::from_value(serde_json::json!({
            "id": "1",
            "conditionId": "0xcond",
            "volume": "1234.5"
        }))
        .unwrap();
        assert_eq!(info.volume, 1234.5);
    }
}
