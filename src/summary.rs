use crate::account::{Activity, BothSidesEvent, CategoryStat, OutcomeStat, Position, Summary, TimeRange};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

const TOP_N: usize = 20;
const LARGE_POSITION_USD: f64 = 10_000.0;
const SECONDS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;

/// Groups items by key, keeping groups in first-seen order.
fn group_by<'a, T, F>(items: &[&'a T], key: F) -> Vec<(String, Vec<&'a T>)>
where
    F: Fn(&T) -> String,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&'a T>)> = Vec::new();

    for item in items {
        let k = key(*item);
        match index.get(&k) {
            Some(&i) => groups[i].1.push(*item),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![*item]));
            }
        }
    }

    groups
}

fn volume(trades: &[&Activity]) -> f64 {
    trades.iter().map(|t| t.usdc_size).sum()
}

fn by_volume_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn iso(seconds: i64, fallback: DateTime<Utc>) -> String {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .unwrap_or(fallback)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Trading analytics for one account. `now` stands in for the time range when there
/// are no trades.
pub fn compute_summary(activity: &[Activity], positions: &[Position], now: DateTime<Utc>) -> Summary {
    let trades: Vec<&Activity> = activity.iter().filter(|a| a.is_trade()).collect();
    let redeem_value: f64 = activity.iter().filter(|a| a.is_redeem()).map(|a| a.usdc_size).sum();
    let buy_count = trades.iter().filter(|t| t.side == "BUY").count();
    let sell_count = trades.iter().filter(|t| t.side == "SELL").count();

    let total_volume = volume(&trades);
    let total_trades = trades.len();

    let both_sides_trades = group_by(&trades, |t| t.event_slug.clone())
        .into_iter()
        .filter(|(_, ts)| ts.iter().map(|t| t.outcome.as_str()).collect::<HashSet<_>>().len() > 1)
        .map(|(event, ts)| BothSidesEvent {
            event,
            trades: ts.len(),
        })
        .collect();

    let mut category_breakdown: Vec<CategoryStat> = group_by(&trades, |t| t.slug.clone())
        .into_iter()
        .map(|(category, ts)| CategoryStat {
            category,
            trades: ts.len(),
            volume: volume(&ts),
        })
        .collect();
    category_breakdown.sort_by(|a, b| by_volume_desc(a.volume, b.volume));
    category_breakdown.truncate(TOP_N);

    let mut top_outcomes: Vec<OutcomeStat> = group_by(&trades, |t| format!("{} - {}", t.title, t.outcome))
        .into_iter()
        .map(|(outcome, ts)| OutcomeStat {
            outcome,
            trades: ts.len(),
            volume: volume(&ts),
        })
        .collect();
    top_outcomes.sort_by(|a, b| by_volume_desc(a.volume, b.volume));
    top_outcomes.truncate(TOP_N);

    let first = trades.iter().map(|t| t.timestamp).min();
    let last = trades.iter().map(|t| t.timestamp).max();
    let (time_range, span_days) = match (first, last) {
        (Some(first), Some(last)) => (
            TimeRange {
                start: iso(first, now),
                end: iso(last, now),
            },
            (last - first) as f64 / SECONDS_PER_DAY,
        ),
        _ => {
            let now_iso = now.to_rfc3339_opts(SecondsFormat::Millis, true);
            (
                TimeRange {
                    start: now_iso.clone(),
                    end: now_iso,
                },
                0.0,
            )
        }
    };

    let (buy_ratio, avg_trade_size) = if total_trades > 0 {
        (
            buy_count as f64 / total_trades as f64,
            total_volume / total_trades as f64,
        )
    } else {
        (0.0, 0.0)
    };

    Summary {
        total_trades,
        total_volume,
        estimated_profit: redeem_value - total_volume,
        buy_count,
        sell_count,
        buy_ratio,
        avg_trade_size,
        trades_per_day: total_trades as f64 / span_days.max(1.0),
        time_range,
        category_breakdown,
        top_outcomes,
        both_sides_trades,
        large_positions: positions
            .iter()
            .filter(|p| p.current_value > LARGE_POSITION_USD)
            .count(),
        open_positions_value: positions.iter().map(|p| p.current_value).sum(),
    }
}
