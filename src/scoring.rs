// src/scoring.rs
//! Scoring/filter engine. Pure: the evaluation time is always passed in.
use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;

use crate::types::{MarketDescriptor, ScoredMarket};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Absolute distance between two instants in whole days, rounded half away from zero.
pub fn days_between(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    let diff_ms = (a - b).num_milliseconds().abs() as f64;
    (diff_ms / MS_PER_DAY).round() as i64
}

pub fn score_market(market: &MarketDescriptor, evaluation_time: DateTime<Utc>) -> ScoredMarket {
    let tvl = market.liquidity.unwrap_or(0.0);
    let days_to_expiry = days_between(evaluation_time, market.end_date);
    let score = tvl / (days_to_expiry + 1) as f64;
    ScoredMarket { market: market.clone(), tvl, days_to_expiry, score }
}

/// Score every market, drop the ineligible ones and rank the rest by score, best first.
///
/// A market survives when `tvl >= min_tvl`, `0 < days_to_expiry <= max_days_to_expiry`
/// and it resolves after `evaluation_time`. Equal scores keep their input order.
pub fn score_and_filter(
    markets: &[MarketDescriptor],
    min_tvl: f64,
    max_days_to_expiry: u32,
    evaluation_time: DateTime<Utc>,
) -> Vec<ScoredMarket> {
    let max_days = i64::from(max_days_to_expiry);
    let mut ranked: Vec<ScoredMarket> = markets
        .iter()
        .map(|m| score_market(m, evaluation_time))
        .filter(|s| {
            s.tvl >= min_tvl
                && s.days_to_expiry <= max_days
                && s.days_to_expiry > 0
                && s.end_date() > evaluation_time
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| OrderedFloat(b.score).cmp(&OrderedFloat(a.score)));
    ranked
}

/// Top-N by score. `ranked` must already be ordered by `score_and_filter`.
pub fn select_top(mut ranked: Vec<ScoredMarket>, max_components: usize) -> Vec<ScoredMarket> {
    ranked.truncate(max_components);
    ranked
}
