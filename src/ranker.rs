use tracing::warn;

use crate::config::TOP_N;
use crate::types::{RankStats, RankedToken, ScorePolicy};

/// Score, filter and rank raw feed records, keeping the top 3.
/// Sort is stable, so tokens with equal scores keep their feed order.
/// An empty result means "nothing to post", not an error.
pub fn rank_tokens(
    items: &[serde_json::Value],
    policy: ScorePolicy,
) -> (Vec<RankedToken>, RankStats) {
    let mut stats = RankStats {
        api_total: items.len(),
        ..Default::default()
    };

    let mut ranked: Vec<RankedToken> = Vec::new();
    for item in items {
        match score_token(item, policy, &mut stats) {
            Some(score) => ranked.push(RankedToken {
                symbol: field_str(item, "symbol", "Unknown"),
                address: field_str(item, "address", "No Address Provided"),
                score,
            }),
            None => continue,
        }
    }

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(TOP_N);

    stats.qualified = ranked.len();
    (ranked, stats)
}

fn score_token(
    item: &serde_json::Value,
    policy: ScorePolicy,
    stats: &mut RankStats,
) -> Option<u64> {
    match policy {
        ScorePolicy::WinRateCount { threshold } => {
            let calls = item
                .get("channel_calls")
                .and_then(|c| c.as_array())
                .map(|a| a.as_slice())
                .unwrap_or_default();
            let qualifying = calls
                .iter()
                .filter(|call| {
                    call.get("win_rate")
                        .and_then(|w| w.as_f64())
                        .is_some_and(|w| w > threshold)
                })
                .count() as u64;
            if qualifying == 0 {
                stats.rejected_zero_score += 1;
                return None;
            }
            Some(qualifying)
        }
        ScorePolicy::DirectMetric { field } => {
            // A negative or non-finite value is junk, not a score of 0.
            let value = item.get(field.key()).and_then(|v| {
                v.as_u64().or_else(|| {
                    v.as_f64()
                        .filter(|f| f.is_finite() && *f >= 0.0)
                        .map(|f| f as u64)
                })
            });
            match value {
                Some(v) => Some(v),
                None => {
                    warn!(
                        "Dropping token {:?}: {} missing or non-numeric",
                        item.get("symbol").and_then(|s| s.as_str()).unwrap_or("?"),
                        field.key(),
                    );
                    stats.rejected_bad_metric += 1;
                    None
                }
            }
        }
    }
}

fn field_str(item: &serde_json::Value, key: &str, default: &str) -> String {
    item.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or(default)
        .to_string()
}
