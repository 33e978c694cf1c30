use tracing::warn;

use crate::config::POST_CHAR_LIMIT;
use crate::types::{RankMarker, RankedToken};

/// Rotating header lines for the primary post; `{tf}` is replaced with the
/// feed timeframe. Selected by wall-clock hour so consecutive runs vary.
const HEADERS: &[&str] = &[
    "🚀 Top 3 Most 📞 {tf}",
    "🔥 Most Called Tokens — last {tf}",
    "📞 Top callers' picks, {tf} window",
];

/// Rotating promotional replies, selected by wall-clock minute.
const REPLY_MESSAGES: &[&str] = &[
    "🧪 Data from: 🔗 https://outlight.fun/\n#SOL #Outlight #TokenCalls",
    "📊 Rankings powered by https://outlight.fun/\n#SOL #Outlight #TokenCalls",
];

const MEDALS: &[&str] = &["🥇", "🥈", "🥉"];

/// Render the primary post body: rotating header, then one block per ranked
/// token (marker, $SYMBOL, address, call count), blank line between blocks.
/// An empty ranked list renders the header alone.
pub fn primary_body(
    ranked: &[RankedToken],
    marker: RankMarker,
    timeframe: &str,
    hour: u32,
) -> String {
    let header = HEADERS[hour as usize % HEADERS.len()].replace("{tf}", timeframe);
    let mut body = format!("{header}\n\n");

    for (i, token) in ranked.iter().enumerate() {
        let mark = rank_mark(marker, i);
        body.push_str(&format!(
            "{mark} ${}\n{}\n📞 {}\n\n",
            token.symbol, token.address, token.score
        ));
    }

    body.trim_end_matches('\n').to_string()
}

/// Render the threaded reply body, rotated by minute.
pub fn reply_body(minute: u32) -> String {
    REPLY_MESSAGES[minute as usize % REPLY_MESSAGES.len()].to_string()
}

fn rank_mark(marker: RankMarker, index: usize) -> String {
    match marker {
        RankMarker::Medals => MEDALS
            .get(index)
            .map(|m| (*m).to_string())
            .unwrap_or_else(|| format!("{}.", index + 1)),
        RankMarker::Ordinal => format!("{}.", index + 1),
    }
}

/// Warn when a body exceeds the platform limit. Publishing is still
/// attempted; the platform rejection comes back as a normal publish failure.
pub fn check_length(label: &str, body: &str) -> bool {
    let chars = body.chars().count();
    if chars > POST_CHAR_LIMIT {
        warn!("{label} is too long ({chars} chars > {POST_CHAR_LIMIT}); the platform will likely reject it");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(symbol: &str, address: &str, score: u64) -> RankedToken {
        RankedToken {
            symbol: symbol.to_string(),
            address: address.to_string(),
            score,
        }
    }

    #[test]
    fn empty_ranked_list_renders_header_only() {
        let body = primary_body(&[], RankMarker::Medals, "6h", 0);
        assert_eq!(body, "🚀 Top 3 Most 📞 6h");
    }

    #[test]
    fn ordinal_markers_order_tokens() {
        let ranked = vec![token("BAR", "0xBB", 9), token("FOO", "0xAA", 5)];
        let body = primary_body(&ranked, RankMarker::Ordinal, "6h", 0);
        let bar = body.find("1. $BAR").expect("BAR block");
        let foo = body.find("2. $FOO").expect("FOO block");
        assert!(bar < foo);
        assert!(body.contains("0xBB"));
        assert!(body.contains("📞 9"));
    }

    #[test]
    fn medals_mark_the_podium() {
        let ranked = vec![
            token("A", "0x1", 3),
            token("B", "0x2", 2),
            token("C", "0x3", 1),
        ];
        let body = primary_body(&ranked, RankMarker::Medals, "6h", 0);
        assert!(body.contains("🥇 $A"));
        assert!(body.contains("🥈 $B"));
        assert!(body.contains("🥉 $C"));
        assert!(!body.ends_with('\n'));
    }

    #[test]
    fn header_rotates_by_hour_and_wraps() {
        let a = primary_body(&[], RankMarker::Medals, "1h", 1);
        let b = primary_body(&[], RankMarker::Medals, "1h", 1 + HEADERS.len() as u32);
        assert_eq!(a, b);
        let c = primary_body(&[], RankMarker::Medals, "1h", 2);
        assert_ne!(a, c);
    }

    #[test]
    fn reply_rotates_by_minute() {
        assert_eq!(reply_body(0), reply_body(REPLY_MESSAGES.len() as u32));
        assert!(reply_body(7).contains("outlight.fun"));
    }

    #[test]
    fn feed_records_rank_and_render_end_to_end() {
        use crate::ranker::rank_tokens;
        use crate::types::{MetricField, ScorePolicy};
        use serde_json::json;

        let items = vec![
            json!({ "symbol": "FOO", "address": "0xAA", "unique_channels": 5 }),
            json!({ "symbol": "BAR", "address": "0xBB", "unique_channels": 9 }),
        ];
        let (ranked, _) = rank_tokens(
            &items,
            ScorePolicy::DirectMetric { field: MetricField::UniqueChannels },
        );
        assert_eq!(ranked[0].symbol, "BAR");
        assert_eq!(ranked[0].score, 9);
        assert_eq!(ranked[1].symbol, "FOO");

        let body = primary_body(&ranked, RankMarker::Ordinal, "6h", 0);
        assert!(body.find("1. $BAR").unwrap() < body.find("2. $FOO").unwrap());
    }

    #[test]
    fn length_check_flags_oversized_bodies() {
        assert!(check_length("primary post", "short"));
        assert!(!check_length("primary post", &"x".repeat(POST_CHAR_LIMIT + 1)));
    }
}
