use serde::Serialize;

// ---------------------------------------------------------------------------
// Ranked token
// ---------------------------------------------------------------------------

/// A feed token that survived filtering, carrying its derived score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedToken {
    pub symbol: String,
    pub address: String,
    pub score: u64,
}

// ---------------------------------------------------------------------------
// Scoring policy
// ---------------------------------------------------------------------------

/// Which numeric field on the token carries the score directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    ChannelCalls,
    UniqueChannels,
}

impl MetricField {
    /// JSON key on the feed record.
    pub fn key(self) -> &'static str {
        match self {
            MetricField::ChannelCalls => "channel_calls",
            MetricField::UniqueChannels => "unique_channels",
        }
    }
}

impl std::fmt::Display for MetricField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScorePolicy {
    /// Count nested calls with win_rate above the threshold; zero counts drop the token.
    WinRateCount { threshold: f64 },
    /// Read the score straight off a numeric field; missing or non-numeric drops the token.
    DirectMetric { field: MetricField },
}

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

/// Rank marker style in the primary post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMarker {
    /// 🥇 🥈 🥉
    Medals,
    /// 1. 2. 3.
    Ordinal,
}

// ---------------------------------------------------------------------------
// Ranking stats
// ---------------------------------------------------------------------------

/// Per-run counters for the filter pass, logged after ranking.
#[derive(Debug, Default)]
pub struct RankStats {
    pub api_total: usize,
    /// Win-rate policy: tokens with no qualifying calls.
    pub rejected_zero_score: usize,
    /// Direct-metric policy: tokens missing the field or carrying a non-numeric value.
    pub rejected_bad_metric: usize,
    pub qualified: usize,
}
