use crate::error::{AppError, Result};
use crate::types::{MetricField, RankMarker, ScorePolicy};

pub const FEED_URL: &str = "https://outlight.fun/api/tokens/most-called";

/// Only calls from channels above this win rate count toward a token's score
/// in the win-rate policy.
pub const WIN_RATE_THRESHOLD: f64 = 30.0;

/// Platform hard limit on post length.
pub const POST_CHAR_LIMIT: usize = 280;

/// How many ranked tokens make it into the post.
pub const TOP_N: usize = 3;

/// Added on top of the platform-supplied reset time when computing the
/// rate-limit wait, to avoid retrying a hair too early.
pub const RATE_LIMIT_BUFFER_SECS: u64 = 10;

/// Floor on the rate-limit wait regardless of how close the reset is.
pub const MIN_RATE_LIMIT_WAIT_SECS: u64 = 60;

/// Feed request timeout (seconds).
pub const FEED_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

// Keeps secrets out of debug logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub feed_url: String,
    /// Timeframe query parameter sent to the feed (FEED_TIMEFRAME).
    pub timeframe: String,
    pub log_level: String,
    /// How tokens are scored (SCORING_POLICY: win-rate | channel-calls | unique-channels).
    pub policy: ScorePolicy,
    /// Rank marker style in the primary post (RANK_STYLE: medals | ordinal).
    pub rank_marker: RankMarker,
    /// Whether to thread the promotional reply under the primary post (REPLY_ENABLED).
    pub reply_enabled: bool,
    /// Pause between the primary post and the reply (REPLY_COOLDOWN_SECS).
    pub reply_cooldown_secs: u64,
    /// Image attached to the primary post; missing file is non-fatal (POST_IMAGE_PATH).
    pub post_image_path: String,
    /// Image attached to the reply; missing file is non-fatal (REPLY_IMAGE_PATH).
    pub reply_image_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            credentials: Credentials {
                consumer_key: require_env("TWITTER_API_KEY")?,
                consumer_secret: require_env("TWITTER_API_SECRET")?,
                access_token: require_env("TWITTER_ACCESS_TOKEN")?,
                access_token_secret: require_env("TWITTER_ACCESS_TOKEN_SECRET")?,
            },
            feed_url: std::env::var("FEED_URL").unwrap_or_else(|_| FEED_URL.to_string()),
            timeframe: std::env::var("FEED_TIMEFRAME").unwrap_or_else(|_| "6h".to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            policy: parse_policy(
                &std::env::var("SCORING_POLICY").unwrap_or_else(|_| "win-rate".to_string()),
            )?,
            rank_marker: parse_rank_marker(
                &std::env::var("RANK_STYLE").unwrap_or_else(|_| "medals".to_string()),
            )?,
            reply_enabled: std::env::var("REPLY_ENABLED")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            reply_cooldown_secs: std::env::var("REPLY_COOLDOWN_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse::<u64>()
                .unwrap_or(5),
            post_image_path: std::env::var("POST_IMAGE_PATH")
                .unwrap_or_else(|_| "images/post.png".to_string()),
            reply_image_path: std::env::var("REPLY_IMAGE_PATH")
                .unwrap_or_else(|_| "images/reply.png".to_string()),
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Config(format!("{name} is not set")))
}

pub fn parse_policy(s: &str) -> Result<ScorePolicy> {
    match s.trim().to_lowercase().as_str() {
        "win-rate" | "win_rate" => Ok(ScorePolicy::WinRateCount {
            threshold: WIN_RATE_THRESHOLD,
        }),
        "channel-calls" | "channel_calls" => Ok(ScorePolicy::DirectMetric {
            field: MetricField::ChannelCalls,
        }),
        "unique-channels" | "unique_channels" => Ok(ScorePolicy::DirectMetric {
            field: MetricField::UniqueChannels,
        }),
        other => Err(AppError::Config(format!(
            "SCORING_POLICY must be win-rate, channel-calls or unique-channels (got {other:?})"
        ))),
    }
}

pub fn parse_rank_marker(s: &str) -> Result<RankMarker> {
    match s.trim().to_lowercase().as_str() {
        "medals" => Ok(RankMarker::Medals),
        "ordinal" => Ok(RankMarker::Ordinal),
        other => Err(AppError::Config(format!(
            "RANK_STYLE must be medals or ordinal (got {other:?})"
        ))),
    }
}
