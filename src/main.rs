mod config;
mod error;
mod feed;
mod formatter;
mod oauth;
mod publisher;
mod ranker;
mod types;

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::Result;
use crate::publisher::Publisher;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    info!(
        "Bot run started (policy={:?}, timeframe={}, reply_enabled={})",
        cfg.policy, cfg.timeframe, cfg.reply_enabled
    );

    // --- Fetch + rank ---
    let client = feed::build_client()?;
    let items = feed::fetch_tokens(&client, &cfg).await?;
    let (ranked, stats) = ranker::rank_tokens(&items, cfg.policy);
    info!(
        "[FILTER] total={} zero_score={} bad_metric={} qualified={}",
        stats.api_total, stats.rejected_zero_score, stats.rejected_bad_metric, stats.qualified,
    );

    if ranked.is_empty() {
        warn!("No tokens qualified for ranking; skipping post.");
        return Ok(());
    }

    // --- Format ---
    let (hour, minute) = hour_minute_utc();
    let body = formatter::primary_body(&ranked, cfg.rank_marker, &cfg.timeframe, hour);
    info!("Prepared primary post ({} chars):\n{body}", body.chars().count());
    formatter::check_length("primary post", &body);

    // --- Publish ---
    let publisher = Publisher::new(cfg.credentials.clone())?;
    let username = publisher.verify_credentials().await?;
    info!("Authenticated as @{username}");

    let media_id = publisher.upload_media(&cfg.post_image_path).await;
    let post_id = publisher
        .create_post(&body, media_id.as_deref(), None)
        .await?;
    info!("Primary post sent: https://twitter.com/{username}/status/{post_id}");

    if cfg.reply_enabled {
        if cfg.reply_cooldown_secs > 0 {
            tokio::time::sleep(std::time::Duration::from_secs(cfg.reply_cooldown_secs)).await;
        }

        let reply = formatter::reply_body(minute);
        info!("Prepared reply ({} chars):\n{reply}", reply.chars().count());
        formatter::check_length("reply post", &reply);

        let reply_media = publisher.upload_media(&cfg.reply_image_path).await;
        match publisher
            .create_post(&reply, reply_media.as_deref(), Some(&post_id))
            .await
        {
            Ok(id) => {
                info!("Reply sent: https://twitter.com/{username}/status/{id}");
            }
            // The primary post already went out, so a failed reply does not
            // fail the run.
            Err(e) => warn!("Reply failed: {e}"),
        }
    }

    info!("Bot run finished.");
    Ok(())
}

/// Current UTC (hour, minute), used to rotate the header and reply texts.
fn hour_minute_utc() -> (u32, u32) {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    (((secs / 3600) % 24) as u32, ((secs / 60) % 60) as u32)
}
