use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use tracing::{info, warn};

use crate::config::{Credentials, MIN_RATE_LIMIT_WAIT_SECS, RATE_LIMIT_BUFFER_SECS};
use crate::error::{AppError, Result};
use crate::oauth;

pub const API_BASE: &str = "https://api.twitter.com";
pub const MEDIA_UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Thin client over the X API: identity check, media upload, post creation.
/// One instance per run; credentials never leave it.
pub struct Publisher {
    client: reqwest::Client,
    creds: Credentials,
}

impl Publisher {
    pub fn new(creds: Credentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, creds })
    }

    /// Fetch the authenticated account's handle. Run before posting so a bad
    /// credential fails the run up front instead of mid-sequence.
    pub async fn verify_credentials(&self) -> Result<String> {
        let url = format!("{API_BASE}/2/users/me");
        let auth = oauth::authorization_header(&self.creds, "GET", &url, &[]);

        let resp = self
            .client
            .get(&url)
            .header("Authorization", auth)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!(
                "identity check failed ({status}): {body}"
            )));
        }

        let body: serde_json::Value = resp.json().await?;
        body.get("data")
            .and_then(|d| d.get("username"))
            .and_then(|u| u.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Auth("identity response missing data.username".to_string()))
    }

    /// Upload a local image for attachment. Every failure path is non-fatal:
    /// a missing file or a rejected upload just means the post goes out bare.
    pub async fn upload_media(&self, path: &str) -> Option<String> {
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) => {
                warn!("Image {path} not readable ({e}); posting without it");
                return None;
            }
        };

        let file_name = std::path::Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media.png".to_string());
        let form = reqwest::multipart::Form::new()
            .part("media", reqwest::multipart::Part::bytes(bytes).file_name(file_name));

        // Multipart bodies are excluded from the OAuth signature.
        let auth = oauth::authorization_header(&self.creds, "POST", MEDIA_UPLOAD_URL, &[]);

        let resp = match self
            .client
            .post(MEDIA_UPLOAD_URL)
            .header("Authorization", auth)
            .multipart(form)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Media upload request for {path} failed ({e}); posting without it");
                return None;
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            warn!("Media upload for {path} rejected ({status}); posting without it");
            return None;
        }

        let media_id = resp
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| {
                v.get("media_id_string")
                    .and_then(|m| m.as_str())
                    .map(|s| s.to_string())
            });
        match &media_id {
            Some(id) => info!("Uploaded {path} (media id {id})"),
            None => warn!("Media upload response for {path} missing media_id_string"),
        }
        media_id
    }

    /// Create a post and return its id. On a 429 the platform-supplied reset
    /// time drives a single sleep-and-retry; a second failure is final.
    pub async fn create_post(
        &self,
        text: &str,
        media_id: Option<&str>,
        in_reply_to: Option<&str>,
    ) -> Result<String> {
        let mut body = serde_json::json!({ "text": text });
        if let Some(id) = media_id {
            body["media"] = serde_json::json!({ "media_ids": [id] });
        }
        if let Some(parent) = in_reply_to {
            body["reply"] = serde_json::json!({ "in_reply_to_tweet_id": parent });
        }

        attempt_with_retry(|| self.try_create(&body), tokio::time::sleep).await
    }

    /// One create attempt, classified. A 429 becomes `RateLimited` with the
    /// wait derived from the reset header; every other failure is an error.
    async fn try_create(&self, body: &serde_json::Value) -> Result<PostAttempt> {
        let resp = self.send_create(body).await?;
        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            let wait = wait_from_headers(resp.headers());
            let detail = resp.text().await.unwrap_or_default();
            return Ok(PostAttempt::RateLimited { wait, detail });
        }
        parse_post_response(resp).await.map(PostAttempt::Created)
    }

    async fn send_create(&self, body: &serde_json::Value) -> Result<reqwest::Response> {
        let url = format!("{API_BASE}/2/tweets");
        // JSON bodies are excluded from the OAuth signature.
        let auth = oauth::authorization_header(&self.creds, "POST", &url, &[]);
        Ok(self
            .client
            .post(&url)
            .header("Authorization", auth)
            .json(body)
            .send()
            .await?)
    }
}

/// Outcome of a single create attempt.
#[derive(Debug)]
enum PostAttempt {
    Created(String),
    RateLimited { wait: Duration, detail: String },
}

/// Run `attempt`; on a rate limit, sleep and run it exactly once more.
/// A second rate limit is surfaced as `RateLimited`, not retried again.
async fn attempt_with_retry<F, Fut, S, SFut>(mut attempt: F, sleep: S) -> Result<String>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<PostAttempt>>,
    S: FnOnce(Duration) -> SFut,
    SFut: std::future::Future<Output = ()>,
{
    match attempt().await? {
        PostAttempt::Created(id) => Ok(id),
        PostAttempt::RateLimited { wait, .. } => {
            warn!(
                "Rate limited creating post; waiting {}s before the single retry",
                wait.as_secs()
            );
            sleep(wait).await;
            match attempt().await? {
                PostAttempt::Created(id) => Ok(id),
                PostAttempt::RateLimited { detail, .. } => Err(AppError::RateLimited(format!(
                    "still rate limited after retry: {detail}"
                ))),
            }
        }
    }
}

async fn parse_post_response(resp: reqwest::Response) -> Result<String> {
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(AppError::Publish(format!(
            "create post failed ({status}): {body}"
        )));
    }
    let body: serde_json::Value = resp.json().await?;
    body.get("data")
        .and_then(|d| d.get("id"))
        .and_then(|i| i.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::Publish("create post response missing data.id".to_string()))
}

fn wait_from_headers(headers: &reqwest::header::HeaderMap) -> Duration {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let reset = headers
        .get("x-rate-limit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(now);
    rate_limit_wait(reset, now)
}

/// Wait until the advertised reset plus a small buffer, never less than the
/// configured floor.
pub fn rate_limit_wait(reset_secs: u64, now_secs: u64) -> Duration {
    let until_reset = reset_secs.saturating_sub(now_secs);
    Duration::from_secs((until_reset + RATE_LIMIT_BUFFER_SECS).max(MIN_RATE_LIMIT_WAIT_SECS))
}
