use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::tiktok::usage::RateLimitUsage;
use crate::utils::http::get_http_client;

#[derive(Debug, Clone)]
pub struct TikTokConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_host: String,
    pub probe_url: String,
    pub info_timeout: Duration,
    pub download_timeout: Duration,
}

impl TikTokConfig {
    pub fn from_config(config: &Config) -> Self {
        TikTokConfig {
            endpoint: config.video_info_endpoint.clone(),
            api_key: config.rapidapi_key.clone(),
            api_host: config.rapidapi_host.clone(),
            probe_url: config.rate_limit_probe_url.clone(),
            info_timeout: Duration::from_secs(config.video_info_timeout_seconds),
            download_timeout: Duration::from_secs(config.media_download_timeout_seconds),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoAuthor {
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoRecord {
    pub aweme_id: Option<String>,
    pub title: Option<String>,
    pub author: Option<VideoAuthor>,
    pub nowatermark: Option<String>,
    pub hdplay: Option<String>,
    pub music: Option<String>,
}

impl VideoRecord {
    pub fn play_url(&self) -> Option<&str> {
        self.hdplay.as_deref().or(self.nowatermark.as_deref())
    }

    pub fn author_nickname(&self) -> Option<&str> {
        self.author
            .as_ref()
            .and_then(|author| author.nickname.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    code: Option<i64>,
    data: Option<VideoRecord>,
}

#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub record: VideoRecord,
    pub usage: Option<RateLimitUsage>,
}

#[derive(Debug, thiserror::Error)]
pub enum VideoInfoError {
    #[error("video info request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("video info endpoint returned status {0}")]
    Status(StatusCode),
    #[error("video info response was not valid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("extraction API returned code {code}")]
    Api {
        code: i64,
        raw: String,
        usage: Option<RateLimitUsage>,
    },
}

#[derive(Clone)]
pub struct TikTokClient {
    http: Client,
    config: TikTokConfig,
}

impl TikTokClient {
    pub fn new(config: TikTokConfig) -> Self {
        TikTokClient {
            http: get_http_client().clone(),
            config,
        }
    }

    pub fn config(&self) -> &TikTokConfig {
        &self.config
    }

    pub async fn fetch_video_info(&self, video_url: &str) -> Result<VideoInfo, VideoInfoError> {
        info!(
            "Calling extraction endpoint {} for {video_url}",
            self.config.endpoint
        );

        let response = self
            .http
            .get(&self.config.endpoint)
            .query(&[("url", video_url), ("hd", "1")])
            .header("x-rapidapi-key", self.config.api_key.as_str())
            .header("x-rapidapi-host", self.config.api_host.as_str())
            .timeout(self.config.info_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VideoInfoError::Status(status));
        }

        let usage = RateLimitUsage::from_headers(response.headers());
        let raw = response.text().await?;
        debug!("Raw extraction response: {raw}");

        let envelope: ApiEnvelope = serde_json::from_str(&raw)?;
        match envelope.code {
            Some(0) => Ok(VideoInfo {
                record: envelope.data.unwrap_or_default(),
                usage,
            }),
            other => Err(VideoInfoError::Api {
                code: other.unwrap_or(-1),
                raw,
                usage,
            }),
        }
    }

    pub async fn resolve_share_url(&self, input: &str) -> String {
        let trimmed = input.trim();
        let is_http_url = reqwest::Url::parse(trimmed)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !is_http_url {
            return trimmed.to_string();
        }

        match self
            .http
            .get(trimmed)
            .timeout(self.config.info_timeout)
            .send()
            .await
        {
            Ok(response) => response.url().to_string(),
            Err(err) => {
                debug!("Share URL resolution failed for {trimmed}: {err}");
                trimmed.to_string()
            }
        }
    }
}
