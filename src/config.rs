use std::env;

use anyhow::Result;
use once_cell::sync::Lazy;

const DEFAULT_RAPIDAPI_HOST: &str = "tiktok-video-no-watermark2.p.rapidapi.com";

// Any known-valid video works here; only the rate-limit headers of the probe matter.
const DEFAULT_PROBE_URL: &str = "https://www.tiktok.com/@tiktok/video/7231338487075638570";

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub log_level: String,
    pub rapidapi_key: String,
    pub rapidapi_host: String,
    pub video_info_endpoint: String,
    pub rate_limit_probe_url: String,
    pub video_info_timeout_seconds: u64,
    pub media_download_timeout_seconds: u64,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn load() -> Result<Self> {
        let bot_token = env::var("BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(anyhow::anyhow!("BOT_TOKEN is required"));
        }

        let rapidapi_key = env::var("RAPIDAPI_KEY").unwrap_or_default();
        if rapidapi_key.trim().is_empty() {
            return Err(anyhow::anyhow!("RAPIDAPI_KEY is required"));
        }

        let rapidapi_host = env_string("RAPIDAPI_HOST", DEFAULT_RAPIDAPI_HOST);
        let video_info_endpoint = env::var("RAPIDAPI_ENDPOINT")
            .unwrap_or_else(|_| format!("https://{rapidapi_host}/"));

        Ok(Config {
            bot_token,
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            rapidapi_key,
            rapidapi_host,
            video_info_endpoint,
            rate_limit_probe_url: env_string("RATE_LIMIT_PROBE_URL", DEFAULT_PROBE_URL),
            video_info_timeout_seconds: env_u64("VIDEO_INFO_TIMEOUT_SECONDS", 10),
            media_download_timeout_seconds: env_u64("MEDIA_DOWNLOAD_TIMEOUT_SECONDS", 20),
        })
    }
}
