use chrono::{Local, TimeZone};
use reqwest::header::HeaderMap;

const MISSING_FIELD: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitUsage {
    pub limit: Option<String>,
    pub remaining: Option<String>,
    pub reset: Option<String>,
}

impl RateLimitUsage {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.to_string())
        };

        let usage = RateLimitUsage {
            limit: read("x-ratelimit-limit"),
            remaining: read("x-ratelimit-remaining"),
            reset: read("x-ratelimit-reset"),
        };
        if usage.limit.is_none() && usage.remaining.is_none() && usage.reset.is_none() {
            return None;
        }
        Some(usage)
    }
}

fn format_reset_time(raw: &str) -> String {
    raw.parse::<i64>()
        .ok()
        .and_then(|ts| Local.timestamp_opt(ts, 0).single())
        .map(|reset_at| reset_at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn format_usage(usage: Option<&RateLimitUsage>) -> String {
    let Some(usage) = usage else {
        return String::new();
    };

    let remaining = usage.remaining.as_deref().unwrap_or(MISSING_FIELD);
    let limit = usage.limit.as_deref().unwrap_or(MISSING_FIELD);
    let reset = usage
        .reset
        .as_deref()
        .map(format_reset_time)
        .unwrap_or_else(|| MISSING_FIELD.to_string());

    format!("API usage: {remaining}/{limit} requests left. Resets at {reset}.")
}
