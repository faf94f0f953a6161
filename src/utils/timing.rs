use std::time::Instant;

use chrono::{DateTime, Utc};
use teloxide::types::Message;
use tracing::info;

const LOGGED_TEXT_LIMIT: usize = 300;

#[derive(Debug)]
pub struct MessageTimer {
    flow: String,
    chat_id: Option<i64>,
    user_id: Option<i64>,
    username: Option<String>,
    message_id: Option<i64>,
    text: Option<String>,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    status: String,
    detail: Option<String>,
    completed: bool,
}

impl MessageTimer {
    pub fn from_message(flow: &str, message: &Message) -> Self {
        let text = message
            .text()
            .map(|value| value.replace('\n', " "))
            .map(|value| {
                if value.chars().count() > LOGGED_TEXT_LIMIT {
                    value.chars().take(LOGGED_TEXT_LIMIT).collect()
                } else {
                    value
                }
            });

        let user = message.from.as_ref();
        MessageTimer {
            flow: flow.to_string(),
            chat_id: Some(message.chat.id.0),
            user_id: user.and_then(|u| i64::try_from(u.id.0).ok()),
            username: user.and_then(|u| u.username.clone()),
            message_id: Some(message.id.0 as i64),
            text,
            started_at: Utc::now(),
            started_perf: Instant::now(),
            status: "success".to_string(),
            detail: None,
            completed: false,
        }
    }

    pub fn log_received(&self) {
        info!(
            target: "bot.timing",
            "event=message_received flow={} chat_id={:?} user_id={:?} username={:?} message_id={:?} received_at={} text={:?}",
            self.flow,
            self.chat_id,
            self.user_id,
            self.username,
            self.message_id,
            self.started_at.to_rfc3339(),
            self.text
        );
    }

    pub fn mark_status(&mut self, status: &str, detail: Option<String>) {
        self.status = status.to_string();
        self.detail = detail;
    }

    pub fn log_completed(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let completed_at = Utc::now();
        let duration = self.started_perf.elapsed().as_secs_f64();
        info!(
            target: "bot.timing",
            "event=message_completed flow={} chat_id={:?} user_id={:?} message_id={:?} started_at={} response_sent_at={} duration_s={:.3} status={} detail={}",
            self.flow,
            self.chat_id,
            self.user_id,
            self.message_id,
            self.started_at.to_rfc3339(),
            completed_at.to_rfc3339(),
            duration,
            self.status,
            self.detail.clone().unwrap_or_default()
        );
    }
}

pub fn start_message_timer(flow: &str, message: &Message) -> MessageTimer {
    let timer = MessageTimer::from_message(flow, message);
    timer.log_received();
    timer
}

pub fn complete_message_timer(timer: &mut MessageTimer, status: &str, detail: Option<String>) {
    timer.mark_status(status, detail);
    timer.log_completed();
}

pub async fn time_api_call<T, E, F, Fut>(service: &str, operation: &str, call: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    info!(
        target: "bot.timing",
        "event=api_request service={} operation={} started_at={}",
        service,
        operation,
        started_at.to_rfc3339()
    );

    let result = call().await;
    let status = if result.is_ok() { "success" } else { "error" };

    let completed_at = Utc::now();
    let duration = started_perf.elapsed().as_secs_f64();
    info!(
        target: "bot.timing",
        "event=api_response service={} operation={} completed_at={} duration_s={:.3} status={}",
        service,
        operation,
        completed_at.to_rfc3339(),
        duration,
        status
    );

    result
}
