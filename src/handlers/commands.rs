use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use tracing::warn;

use crate::tiktok::client::VideoInfoError;
use crate::tiktok::usage::format_usage;
use crate::tiktok::TikTokClient;
use crate::utils::timing::{complete_message_timer, start_message_timer, time_api_call};

pub const WELCOME_REPLY: &str = "Hello! I am TikTok Downloader Bot.\n\n\
Send me a message with a TikTok link and I will reply with the watermark-free video and its soundtrack.\n\
Use /limit to check how many extraction API calls remain.";

pub const LIMIT_FAILED_REPLY: &str =
    "Could not fetch the current API usage. Please try again later.";

pub async fn start_handler(bot: Bot, message: Message) -> Result<()> {
    bot.send_message(message.chat.id, WELCOME_REPLY)
        .reply_parameters(ReplyParameters::new(message.id))
        .await?;
    Ok(())
}

pub async fn limit_handler(bot: Bot, client: TikTokClient, message: Message) -> Result<()> {
    let mut timer = start_message_timer("limit_command", &message);
    let result = send_usage_report(&bot, &client, &message).await;
    match &result {
        Ok(()) => complete_message_timer(&mut timer, "success", None),
        Err(err) => complete_message_timer(&mut timer, "error", Some(err.to_string())),
    }
    result
}

async fn send_usage_report(bot: &Bot, client: &TikTokClient, message: &Message) -> Result<()> {
    let probe_url = client.config().probe_url.clone();
    let outcome = time_api_call("rapidapi", "rate_limit_probe", || {
        client.fetch_video_info(&probe_url)
    })
    .await;

    // Usage headers also ride on application-level errors; the record is discarded.
    let usage = match outcome {
        Ok(info) => info.usage,
        Err(VideoInfoError::Api { usage, .. }) => usage,
        Err(err) => {
            warn!("Rate limit probe failed: {err}");
            None
        }
    };

    let report = format_usage(usage.as_ref());
    let reply = if report.is_empty() {
        LIMIT_FAILED_REPLY.to_string()
    } else {
        report
    };
    bot.send_message(message.chat.id, reply)
        .reply_parameters(ReplyParameters::new(message.id))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use wiremock::matchers::{any, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::tiktok::TikTokConfig;

    const TELEGRAM_MESSAGE_JSON: &str = r#"{"ok":true,"result":{"message_id":2,"date":1,"chat":{"id":1,"type":"private","first_name":"test","username":"test"},"from":{"id":1,"is_bot":false,"first_name":"test","username":"test"},"text":"ok"}}"#;

    async fn mount_telegram(server: &MockServer) {
        Mock::given(any())
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(TELEGRAM_MESSAGE_JSON, "application/json"),
            )
            .mount(server)
            .await;
    }

    fn test_bot(server: &MockServer) -> Bot {
        Bot::new("TEST_TOKEN").set_api_url(reqwest::Url::parse(&server.uri()).unwrap())
    }

    fn test_client(endpoint: String, probe_url: String) -> TikTokClient {
        TikTokClient::new(TikTokConfig {
            endpoint,
            api_key: "test-key".to_string(),
            api_host: "test-host".to_string(),
            probe_url,
            info_timeout: Duration::from_secs(5),
            download_timeout: Duration::from_secs(5),
        })
    }

    fn test_message(text: &str) -> Message {
        serde_json::from_value(serde_json::json!({
            "message_id": 1,
            "date": 1,
            "chat": {"id": 1, "type": "private", "first_name": "test", "username": "test"},
            "from": {"id": 1, "is_bot": false, "first_name": "test", "username": "test"},
            "text": text
        }))
        .unwrap()
    }

    async fn sent_texts(server: &MockServer) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path().to_lowercase().ends_with("/sendmessage"))
            .filter_map(|request| {
                serde_json::from_slice::<serde_json::Value>(&request.body)
                    .ok()
                    .and_then(|value| value["text"].as_str().map(str::to_string))
            })
            .collect()
    }

    #[tokio::test]
    async fn start_replies_with_the_welcome_text() {
        let telegram = MockServer::start().await;
        mount_telegram(&telegram).await;

        start_handler(test_bot(&telegram), test_message("/start"))
            .await
            .unwrap();

        let texts = sent_texts(&telegram).await;
        assert_eq!(texts, vec![WELCOME_REPLY.to_string()]);
    }

    #[tokio::test]
    async fn limit_probes_the_fixed_url_and_reports_usage() {
        let telegram = MockServer::start().await;
        mount_telegram(&telegram).await;

        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/extract"))
            .and(query_param("url", "https://www.tiktok.com/@tiktok/video/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-ratelimit-limit", "100")
                    .insert_header("x-ratelimit-remaining", "10")
                    .insert_header("x-ratelimit-reset", "soon")
                    .set_body_json(serde_json::json!({"code": 0, "data": {}})),
            )
            .mount(&api)
            .await;

        let client = test_client(
            format!("{}/extract", api.uri()),
            "https://www.tiktok.com/@tiktok/video/1".to_string(),
        );
        limit_handler(test_bot(&telegram), client, test_message("/limit"))
            .await
            .unwrap();

        assert_eq!(api.received_requests().await.unwrap().len(), 1);
        let texts = sent_texts(&telegram).await;
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("10/100"));
        assert!(texts[0].contains("soon"));
    }

    #[tokio::test]
    async fn limit_reads_usage_even_from_an_api_error() {
        let telegram = MockServer::start().await;
        mount_telegram(&telegram).await;

        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/extract"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-ratelimit-remaining", "3")
                    .set_body_json(serde_json::json!({"code": -1, "msg": "url invalid"})),
            )
            .mount(&api)
            .await;

        let client = test_client(format!("{}/extract", api.uri()), "http://probe".to_string());
        limit_handler(test_bot(&telegram), client, test_message("/limit"))
            .await
            .unwrap();

        let texts = sent_texts(&telegram).await;
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("3/N/A"));
    }

    #[tokio::test]
    async fn limit_reports_failure_when_no_usage_is_available() {
        let telegram = MockServer::start().await;
        mount_telegram(&telegram).await;

        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/extract"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&api)
            .await;

        let client = test_client(format!("{}/extract", api.uri()), "http://probe".to_string());
        limit_handler(test_bot(&telegram), client, test_message("/limit"))
            .await
            .unwrap();

        let texts = sent_texts(&telegram).await;
        assert_eq!(texts, vec![LIMIT_FAILED_REPLY.to_string()]);
    }

    #[tokio::test]
    async fn limit_reports_failure_when_the_body_is_not_json() {
        let telegram = MockServer::start().await;
        mount_telegram(&telegram).await;

        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/extract"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-ratelimit-remaining", "5")
                    .set_body_raw("<html>oops</html>", "text/html"),
            )
            .mount(&api)
            .await;

        let client = test_client(format!("{}/extract", api.uri()), "http://probe".to_string());
        limit_handler(test_bot(&telegram), client, test_message("/limit"))
            .await
            .unwrap();

        let texts = sent_texts(&telegram).await;
        assert_eq!(texts, vec![LIMIT_FAILED_REPLY.to_string()]);
    }
}
