use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile, MessageId, ParseMode, ReplyParameters};
use tracing::warn;

use crate::tiktok::client::{VideoInfoError, VideoRecord};
use crate::tiktok::download::fetch_media;
use crate::tiktok::usage::format_usage;
use crate::tiktok::TikTokClient;
use crate::utils::telegram::start_chat_action_heartbeat;
use crate::utils::timing::{complete_message_timer, start_message_timer, time_api_call};

pub const PROMPT_REPLY: &str = "Please send a TikTok link to download the video.";
pub const ACK_REPLY: &str = "Downloading the video, hold on...";
pub const SERVICE_ERROR_REPLY: &str =
    "Could not reach the video service. Please check the link and try again.";
pub const VIDEO_FAILED_REPLY: &str = "Failed to download the video.";
pub const AUDIO_FAILED_REPLY: &str = "Failed to download the sound.";

const TIKTOK_TRIGGER: &str = "tiktok";
const RAW_ERROR_REPLY_LIMIT: usize = 3900;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRoute {
    TikTok(String),
    Prompt,
}

pub fn route_text(text: &str) -> MessageRoute {
    if text.to_lowercase().contains(TIKTOK_TRIGGER) {
        MessageRoute::TikTok(text.trim().to_string())
    } else {
        MessageRoute::Prompt
    }
}

pub async fn text_message_handler(bot: Bot, client: TikTokClient, message: Message) -> Result<()> {
    let Some(text) = message.text().map(str::to_string) else {
        return Ok(());
    };

    let mut timer = start_message_timer("text_message", &message);
    let result = match route_text(&text) {
        MessageRoute::TikTok(candidate) => {
            process_tiktok_link(&bot, &client, message.chat.id, message.id, &candidate).await
        }
        MessageRoute::Prompt => send_prompt_reply(&bot, message.chat.id, message.id).await,
    };
    match &result {
        Ok(()) => complete_message_timer(&mut timer, "success", None),
        Err(err) => complete_message_timer(&mut timer, "error", Some(err.to_string())),
    }
    result
}

async fn send_prompt_reply(bot: &Bot, chat_id: ChatId, reply_to: MessageId) -> Result<()> {
    bot.send_message(chat_id, PROMPT_REPLY)
        .reply_parameters(ReplyParameters::new(reply_to))
        .await?;
    Ok(())
}

async fn process_tiktok_link(
    bot: &Bot,
    client: &TikTokClient,
    chat_id: ChatId,
    reply_to: MessageId,
    candidate: &str,
) -> Result<()> {
    // Acknowledge before the blocking network work starts.
    bot.send_message(chat_id, ACK_REPLY)
        .reply_parameters(ReplyParameters::new(reply_to))
        .await?;
    let _chat_action = start_chat_action_heartbeat(bot.clone(), chat_id, ChatAction::UploadVideo);

    let video_url = client.resolve_share_url(candidate).await;
    let outcome = time_api_call("rapidapi", "video_info", || {
        client.fetch_video_info(&video_url)
    })
    .await;

    let info = match outcome {
        Ok(info) => info,
        Err(VideoInfoError::Api { code, raw, .. }) => {
            warn!("Extraction API rejected {video_url} with code {code}");
            let (mut reply, truncated) = truncate_chars(&raw, RAW_ERROR_REPLY_LIMIT);
            if truncated {
                reply.push_str("...");
            }
            bot.send_message(chat_id, reply)
                .reply_parameters(ReplyParameters::new(reply_to))
                .await?;
            return Ok(());
        }
        Err(err) => {
            warn!("Video info fetch failed for {video_url}: {err}");
            bot.send_message(chat_id, SERVICE_ERROR_REPLY)
                .reply_parameters(ReplyParameters::new(reply_to))
                .await?;
            return Ok(());
        }
    };

    send_video_reply(bot, client, chat_id, reply_to, &info.record).await?;
    send_audio_reply(bot, client, chat_id, reply_to, &info.record).await?;

    let usage_report = format_usage(info.usage.as_ref());
    if !usage_report.is_empty() {
        bot.send_message(chat_id, usage_report)
            .reply_parameters(ReplyParameters::new(reply_to))
            .await?;
    }
    Ok(())
}

#[allow(deprecated)]
async fn send_video_reply(
    bot: &Bot,
    client: &TikTokClient,
    chat_id: ChatId,
    reply_to: MessageId,
    record: &VideoRecord,
) -> Result<()> {
    let Some(play_url) = record.play_url() else {
        warn!("Extraction result {:?} has no play URL", record.aweme_id);
        bot.send_message(chat_id, VIDEO_FAILED_REPLY)
            .reply_parameters(ReplyParameters::new(reply_to))
            .await?;
        return Ok(());
    };

    match fetch_media(play_url, client.config().download_timeout).await {
        Ok(bytes) => {
            bot.send_video(chat_id, InputFile::memory(bytes).file_name("video.mp4"))
                .caption(video_caption(record))
                .parse_mode(ParseMode::Markdown)
                .reply_parameters(ReplyParameters::new(reply_to))
                .await?;
        }
        Err(err) => {
            warn!("Video download failed from {play_url}: {err}");
            bot.send_message(chat_id, VIDEO_FAILED_REPLY)
                .reply_parameters(ReplyParameters::new(reply_to))
                .await?;
        }
    }
    Ok(())
}

async fn send_audio_reply(
    bot: &Bot,
    client: &TikTokClient,
    chat_id: ChatId,
    reply_to: MessageId,
    record: &VideoRecord,
) -> Result<()> {
    let Some(music_url) = record.music.as_deref() else {
        return Ok(());
    };

    match fetch_media(music_url, client.config().download_timeout).await {
        Ok(bytes) => {
            bot.send_audio(chat_id, InputFile::memory(bytes).file_name("audio.mp3"))
                .reply_parameters(ReplyParameters::new(reply_to))
                .await?;
        }
        Err(err) => {
            warn!("Audio download failed from {music_url}: {err}");
            bot.send_message(chat_id, AUDIO_FAILED_REPLY)
                .reply_parameters(ReplyParameters::new(reply_to))
                .await?;
        }
    }
    Ok(())
}

fn video_caption(record: &VideoRecord) -> String {
    let title = record.title.as_deref().unwrap_or("Untitled");
    let nickname = record.author_nickname().unwrap_or("Unknown");
    format!("*{title}*\nUser: {nickname}")
}

fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    let mut iter = text.chars();
    let truncated: String = iter.by_ref().take(max_chars).collect();
    let was_truncated = iter.next().is_some();
    (truncated, was_truncated)
}
