use std::error::Error;

use dotenvy::dotenv;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::info;

mod config;
mod handlers;
mod tiktok;
mod utils;

use config::CONFIG;
use handlers::{commands, messages};
use tiktok::{TikTokClient, TikTokConfig};
use utils::logging::init_logging;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    Start,
    Limit,
}

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

#[tokio::main]
async fn main() -> HandlerResult {
    dotenv().ok();
    let _guards = init_logging();

    let bot = Bot::new(CONFIG.bot_token.clone());
    info!("Starting TikTok Downloader Bot");

    let client = TikTokClient::new(TikTokConfig::from_config(&CONFIG));

    let command_handler = dptree::entry()
        .filter_command::<Command>()
        .endpoint(handle_command);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text_message))
        .endpoint(ignore_message);

    Dispatcher::builder(bot, message_handler)
        .dependencies(dptree::deps![client])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(
    bot: Bot,
    client: TikTokClient,
    message: Message,
    command: Command,
) -> HandlerResult {
    match command {
        Command::Start => commands::start_handler(bot, message).await?,
        Command::Limit => commands::limit_handler(bot, client, message).await?,
    }
    Ok(())
}

async fn handle_text_message(bot: Bot, client: TikTokClient, message: Message) -> HandlerResult {
    messages::text_message_handler(bot, client, message).await?;
    Ok(())
}

async fn ignore_message(_message: Message) -> HandlerResult {
    Ok(())
}
