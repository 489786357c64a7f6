use crate::bot::handlers::{get_user_id_safe, get_user_name, inbound_from_message, Command};
use crate::bot::{TelegramTransport, UnauthorizedCache};
use crate::config::{get_unauthorized_cache_max_size, get_unauthorized_cooldown, BotSettings};
use file_relay_core::conversation::{Conversation, Inbound};
use file_relay_core::session::SessionStore;
use file_relay_core::storage::Backends;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

/// Run the Telegram transport runtime until Ctrl-C.
pub async fn run_bot(settings: Arc<BotSettings>, backends: Backends) {
    let bot = Bot::new(settings.telegram.telegram_token.clone());

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to register bot commands: {}", e);
    }

    let conversation = init_conversation(&bot, backends);
    let unauthorized_cache = init_unauthorized_cache();
    let handler = setup_handler();

    if settings.telegram.allowed_users().is_empty() {
        info!("No allowlist configured, the bot is open to everyone.");
    }
    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![conversation, settings, unauthorized_cache])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn init_conversation(bot: &Bot, backends: Backends) -> Arc<Conversation> {
    let ftp_enabled = backends.ftp_enabled();
    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let conversation = Conversation::new(Arc::new(SessionStore::new()), backends, transport);
    info!("Conversation initialized (FTP enabled: {ftp_enabled}).");
    Arc::new(conversation)
}

fn init_unauthorized_cache() -> Arc<UnauthorizedCache> {
    let cooldown = get_unauthorized_cooldown();
    let max_size = get_unauthorized_cache_max_size();

    info!(
        "Initializing UnauthorizedCache (cooldown: {}s, max_size: {})",
        cooldown, max_size
    );

    Arc::new(UnauthorizedCache::new(cooldown, max_size))
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            dptree::filter(|msg: Message, settings: Arc<BotSettings>| {
                settings.telegram.is_allowed(get_user_id_safe(&msg))
            })
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(handle_command),
            )
            .branch(dptree::endpoint(handle_message)),
        )
        // Everyone outside the allowlist
        .branch(dptree::endpoint(handle_unauthorized))
}

async fn handle_unauthorized(
    bot: Bot,
    msg: Message,
    cache: Arc<UnauthorizedCache>,
) -> Result<(), teloxide::RequestError> {
    let user_id = get_user_id_safe(&msg);

    if cache.should_send(user_id).await {
        info!(
            "⛔️ Unauthorized access from user {} ({}). Sending denial message.",
            user_id,
            get_user_name(&msg)
        );

        if let Err(e) = bot.send_message(msg.chat.id, "⛔️ Access denied").await {
            error!("Failed to send access denied message to {}: {}", user_id, e);
        } else {
            cache.mark_sent(user_id).await;
        }
    }

    respond(())
}

async fn handle_command(
    msg: Message,
    cmd: Command,
    conversation: Arc<Conversation>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = conversation
        .handle(msg.chat.id.0, Inbound::Command(cmd.into()))
        .await
    {
        error!("Command error: {:#}", e);
    }
    respond(())
}

async fn handle_message(
    msg: Message,
    conversation: Arc<Conversation>,
) -> Result<(), teloxide::RequestError> {
    let inbound = inbound_from_message(&msg);
    if let Err(e) = conversation.handle(msg.chat.id.0, inbound).await {
        error!("Message handler error for chat {}: {:#}", msg.chat.id, e);
    }
    respond(())
}
