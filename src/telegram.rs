//! Telegram transport loop
//!
//! Long-polls updates with an explicit Dispatcher and routes each update to
//! the message or callback-query endpoint. The endpoints resolve the sender's
//! identity, run the command engine under the session-store lock and perform
//! the send/edit/answer calls; transport failures are logged, never retried.

use std::sync::Arc;

use anyhow::Result;
use teloxide::{
    dispatching::{Dispatcher, UpdateFilterExt},
    dptree,
    error_handlers::LoggingErrorHandler,
    prelude::*,
    types::{ParseMode, Update},
    update_listeners::Polling,
};

use crate::config::Config;
use crate::handler::{handle_command, resolve_callback, AppContext};
use crate::keyboards::command_keyboard;
use crate::session::SessionState;
use crate::systemctl::Systemctl;

/// Run the bot until a termination signal stops the dispatcher.
pub async fn run_bot(config: Config) -> Result<()> {
    let bot = Bot::new(config.api_token.clone());

    // Verify the token and identify the bot account. Fatal on failure.
    let me = match bot.get_me().await {
        Ok(me) => me,
        Err(e) => {
            tracing::error!("Failed to identify bot account: {}", e);
            anyhow::bail!("Bot authentication failed: {}", e);
        }
    };
    tracing::info!(
        "Launching bot: @{} ({})",
        me.username.as_deref().unwrap_or("unknown"),
        me.first_name
    );

    // Polling does not deliver updates while a webhook is set. Fatal on
    // failure, same as an unidentifiable account.
    if let Err(e) = bot.delete_webhook().await {
        anyhow::bail!("Failed to delete webhook: {}", e);
    }

    tracing::info!("Whitelisted ids: {:?}", config.available_ids);
    tracing::info!("Controllable services: {:?}", config.controllable_services);

    let ctx = Arc::new(AppContext::new(&config, Arc::new(Systemctl)));

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![ctx])
        .default_handler(|upd| async move {
            tracing::debug!("Ignoring unclassifiable update: {:?}", upd);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Error in update handler",
        ))
        .enable_ctrlc_handler()
        .build();

    // SIGTERM drains the in-flight update through the shutdown token instead
    // of killing the process.
    #[cfg(unix)]
    {
        let token = dispatcher.shutdown_token();
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    term.recv().await;
                    tracing::info!("SIGTERM received, finishing in-flight updates");
                    if let Ok(done) = token.shutdown() {
                        done.await;
                    }
                }
                Err(e) => tracing::error!("Failed to register SIGTERM handler: {}", e),
            }
        });
    }

    let listener = Polling::builder(bot)
        .timeout(config.poll_timeout())
        .build();

    tracing::info!("Starting dispatcher with long polling...");
    dispatcher
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("Error while receiving update"),
        )
        .await;

    tracing::info!("Dispatcher stopped");
    Ok(())
}

/// Message endpoint: authorize, look up the session, compute and send the
/// reply. Exactly one reply per processed message.
async fn message_handler(bot: Bot, msg: Message, ctx: Arc<AppContext>) -> ResponseResult<()> {
    let Some(identity) = msg.from.as_ref().and_then(|u| u.username.clone()) else {
        let first_name = msg.from.as_ref().map(|u| u.first_name.as_str()).unwrap_or("?");
        tracing::warn!("Not allowed (no user name): {}", first_name);
        return Ok(());
    };

    if !ctx.is_authorized(&identity) {
        tracing::warn!("Id not allowed: {}", identity);
        return Ok(());
    }

    // Absent text resolves to Unknown via the empty string.
    let text = msg.text().unwrap_or("").to_string();
    tracing::debug!("Message from {}: {:?}", identity, text);

    // Lock held across command handling and the systemctl call.
    let reply = {
        let mut sessions = ctx.sessions.lock().await;
        let Some(session) = sessions.get_mut(&identity) else {
            tracing::warn!("Session does not exist for id: {}", identity);
            return Ok(());
        };

        match session.state {
            SessionState::Waiting => handle_command(&ctx, &text).await,
        }
    };

    let request = bot
        .send_message(msg.chat.id, reply.text)
        .parse_mode(ParseMode::Markdown);
    let sent = match reply.keyboard {
        Some(inline) => request.reply_markup(inline).await,
        None => request.reply_markup(command_keyboard()).await,
    };
    if let Err(e) = sent {
        tracing::error!("Failed to send message: {}", e);
    }

    Ok(())
}

/// Callback-query endpoint: authorize, resolve the payload, answer the query,
/// then edit the originating message and drop its inline keyboard.
async fn callback_handler(bot: Bot, query: CallbackQuery, ctx: Arc<AppContext>) -> ResponseResult<()> {
    let Some(identity) = query.from.username.clone() else {
        tracing::warn!("Callback from sender without user name");
        return Ok(());
    };

    if !ctx.is_authorized(&identity) {
        tracing::warn!("Callback id not allowed: {}", identity);
        return Ok(());
    }

    let Some(payload) = query.data.clone() else {
        tracing::warn!("Callback query without payload from {}", identity);
        return Ok(());
    };

    tracing::debug!("Callback from {}: {:?}", identity, payload);

    let outcome = {
        let _sessions = ctx.sessions.lock().await;
        resolve_callback(&ctx, &payload).await
    };

    let Some(outcome) = outcome else {
        tracing::warn!("Unprocessable callback query: {}", payload);
        return Ok(());
    };

    // Acknowledge first; the tap spinner must be dismissed. An answer failure
    // aborts the edit.
    let answer = bot.answer_callback_query(&query.id);
    let answered = match &outcome.toast {
        Some(toast) => answer.text(toast).await,
        None => answer.await,
    };
    if let Err(e) = answered {
        tracing::error!("Failed to answer callback query: {}", e);
        return Ok(());
    }

    // Edit the original message in place; no replacement keyboard, so the
    // control cannot be re-tapped.
    if let Some(message) = &query.message {
        if let Err(e) = bot
            .edit_message_text(message.chat().id, message.id(), outcome.edit_text)
            .parse_mode(ParseMode::Markdown)
            .await
        {
            tracing::error!("Failed to edit message text: {}", e);
        }
    }

    Ok(())
}
