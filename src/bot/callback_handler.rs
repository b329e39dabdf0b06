//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId};
use tracing::{debug, error, info};

use crate::actions::MenuAction;
use crate::dialogue::Session;
use crate::localization::{t_args_lang, t_lang};

use super::dialogue_manager::{transition, ScreenEffect};
use super::scheme::{send_menu_with_scheme, SchemeImage};
use super::ui_builder::{
    format_confirmation, format_upload_prompt, render_confirmation_menu, render_selection_menu,
    render_upload_prompt_menu, to_keyboard,
};
use super::BotContext;

/// The menu message a callback came from
struct MenuMessage {
    chat_id: ChatId,
    message_id: MessageId,
    has_photo: bool,
}

/// Replace the text (or caption, for photo messages) and buttons of a message
async fn edit_menu_body(
    bot: &Bot,
    menu: &MenuMessage,
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    if menu.has_photo {
        let request = bot
            .edit_message_caption(menu.chat_id, menu.message_id)
            .caption(text);
        match keyboard {
            Some(keyboard) => request.reply_markup(keyboard).await?,
            None => request.await?,
        };
    } else {
        let request = bot.edit_message_text(menu.chat_id, menu.message_id, text);
        match keyboard {
            Some(keyboard) => request.reply_markup(keyboard).await?,
            None => request.await?,
        };
    }
    Ok(())
}

fn toast_for(action: MenuAction, language_code: Option<&str>) -> String {
    let selected = |value: String| t_args_lang("toast-selected", &[("value", &value)], language_code);
    match action {
        MenuAction::SetInspection(value) => selected(value.to_string()),
        MenuAction::SetBlock(value) => selected(format!("Block {value}")),
        MenuAction::SetOrientation(value) => selected(value.display_name()),
        MenuAction::SetLevel(value) => selected(value.to_string()),
        MenuAction::Confirm | MenuAction::AddMore => t_lang("toast-ready", language_code),
        MenuAction::Back => t_lang("toast-back", language_code),
        MenuAction::StartOver => t_lang("toast-start-over", language_code),
        MenuAction::Cancel => t_lang("toast-cancelled", language_code),
    }
}

async fn apply_effect(
    bot: &Bot,
    ctx: &BotContext,
    menu: &MenuMessage,
    session: Option<&Session>,
    effect: ScreenEffect,
    language_code: Option<&str>,
) -> Result<()> {
    let selection = session.map(|s| s.selection.clone()).unwrap_or_default();

    match effect {
        ScreenEffect::RedrawMenu => {
            let keyboard = to_keyboard(&render_selection_menu(&selection, language_code));
            if let Err(e) = bot
                .edit_message_reply_markup(menu.chat_id, menu.message_id)
                .reply_markup(keyboard)
                .await
            {
                // Re-choosing the current value leaves the markup unchanged
                debug!(user_id = %menu.chat_id, error = %e, "Menu not redrawn");
            }
        }
        ScreenEffect::ResendMenu { scheme } => {
            if let Err(e) = bot.delete_message(menu.chat_id, menu.message_id).await {
                debug!(user_id = %menu.chat_id, error = %e, "Failed to delete old menu message");
            }
            let text = match scheme {
                Some(block) => {
                    t_args_lang("block-menu-message", &[("block", block.as_str())], language_code)
                }
                None => t_lang("welcome-message", language_code),
            };
            send_menu_with_scheme(
                bot,
                menu.chat_id,
                &ctx.config.scheme_dir,
                SchemeImage::from_block(scheme),
                text,
                to_keyboard(&render_selection_menu(&selection, language_code)),
                language_code,
            )
            .await?;
        }
        ScreenEffect::ShowConfirmation(complete) => {
            edit_menu_body(
                bot,
                menu,
                format_confirmation(&complete, language_code),
                Some(to_keyboard(&render_confirmation_menu(language_code))),
            )
            .await?;
        }
        ScreenEffect::AwaitPhotos { selection, more } => {
            edit_menu_body(
                bot,
                menu,
                format_upload_prompt(&selection, more, language_code),
                Some(to_keyboard(&render_upload_prompt_menu(language_code))),
            )
            .await?;
        }
        ScreenEffect::Cancelled => {
            edit_menu_body(bot, menu, t_lang("cancel-message", language_code), None).await?;
        }
    }
    Ok(())
}

async fn handle_callback(bot: &Bot, q: &CallbackQuery, ctx: &BotContext) -> Result<()> {
    let user_key = q.from.id.0;
    let language_code = q.from.language_code.as_deref();

    let data = q.data.as_deref().unwrap_or("");
    let action = match MenuAction::decode(data) {
        Ok(action) => action,
        Err(e) => {
            debug!(user_id = user_key, error = %e, "Ignoring unknown callback payload");
            bot.answer_callback_query(q.id.clone())
                .text(t_lang("error-invalid-action", language_code))
                .await?;
            return Ok(());
        }
    };

    let Some(message) = &q.message else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let menu = MenuMessage {
        chat_id: message.chat().id,
        message_id: message.id(),
        has_photo: message
            .regular_message()
            .is_some_and(|msg| msg.photo().is_some()),
    };

    let session = ctx
        .repository
        .get(user_key)
        .await?
        .unwrap_or_else(|| Session::new(menu.chat_id.0, language_code));

    let next = match transition(&session, action, ctx.config.confirmation_mode) {
        Ok(next) => next,
        Err(e) => {
            info!(user_id = user_key, action = %action, reason = %e, "Menu choice rejected");
            bot.answer_callback_query(q.id.clone())
                .text(t_lang(e.message_key(), language_code))
                .await?;
            return Ok(());
        }
    };

    match &next.session {
        Some(session) => ctx.repository.set(user_key, session).await?,
        None => ctx.repository.delete(user_key).await?,
    }
    info!(user_id = user_key, action = %action, "Menu action applied");

    apply_effect(bot, ctx, &menu, next.session.as_ref(), next.effect, language_code).await?;

    bot.answer_callback_query(q.id.clone())
        .text(toast_for(action, language_code))
        .await?;
    Ok(())
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery, ctx: Arc<BotContext>) -> Result<()> {
    debug!(user_id = %q.from.id, "Received callback query from user");

    if let Err(e) = handle_callback(&bot, &q, &ctx).await {
        error!(user_id = %q.from.id, error = %e, "Failed to handle callback query");
        if let Some(message) = &q.message {
            let language_code = q.from.language_code.as_deref();
            bot.send_message(
                message.chat().id,
                t_lang("error-processing-failed", language_code),
            )
            .await?;
        }
        // Answer so the client stops showing the loading state
        if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
            debug!(error = %e, "Callback query already answered");
        }
    }
    Ok(())
}
