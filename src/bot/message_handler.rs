//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error, info};

use crate::dialogue::Session;
use crate::localization::t_lang;
use crate::persister::{Attachment, AttachmentKind};

use super::scheme::{send_menu_with_scheme, SchemeImage};
use super::ui_builder::{render_selection_menu, to_keyboard};
use super::BotContext;

/// Commands understood by the bot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Cancel,
}

impl Command {
    /// Parse `/start`, `/help` or `/cancel`, also in the `/start@bot_name` form
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?.split('@').next()?;
        match name {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            "cancel" => Some(Command::Cancel),
            _ => None,
        }
    }
}

/// Build the attachment descriptor for a photo or document message
pub fn attachment_from_message(msg: &Message) -> Option<Attachment> {
    if let Some(largest_photo) = msg.photo().and_then(|photos| photos.last()) {
        return Some(Attachment {
            kind: AttachmentKind::Photo,
            source_id: largest_photo.file.id.0.clone(),
            unique_id: largest_photo.file.unique_id.0.clone(),
            width: Some(largest_photo.width),
            height: Some(largest_photo.height),
            byte_size: Some(largest_photo.file.size),
            received_at: msg.date,
            original_filename: None,
        });
    }

    msg.document().map(|doc| Attachment {
        kind: AttachmentKind::Document,
        source_id: doc.file.id.0.clone(),
        unique_id: doc.file.unique_id.0.clone(),
        width: None,
        height: None,
        byte_size: Some(doc.file.size),
        received_at: msg.date,
        original_filename: doc.file_name.clone(),
    })
}

async fn handle_command(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    command: Command,
    language_code: Option<&str>,
) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_key = user.id.0;

    match command {
        Command::Start => {
            info!(
                user_id = user_key,
                username = user.username.as_deref().unwrap_or("Unknown"),
                "User started bot"
            );
            let session = Session::new(msg.chat.id.0, language_code);
            ctx.repository.set(user_key, &session).await?;

            send_menu_with_scheme(
                bot,
                msg.chat.id,
                &ctx.config.scheme_dir,
                SchemeImage::General,
                t_lang("welcome-message", language_code),
                to_keyboard(&render_selection_menu(&session.selection, language_code)),
                language_code,
            )
            .await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, t_lang("help-message", language_code))
                .await?;
        }
        Command::Cancel => {
            ctx.repository.delete(user_key).await?;
            bot.send_message(msg.chat.id, t_lang("cancel-message", language_code))
                .await?;
            info!(user_id = user_key, "User cancelled operation");
        }
    }
    Ok(())
}

async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    if let Some(command) = Command::parse(text) {
        return handle_command(bot, msg, ctx, command, language_code).await;
    }

    debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message from user");

    let waiting_for_photos = match msg.from.as_ref() {
        Some(user) => ctx
            .repository
            .get(user.id.0)
            .await?
            .is_some_and(|session| session.accepts_photos()),
        None => false,
    };

    let key = if waiting_for_photos {
        "text-during-upload"
    } else {
        "text-response"
    };
    bot.send_message(msg.chat.id, t_lang(key, language_code))
        .await?;
    Ok(())
}

async fn handle_attachment_message(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    attachment: Attachment,
    language_code: Option<&str>,
) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_key = user.id.0;

    let accepts = ctx
        .repository
        .get(user_key)
        .await?
        .is_some_and(|session| session.accepts_photos());
    if !accepts {
        debug!(user_id = user_key, "Attachment received outside the upload step");
        bot.send_message(msg.chat.id, t_lang("photos-not-expected", language_code))
            .await?;
        return Ok(());
    }

    let group = msg.media_group_id().map(|group| group.0.clone());
    debug!(
        user_id = user_key,
        kind = ?attachment.kind,
        group = group.as_deref().unwrap_or("-"),
        "Attachment received"
    );
    ctx.intake.ingest(user_key, group, attachment).await;
    Ok(())
}

async fn handle_message(bot: &Bot, msg: &Message, ctx: &BotContext) -> Result<()> {
    // Extract user's language code from Telegram
    let language_code = msg
        .from
        .as_ref()
        .and_then(|user| user.language_code.as_ref())
        .map(|s| s.as_str());

    if let Some(text) = msg.text() {
        handle_text_message(bot, msg, ctx, text, language_code).await
    } else if let Some(attachment) = attachment_from_message(msg) {
        handle_attachment_message(bot, msg, ctx, attachment, language_code).await
    } else {
        debug!(user_id = %msg.chat.id, "Received unsupported message type from user");
        bot.send_message(msg.chat.id, t_lang("unsupported-message", language_code))
            .await?;
        Ok(())
    }
}

pub async fn message_handler(bot: Bot, msg: Message, ctx: Arc<BotContext>) -> Result<()> {
    if let Err(e) = handle_message(&bot, &msg, &ctx).await {
        error!(user_id = %msg.chat.id, error = %e, "Failed to handle message");
        let language_code = msg
            .from
            .as_ref()
            .and_then(|user| user.language_code.as_deref());
        bot.send_message(msg.chat.id, t_lang("error-processing-failed", language_code))
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/help@facade_sorter_bot"), Some(Command::Help));
        assert_eq!(Command::parse("/cancel now"), Some(Command::Cancel));
        assert_eq!(Command::parse("start"), None);
        assert_eq!(Command::parse("/upload"), None);
        assert_eq!(Command::parse(""), None);
    }
}
