//! Chat side of the intake pipeline: downloads attachment bytes, saves
//! closed batches through the persister and reports the outcome in the chat.
//!
//! Progress messages are best effort. Failing to post or edit one never
//! stops a batch from being written.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{FileId, MessageId};
use tracing::{debug, error, info, warn};

use crate::dialogue::UserKey;
use crate::intake_buffer::{Batch, BatchSink};
use crate::localization::t_lang;
use crate::persister::{
    AttachmentSource, FilePersister, PersistProgress, ProgressReporter, SilentProgress,
};
use crate::state_repository::StateRepository;

use super::ui_builder::{
    format_progress, format_upload_report, render_post_upload_menu, to_keyboard, MenuLayout,
};

/// Downloads attachment bytes from the Telegram file API
pub struct TelegramFileSource {
    bot: Bot,
    http: reqwest::Client,
}

impl TelegramFileSource {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AttachmentSource for TelegramFileSource {
    async fn fetch(&self, source_id: &str) -> Result<Vec<u8>> {
        let file = self.bot.get_file(FileId(source_id.to_string())).await?;
        let url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot.token(),
            file.path
        );

        let response = self.http.get(&url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!(file_path = %file.path, bytes = bytes.len(), "Attachment downloaded");
        Ok(bytes.to_vec())
    }
}

/// The few chat operations needed to report on a batch
#[async_trait]
pub trait ChatMessenger: Send + Sync {
    /// Send a plain message and return its id
    async fn send_text(&self, chat_id: i64, text: String) -> Result<i32>;
    async fn edit_text(&self, chat_id: i64, message_id: i32, text: String) -> Result<()>;
    async fn delete(&self, chat_id: i64, message_id: i32) -> Result<()>;
    /// Send a message with an inline menu under it
    async fn send_with_menu(&self, chat_id: i64, text: String, menu: MenuLayout) -> Result<()>;
}

#[async_trait]
impl ChatMessenger for Bot {
    async fn send_text(&self, chat_id: i64, text: String) -> Result<i32> {
        let sent = self.send_message(ChatId(chat_id), text).await?;
        Ok(sent.id.0)
    }

    async fn edit_text(&self, chat_id: i64, message_id: i32, text: String) -> Result<()> {
        self.edit_message_text(ChatId(chat_id), MessageId(message_id), text)
            .await?;
        Ok(())
    }

    async fn delete(&self, chat_id: i64, message_id: i32) -> Result<()> {
        self.delete_message(ChatId(chat_id), MessageId(message_id))
            .await?;
        Ok(())
    }

    async fn send_with_menu(&self, chat_id: i64, text: String, menu: MenuLayout) -> Result<()> {
        self.send_message(ChatId(chat_id), text)
            .reply_markup(to_keyboard(&menu))
            .await?;
        Ok(())
    }
}

/// Keeps a progress message in the chat up to date while a batch is saved
struct ChatProgress {
    messenger: Arc<dyn ChatMessenger>,
    chat_id: i64,
    message_id: i32,
    language_code: Option<String>,
}

#[async_trait]
impl ProgressReporter for ChatProgress {
    async fn report(&self, progress: PersistProgress) {
        let text = format_progress(&progress, self.language_code.as_deref());
        if let Err(e) = self
            .messenger
            .edit_text(self.chat_id, self.message_id, text)
            .await
        {
            debug!(user_id = self.chat_id, error = %e, "Failed to update progress message");
        }
    }
}

/// Batch sink that writes to disk and talks back to the user
pub struct ChatBatchSink {
    messenger: Arc<dyn ChatMessenger>,
    repository: Arc<dyn StateRepository>,
    persister: FilePersister,
    source: Arc<dyn AttachmentSource>,
}

impl ChatBatchSink {
    pub fn new(
        messenger: Arc<dyn ChatMessenger>,
        repository: Arc<dyn StateRepository>,
        persister: FilePersister,
        source: Arc<dyn AttachmentSource>,
    ) -> Self {
        Self {
            messenger,
            repository,
            persister,
            source,
        }
    }

    /// Sink that downloads from and reports to Telegram
    pub fn telegram(bot: Bot, repository: Arc<dyn StateRepository>, persister: FilePersister) -> Self {
        Self::new(
            Arc::new(bot.clone()),
            repository,
            persister,
            Arc::new(TelegramFileSource::new(bot)),
        )
    }

    /// Save one closed batch and report the outcome
    pub async fn save_batch(&self, batch: &Batch) -> Result<()> {
        let session = match self.repository.get(batch.user).await {
            Ok(session) => session,
            Err(e) => {
                error!(user_id = batch.user, size = batch.attachments.len(), error = %e, "Failed to load session for batch");
                self.messenger
                    .send_text(private_chat(batch.user), t_lang("error-saving-photos", None))
                    .await?;
                return Ok(());
            }
        };

        let chat_id = session
            .as_ref()
            .and_then(|s| s.chat_id)
            .unwrap_or(private_chat(batch.user));
        let language_code = session.as_ref().and_then(|s| s.language_code.clone());
        let lang = language_code.as_deref();

        let selection = session
            .as_ref()
            .filter(|s| s.accepts_photos())
            .and_then(|s| s.selection.complete());
        let Some(selection) = selection else {
            warn!(user_id = batch.user, size = batch.attachments.len(), "Batch arrived without a complete selection");
            self.messenger
                .send_text(chat_id, t_lang("error-missing-selection", lang))
                .await?;
            return Ok(());
        };

        let total = batch.attachments.len();
        let progress = if total > 1 {
            let initial = PersistProgress {
                processed: 0,
                total,
                saved: 0,
                failed: 0,
            };
            match self
                .messenger
                .send_text(chat_id, format_progress(&initial, lang))
                .await
            {
                Ok(message_id) => Some(ChatProgress {
                    messenger: Arc::clone(&self.messenger),
                    chat_id,
                    message_id,
                    language_code: language_code.clone(),
                }),
                Err(e) => {
                    warn!(user_id = batch.user, error = %e, "Progress message not sent, saving without it");
                    None
                }
            }
        } else {
            None
        };

        let reporter: &dyn ProgressReporter = match &progress {
            Some(reporter) => reporter,
            None => &SilentProgress,
        };
        let result = self
            .persister
            .persist(&selection, &batch.attachments, self.source.as_ref(), reporter)
            .await;

        if let Some(reporter) = &progress {
            if let Err(e) = self.messenger.delete(chat_id, reporter.message_id).await {
                debug!(user_id = chat_id, error = %e, "Failed to delete progress message");
            }
        }

        match result {
            Ok(report) => {
                info!(
                    user_id = batch.user,
                    saved = report.saved,
                    failed = report.failed,
                    path = %report.directory.display(),
                    "Upload report sent"
                );
                self.messenger
                    .send_with_menu(
                        chat_id,
                        format_upload_report(&selection, report.saved, report.failed, lang),
                        render_post_upload_menu(lang),
                    )
                    .await?;
            }
            Err(e) => {
                // The session is left in the upload step so the user can resend
                error!(user_id = batch.user, error = %e, "Failed to persist batch");
                self.messenger
                    .send_text(chat_id, t_lang("error-saving-photos", lang))
                    .await?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl BatchSink for ChatBatchSink {
    async fn flush(&self, batch: Batch) {
        if let Err(e) = self.save_batch(&batch).await {
            error!(user_id = batch.user, error = %e, "Failed to handle batch");
        }
    }
}

/// In private chats the chat id equals the user id
fn private_chat(user: UserKey) -> i64 {
    user as i64
}
