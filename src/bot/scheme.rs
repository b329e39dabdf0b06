//! Building scheme images shown above the selection menu.
//!
//! The images are optional; when one is missing or cannot be sent the menu
//! goes out as plain text with a short note.

use anyhow::Result;
use std::path::{Path, PathBuf};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, InputFile};
use tracing::warn;

use crate::localization::{t_args_lang, t_lang};
use crate::selection::Block;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemeImage {
    /// Whole building, shown with the initial menu
    General,
    /// One block, shown once the block is chosen
    Block(Block),
}

impl SchemeImage {
    pub fn from_block(block: Option<Block>) -> Self {
        block.map_or(SchemeImage::General, SchemeImage::Block)
    }

    pub fn path(&self, scheme_dir: &Path) -> PathBuf {
        match self {
            SchemeImage::General => scheme_dir.join("scheme.png"),
            SchemeImage::Block(block) => scheme_dir.join(format!("scheme_block_{block}.png")),
        }
    }

    fn missing_note(&self, language_code: Option<&str>) -> String {
        match self {
            SchemeImage::General => t_lang("scheme-not-found", language_code),
            SchemeImage::Block(block) => {
                t_args_lang("block-scheme-not-found", &[("block", block.as_str())], language_code)
            }
        }
    }
}

/// Send a menu message, with the scheme image as photo when available
pub async fn send_menu_with_scheme(
    bot: &Bot,
    chat_id: ChatId,
    scheme_dir: &Path,
    image: SchemeImage,
    text: String,
    keyboard: InlineKeyboardMarkup,
    language_code: Option<&str>,
) -> Result<()> {
    let path = image.path(scheme_dir);

    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        match bot
            .send_photo(chat_id, InputFile::file(&path))
            .caption(text.clone())
            .reply_markup(keyboard.clone())
            .await
        {
            Ok(_) => return Ok(()),
            Err(e) => {
                warn!(user_id = %chat_id, path = %path.display(), error = %e, "Failed to send scheme image");
            }
        }
    } else {
        warn!(path = %path.display(), "Scheme image not found");
    }

    bot.send_message(
        chat_id,
        format!("{}\n\n{}", text, image.missing_note(language_code)),
    )
    .reply_markup(keyboard)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_paths() {
        let dir = Path::new("assets/images/scheme");
        assert_eq!(
            SchemeImage::General.path(dir),
            PathBuf::from("assets/images/scheme/scheme.png")
        );
        assert_eq!(
            SchemeImage::from_block(Some(Block::B)).path(dir),
            PathBuf::from("assets/images/scheme/scheme_block_B.png")
        );
    }
}
