//! Upload dialogue module holding the per-user conversation state.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::selection::Selection;

/// Key identifying a user across the state store and the intake buffer
pub type UserKey = u64;

/// Represents the conversation step a user is at
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadState {
    /// Menu shown, fields being filled in
    #[default]
    SelectingParameters,
    /// All fields set, waiting for an explicit confirm tap
    ConfirmingSelection,
    /// Location fixed, photos and files are accepted
    WaitingForPhotos,
}

/// Everything stored for one user between updates
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub state: UploadState,
    pub selection: Selection,
    /// Chat the menu lives in; batch reports are sent here
    pub chat_id: Option<i64>,
    #[serde(default)]
    pub language_code: Option<String>,
}

impl Session {
    pub fn new(chat_id: i64, language_code: Option<&str>) -> Self {
        Self {
            chat_id: Some(chat_id),
            language_code: language_code.map(str::to_string),
            ..Default::default()
        }
    }

    /// Whether attachments can be saved right now
    pub fn accepts_photos(&self) -> bool {
        self.state == UploadState::WaitingForPhotos && self.selection.is_complete()
    }
}

/// How the flow moves from a complete selection to the upload step
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfirmationMode {
    /// Picking the level opens the upload step straight away
    #[default]
    Immediate,
    /// Picking the level shows a summary that must be confirmed first
    Confirm,
}

impl FromStr for ConfirmationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "immediate" => Ok(ConfirmationMode::Immediate),
            "confirm" => Ok(ConfirmationMode::Confirm),
            other => Err(other.to_string()),
        }
    }
}
