//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Handles commands, text, photo, and document messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates keyboards and formats messages
//! - `dialogue_manager`: Decides dialogue state transitions for menu actions
//! - `batch_sink`: Saves closed photo batches and reports back to the chat
//! - `scheme`: Sends menus with the optional building scheme images

pub mod batch_sink;
pub mod callback_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod scheme;
pub mod ui_builder;

use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::config::BotConfig;
use crate::intake_buffer::IntakeBuffer;
use crate::state_repository::StateRepository;

// Re-export main handler functions for use in main.rs
pub use batch_sink::{ChatBatchSink, ChatMessenger};
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

/// Shared services handed to every handler
pub struct BotContext {
    pub repository: Arc<dyn StateRepository>,
    pub intake: IntakeBuffer<ChatBatchSink>,
    pub config: BotConfig,
}

/// Dispatcher tree: messages and callback queries
pub fn build_handler() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler))
}
