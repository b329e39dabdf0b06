//! # Facade Sorter Telegram Bot
//!
//! A Telegram bot that walks inspectors through choosing a facade location
//! (inspection, block, orientation, level) and stores the photos they send
//! under a matching folder structure.

pub mod actions;
pub mod bot;
pub mod config;
pub mod dialogue;
pub mod errors;
pub mod intake_buffer;
pub mod localization;
pub mod persister;
pub mod selection;
pub mod state_repository;
