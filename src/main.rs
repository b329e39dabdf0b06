use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use facade_sorter::bot::{build_handler, BotContext, ChatBatchSink};
use facade_sorter::config::{BotConfig, LogFormat};
use facade_sorter::intake_buffer::IntakeBuffer;
use facade_sorter::persister::FilePersister;
use facade_sorter::state_repository::{
    InMemoryStateRepository, PostgresStateRepository, StateRepository,
};

fn init_tracing(config: &BotConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;
    init_tracing(&config);

    info!(
        storage_root = %config.storage_root().display(),
        mode = ?config.confirmation_mode,
        "Starting Facade Sorter Telegram Bot"
    );

    let repository: Arc<dyn StateRepository> = match &config.database_url {
        Some(database_url) => {
            info!("Using PostgreSQL session store");
            Arc::new(PostgresStateRepository::connect(database_url).await?)
        }
        None => {
            warn!("DATABASE_URL not set, sessions are kept in memory only");
            Arc::new(InMemoryStateRepository::new())
        }
    };

    let bot = Bot::new(&config.bot_token);

    let persister =
        FilePersister::new(config.storage_root()).with_progress_every(config.progress_every);
    let sink = Arc::new(ChatBatchSink::telegram(
        bot.clone(),
        Arc::clone(&repository),
        persister,
    ));
    let intake = IntakeBuffer::new(sink, config.debounce);

    let context = Arc::new(BotContext {
        repository,
        intake: intake.clone(),
        config,
    });

    info!("Bot initialized, starting dispatcher");

    Dispatcher::builder(bot, build_handler())
        .dependencies(dptree::deps![context])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    // Save whatever is still waiting for its debounce timer
    intake.flush_all().await;
    info!("Bot stopped");

    Ok(())
}
