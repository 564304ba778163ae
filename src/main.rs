//! VKinder - matchmaking bot for VK communities
//!
//! Walks each user through a short dialogue (city, gender, age), searches
//! matching profiles and lets the user browse them and keep favorites.

mod candidate;
mod config;
mod criteria;
mod cursor;
mod db;
mod error;
mod favorites;
mod runtime;
mod state_machine;
mod vk;

use config::BotConfig;
use db::Database;
use runtime::{DatabaseStorage, DispatchSettings, Dispatcher};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vk::{LongPoll, VkApi, VkMessenger, VkSearch};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vkinder=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = BotConfig::from_env()?;

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let group_api = VkApi::new(&config.group_token, &config.api_version)?;
    let user_api = VkApi::new(&config.user_token, &config.api_version)?;

    let dispatcher = Dispatcher::new(
        VkMessenger::new(group_api.clone()),
        VkSearch::new(user_api, config.search_count),
        DatabaseStorage::new(db),
        DispatchSettings {
            idle_timeout: config.session_idle,
            banner_attachment: config.banner_attachment.clone(),
        },
    );

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        tracing::info!("Shutdown requested");
        on_signal.cancel();
    });

    tracing::info!(group_id = config.group_id, "VKinder bot started");
    dispatcher
        .run(LongPoll::new(group_api, config.group_id), shutdown)
        .await;

    Ok(())
}
