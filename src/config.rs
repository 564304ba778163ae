//! Bot configuration from environment variables

use crate::vk::DEFAULT_SEARCH_COUNT;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_VERSION: &str = "5.199";
const DEFAULT_IDLE_SECS: u64 = 30 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Community token: long poll and replies
    pub group_token: String,
    /// User token: `users.search` and `photos.get`
    pub user_token: String,
    pub group_id: i64,
    pub api_version: String,
    pub db_path: PathBuf,
    pub search_count: u32,
    pub session_idle: Duration,
    /// Attachment id sent with the greeting, e.g. `photo-123_456`
    pub banner_attachment: Option<String>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let db_path = var("VKINDER_DB_PATH").map_or_else(
            || {
                let home = var("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".vkinder").join("vkinder.db")
            },
            PathBuf::from,
        );

        Ok(Self {
            group_token: required("VK_GROUP_TOKEN")?,
            user_token: required("VK_USER_TOKEN")?,
            group_id: parse(required("VK_GROUP_ID")?, "VK_GROUP_ID")?,
            api_version: var("VK_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            db_path,
            search_count: var("VKINDER_SEARCH_COUNT")
                .map(|v| parse(v, "VKINDER_SEARCH_COUNT"))
                .transpose()?
                .unwrap_or(DEFAULT_SEARCH_COUNT),
            session_idle: Duration::from_secs(idle_secs(var("VKINDER_SESSION_IDLE_SECS"))?),
            banner_attachment: var("VKINDER_BANNER_ATTACHMENT"),
        })
    }
}

/// A zero timeout would retire every session before its second message
fn idle_secs(value: Option<String>) -> Result<u64, ConfigError> {
    let Some(value) = value else {
        return Ok(DEFAULT_IDLE_SECS);
    };
    match parse(value.clone(), "VKINDER_SESSION_IDLE_SECS")? {
        0 => Err(ConfigError::Invalid {
            name: "VKINDER_SESSION_IDLE_SECS",
            value,
        }),
        secs => Ok(secs),
    }
}

fn parse<T: std::str::FromStr>(value: String, name: &'static str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
