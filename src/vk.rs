//! VK adapters for the runtime collaborator traits
//!
//! `LongPoll` receives messages through the Bots Long Poll API, `VkMessenger`
//! replies with keyboards and photos, and `VkSearch` looks up candidates with a
//! user token.

mod api;
mod longpoll;
mod messenger;
mod search;
mod types;

pub use api::VkApi;
pub use longpoll::LongPoll;
pub use messenger::VkMessenger;
pub use search::{VkSearch, DEFAULT_SEARCH_COUNT};

use crate::error::CollaboratorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VkError {
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("VK API error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Request URLs carry the long poll key, so they never reach error text
impl From<reqwest::Error> for VkError {
    fn from(err: reqwest::Error) -> Self {
        VkError::Http(err.without_url())
    }
}

impl From<VkError> for CollaboratorError {
    fn from(err: VkError) -> Self {
        let message = err.to_string();
        match err {
            VkError::Http(_) | VkError::Status { .. } => CollaboratorError::network(message),
            VkError::Api { .. } => CollaboratorError::api(message),
            VkError::Decode(_) => CollaboratorError::decode(message),
        }
    }
}
