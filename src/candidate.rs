//! Candidate profiles returned by search

use serde::{Deserialize, Serialize};

/// Placeholder for missing name parts
pub const UNKNOWN_NAME: &str = "Неизвестно";

/// Maximum number of photos attached to a candidate
pub const MAX_PHOTOS: usize = 3;

/// A discovered profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub vk_id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Top-ranked photo URLs, best first
    #[serde(default)]
    pub photos: Vec<String>,
}

impl Candidate {
    pub fn new(
        vk_id: i64,
        first_name: Option<String>,
        last_name: Option<String>,
        photos: Vec<String>,
    ) -> Self {
        Self {
            vk_id,
            first_name: first_name
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            last_name: last_name
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            photos: photos.into_iter().take(MAX_PHOTOS).collect(),
        }
    }

    pub fn profile_url(&self) -> String {
        format!("https://vk.com/id{}", self.vk_id)
    }

    /// Message body describing this candidate
    pub fn card_text(&self) -> String {
        let mut text = format!(
            "{} {}\nПрофиль: {}\n",
            self.first_name,
            self.last_name,
            self.profile_url()
        );
        if self.photos.is_empty() {
            text.push_str("Нет доступных фотографий.");
        }
        text
    }
}
