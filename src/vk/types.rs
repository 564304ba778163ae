//! VK API wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every method call answers with either `response` or `error`
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub response: Option<T>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error_code: i64,
    pub error_msg: String,
}

// ============================================================================
// Long Poll
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LongPollServer {
    pub key: String,
    pub server: String,
    #[serde(deserialize_with = "de_ts")]
    pub ts: String,
}

#[derive(Debug, Deserialize)]
pub struct LongPollResponse {
    #[serde(default, deserialize_with = "de_opt_ts")]
    pub ts: Option<String>,
    #[serde(default)]
    pub updates: Vec<Update>,
    pub failed: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub object: Value,
}

#[derive(Debug, Deserialize)]
pub struct NewMessage {
    pub message: PrivateMessage,
}

#[derive(Debug, Deserialize)]
pub struct PrivateMessage {
    pub from_id: i64,
    pub peer_id: i64,
    #[serde(default)]
    pub text: String,
}

/// `ts` arrives as a string from some endpoints and as a number from others
fn de_ts<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unexpected ts: {other}"))),
    }
}

fn de_opt_ts<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    de_ts(deserializer).map(Some)
}

// ============================================================================
// Users and photos
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ItemList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct VkUser {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub sex: u8,
}

#[derive(Debug, Deserialize)]
pub struct VkPhoto {
    #[serde(default)]
    pub sizes: Vec<PhotoSize>,
    pub likes: Option<Likes>,
}

#[derive(Debug, Deserialize)]
pub struct PhotoSize {
    pub url: String,
    #[serde(default)]
    pub width: u64,
    #[serde(default)]
    pub height: u64,
}

#[derive(Debug, Deserialize)]
pub struct Likes {
    pub count: u64,
}

// ============================================================================
// Message photo upload
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UploadServer {
    pub upload_url: String,
}

/// Raw answer of the upload host; not wrapped in an envelope
#[derive(Debug, Deserialize)]
pub struct UploadedPhoto {
    pub server: i64,
    pub photo: String,
    pub hash: String,
}

#[derive(Debug, Deserialize)]
pub struct SavedPhoto {
    pub id: i64,
    pub owner_id: i64,
    pub access_key: Option<String>,
}

impl SavedPhoto {
    pub fn attachment(&self) -> String {
        match &self.access_key {
            Some(key) => format!("photo{}_{}_{key}", self.owner_id, self.id),
            None => format!("photo{}_{}", self.owner_id, self.id),
        }
    }
}

// ============================================================================
// Keyboard
// ============================================================================

#[derive(Debug, Serialize)]
pub struct KeyboardJson<'a> {
    pub one_time: bool,
    pub buttons: Vec<Vec<ButtonJson<'a>>>,
}

#[derive(Debug, Serialize)]
pub struct ButtonJson<'a> {
    pub action: TextAction<'a>,
    pub color: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TextAction<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: &'a str,
}
