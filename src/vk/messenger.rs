//! Outbound messages through a community token

use super::api::{read_body, VkApi};
use super::types::{ButtonJson, KeyboardJson, SavedPhoto, TextAction, UploadServer, UploadedPhoto};
use super::VkError;
use crate::error::CollaboratorError;
use crate::runtime::Messenger;
use crate::state_machine::reply::{ButtonColor, Keyboard};
use crate::state_machine::OutgoingMessage;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

pub struct VkMessenger {
    api: VkApi,
}

impl VkMessenger {
    /// `api` must carry a community token
    pub fn new(api: VkApi) -> Self {
        Self { api }
    }

    /// Download a photo and re-upload it as a message attachment
    async fn upload_photo(&self, user_id: i64, url: &str) -> Result<String, VkError> {
        let bytes = self.api.client().get(url).send().await?.error_for_status()?.bytes().await?;

        let server: UploadServer = self
            .api
            .call("photos.getMessagesUploadServer", &[("peer_id", user_id.to_string())])
            .await?;

        let part = Part::bytes(bytes.to_vec())
            .file_name("photo.jpg")
            .mime_str("image/jpeg")?;
        let response = self
            .api
            .client()
            .post(&server.upload_url)
            .multipart(Form::new().part("photo", part))
            .send()
            .await?;
        let body = read_body(response).await?;
        let uploaded: UploadedPhoto = serde_json::from_str(&body)
            .map_err(|e| VkError::Decode(format!("{e} - body: {body}")))?;

        let saved: Vec<SavedPhoto> = self
            .api
            .call(
                "photos.saveMessagesPhoto",
                &[
                    ("server", uploaded.server.to_string()),
                    ("photo", uploaded.photo),
                    ("hash", uploaded.hash),
                ],
            )
            .await?;

        saved
            .first()
            .map(SavedPhoto::attachment)
            .ok_or_else(|| VkError::Decode("saveMessagesPhoto returned no photos".to_string()))
    }
}

#[async_trait]
impl Messenger for VkMessenger {
    async fn send(&self, user_id: i64, message: &OutgoingMessage) -> Result<(), CollaboratorError> {
        let mut attachments = message.attachments.clone();
        for url in &message.photo_urls {
            match self.upload_photo(user_id, url).await {
                Ok(attachment) => attachments.push(attachment),
                Err(e) => tracing::warn!(user_id, url = %url, error = %e, "Skipping photo"),
            }
        }

        let mut params = vec![
            ("user_id", user_id.to_string()),
            ("random_id", rand::random::<i32>().to_string()),
            ("message", message.text.clone()),
        ];
        if let Some(keyboard) = &message.keyboard {
            params.push(("keyboard", keyboard_json(keyboard)?));
        }
        if !attachments.is_empty() {
            params.push(("attachment", attachments.join(",")));
        }

        let _message_id: i64 = self.api.call("messages.send", &params).await?;
        Ok(())
    }
}

fn keyboard_json(keyboard: &Keyboard) -> Result<String, CollaboratorError> {
    let json = KeyboardJson {
        one_time: keyboard.one_time,
        buttons: keyboard
            .rows
            .iter()
            .filter(|row| !row.is_empty())
            .map(|row| {
                row.iter()
                    .map(|button| ButtonJson {
                        action: TextAction {
                            kind: "text",
                            label: &button.label,
                        },
                        color: match button.color {
                            ButtonColor::Primary => "primary",
                            ButtonColor::Negative => "negative",
                        },
                    })
                    .collect()
            })
            .collect(),
    };
    serde_json::to_string(&json).map_err(|e| CollaboratorError::decode(e.to_string()))
}
