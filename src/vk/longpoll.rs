//! Bots Long Poll receiver

use super::api::{read_body, VkApi};
use super::types::{LongPollResponse, LongPollServer, NewMessage};
use super::VkError;
use crate::error::CollaboratorError;
use crate::runtime::{Inbound, InboundSource};
use async_trait::async_trait;

const WAIT_SECS: &str = "25";

/// Group chats have peer ids above this offset
const CHAT_PEER_OFFSET: i64 = 2_000_000_000;

pub struct LongPoll {
    api: VkApi,
    group_id: i64,
    server: Option<LongPollServer>,
}

impl LongPoll {
    /// `api` must carry a community token
    pub fn new(api: VkApi, group_id: i64) -> Self {
        Self {
            api,
            group_id,
            server: None,
        }
    }

    async fn fetch_server(&self) -> Result<LongPollServer, VkError> {
        let server: LongPollServer = self
            .api
            .call("groups.getLongPollServer", &[("group_id", self.group_id.to_string())])
            .await?;
        tracing::info!(server = %server.server, "Long poll server acquired");
        Ok(server)
    }

    async fn poll(&mut self) -> Result<Vec<Inbound>, VkError> {
        let server = match &self.server {
            Some(server) => server.clone(),
            None => {
                let server = self.fetch_server().await?;
                self.server = Some(server.clone());
                server
            }
        };

        let response = self
            .api
            .client()
            .get(&server.server)
            .query(&[
                ("act", "a_check"),
                ("key", server.key.as_str()),
                ("ts", server.ts.as_str()),
                ("wait", WAIT_SECS),
            ])
            .send()
            .await?;
        let body = read_body(response).await?;
        let response: LongPollResponse = serde_json::from_str(&body)
            .map_err(|e| VkError::Decode(format!("{e} - body: {body}")))?;

        let (next, batch) = apply_response(server, response);
        self.server = next;
        Ok(batch)
    }
}

/// Next server state and the messages carried by one poll response.
/// `None` means the server must be requested again.
fn apply_response(
    mut server: LongPollServer,
    response: LongPollResponse,
) -> (Option<LongPollServer>, Vec<Inbound>) {
    match response.failed {
        // History outdated: continue from the provided ts
        Some(1) => {
            if let Some(ts) = response.ts {
                server.ts = ts;
            }
            tracing::debug!("Long poll history outdated");
            (Some(server), Vec::new())
        }
        // Key expired or information lost
        Some(code) => {
            tracing::info!(code, "Long poll session expired");
            (None, Vec::new())
        }
        None => {
            if let Some(ts) = response.ts {
                server.ts = ts;
            }
            let batch = response
                .updates
                .into_iter()
                .filter(|u| u.kind == "message_new")
                .filter_map(|u| match serde_json::from_value::<NewMessage>(u.object) {
                    Ok(new) => Some(new.message),
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping malformed message_new");
                        None
                    }
                })
                .filter(|m| m.peer_id < CHAT_PEER_OFFSET)
                .map(|m| Inbound {
                    user_id: m.from_id,
                    text: m.text,
                })
                .collect();
            (Some(server), batch)
        }
    }
}

#[async_trait]
impl InboundSource for LongPoll {
    async fn next_batch(&mut self) -> Result<Vec<Inbound>, CollaboratorError> {
        Ok(self.poll().await?)
    }
}
