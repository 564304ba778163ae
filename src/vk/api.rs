//! Thin VK method-call client

use super::types::Envelope;
use super::VkError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.vk.com/method";

/// Long poll holds requests open for up to 25 seconds
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Authenticated VK API client for one access token
#[derive(Clone)]
pub struct VkApi {
    client: Client,
    token: String,
    version: String,
    base_url: String,
}

impl VkApi {
    pub fn new(token: impl Into<String>, version: impl Into<String>) -> Result<Self, VkError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            token: token.into(),
            version: version.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Call `method` and unwrap its `response` field
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T, VkError> {
        let url = format!("{}/{method}", self.base_url);
        let mut form: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 2);
        form.push(("access_token", &self.token));
        form.push(("v", &self.version));
        form.extend(params.iter().map(|(name, value)| (*name, value.as_str())));

        let response = self.client.post(&url).form(&form).send().await?;

        let body = read_body(response).await?;
        tracing::debug!(method, "VK method call completed");
        decode_envelope(&body)
    }
}

/// Body of a successful HTTP response
pub(super) async fn read_body(response: reqwest::Response) -> Result<String, VkError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(VkError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

pub(super) fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, VkError> {
    let envelope: Envelope<T> = serde_json::from_str(body)
        .map_err(|e| VkError::Decode(format!("{e} - body: {body}")))?;

    match (envelope.response, envelope.error) {
        (_, Some(error)) => Err(VkError::Api {
            code: error.error_code,
            message: error.error_msg,
        }),
        (Some(response), None) => Ok(response),
        (None, None) => Err(VkError::Decode(format!("missing response - body: {body}"))),
    }
}
