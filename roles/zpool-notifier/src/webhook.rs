use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;

/// JSON body accepted by Discord-style webhooks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Status and body returned by the webhook endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

impl WebhookResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub struct WebhookClient {
    client: reqwest::Client,
}

impl WebhookClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// POST the payload as JSON. Any HTTP status is returned to the caller;
    /// only transport failures are errors.
    pub async fn post(&self, url: &str, payload: &WebhookPayload) -> Result<WebhookResponse, ApiError> {
        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("Webhook responded with {}", status);
        Ok(WebhookResponse { status, body })
    }
}
