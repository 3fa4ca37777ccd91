use crate::config::{AccessToken, NotifierConfig, DEFAULT_LINE_API_BASE};
use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;

const BROADCAST_PATH: &str = "/v2/bot/message/broadcast";
const REQUEST_ID_HEADER: &str = "x-line-request-id";

/// Sends a text message to every friend of a LINE official account through
/// the Messaging API broadcast endpoint.
pub struct LineNotifier {
    client: Client,
    access_token: AccessToken,
    api_base: String,
}

impl LineNotifier {
    pub fn new(access_token: AccessToken) -> Result<Self> {
        Self::with_config(
            access_token,
            &NotifierConfig {
                api_base: DEFAULT_LINE_API_BASE.to_string(),
                request_timeout: Duration::from_secs(10),
            },
        )
    }

    pub fn with_config(access_token: AccessToken, config: &NotifierConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(LineNotifier {
            client,
            access_token,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn broadcast_url(&self) -> String {
        format!("{}{}", self.api_base, BROADCAST_PATH)
    }

    fn create_payload(&self, message: &str) -> serde_json::Value {
        json!({
            "messages": [
                { "type": "text", "text": message }
            ]
        })
    }
}

#[async_trait]
impl NotifierPlugin for LineNotifier {
    fn name(&self) -> &str {
        "LINE Broadcast Notifier"
    }

    fn plugin_type(&self) -> &str {
        "line"
    }

    async fn notify(&self, message: &str) -> Result<NotificationResult> {
        let response = self
            .client
            .post(self.broadcast_url())
            .bearer_auth(self.access_token.expose())
            .json(&self.create_payload(message))
            .send()
            .await?;

        let status = response.status();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if status == StatusCode::OK {
            return Ok(NotificationResult::delivered(request_id));
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %body, "LINE broadcast rejected");

        Ok(NotificationResult::rejected(format!("HTTP {}: {}", status.as_u16(), body)))
    }
}
