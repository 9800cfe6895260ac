use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;

const BUTTON_SECRET_HEADER: &str = "x-button-secret";

/// Plays the public site: posts events to the relay's ingress endpoint.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiClient {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub async fn post_event(
        &self,
        secret: Option<&str>,
        origin: Option<&str>,
        payload: &Value,
    ) -> Result<ApiResponse> {
        let url = format!("{}/api/event", self.base_url);

        let mut request = self.client.post(&url).json(payload);
        if let Some(secret) = secret {
            request = request.header(BUTTON_SECRET_HEADER, secret);
        }
        if let Some(origin) = origin {
            request = request.header("Origin", origin);
        }

        let response = request.send().await.context("Failed to post event")?;
        Self::into_api_response(response).await
    }

    /// Opens the event stream with the given origin and reports only the status code.
    pub async fn probe_stream(&self, origin: &str) -> Result<StatusCode> {
        let url = format!("{}/sse", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Origin", origin)
            .send()
            .await
            .context("Failed to open event stream")?;

        Ok(response.status())
    }

    async fn into_api_response(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(ApiResponse { status, body })
    }
}
