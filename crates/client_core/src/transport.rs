use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::{
    domain::ModelInfo,
    error::error_message_from_body,
    protocol::{models_route, ChatPayload, ChatReply, ChatResponse, MultiChatResponse},
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{config::ClientSettings, error::ChatError, recovery};

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_chat(&self, payload: &ChatPayload) -> Result<ChatReply, ChatError>;
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ChatError>;
}

pub struct HttpTransport {
    http: Client,
    api_base: String,
}

impl HttpTransport {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_base)
    }

    pub fn with_client(http: Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let api_base = settings.api_base_url()?;
        let mut builder = Client::builder();
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().context("failed to build chat http client")?;
        Ok(Self::with_client(http, api_base.as_str()))
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}{route}", self.api_base)
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send_chat(&self, payload: &ChatPayload) -> Result<ChatReply, ChatError> {
        let url = self.endpoint(payload.route());
        debug!("chat: POST {url}");
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|err| recovery::classify_reqwest_error(&err))?;

        match payload {
            ChatPayload::Single(_) => decode::<ChatResponse>(response).await.map(ChatReply::Single),
            ChatPayload::Multi(_) => decode::<MultiChatResponse>(response)
                .await
                .map(ChatReply::Multi),
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ChatError> {
        let url = self.endpoint(models_route());
        debug!("chat: GET {url}");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| recovery::classify_reqwest_error(&err))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ChatError> {
    let status = response.status();
    if !status.is_success() {
        let fallback = status.canonical_reason().unwrap_or("request failed");
        let message = match response.bytes().await {
            Ok(body) => error_message_from_body(&String::from_utf8_lossy(&body)),
            Err(err) => {
                debug!("chat: unreadable error body status={status} err={err}");
                None
            }
        };
        return Err(ChatError::Api {
            status: status.as_u16(),
            message: message.unwrap_or_else(|| fallback.to_string()),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|err| recovery::classify_reqwest_error(&err))?;
    serde_json::from_slice(&body).map_err(|err| recovery::malformed_body(&err))
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
