//! HTTP transport over `reqwest`.

use async_trait::async_trait;
use chat_wizard_core::{
    Transport, TransportError,
    protocol::{AvailabilityResponse, ChatRequest, ChatResponse, StepRequest, StepResponse},
};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;

/// Transport that talks JSON to the chat server.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Create a transport for `config`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request)
            .connect_timeout(config.timeouts.connect)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, TransportError>
    where
        B: serde::Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.config.url(path);
        tracing::debug!(%url, "POST");
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        decode(resp).await
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, TransportError> {
        let url = self.config.url(path);
        tracing::debug!(%url, "GET");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        decode(resp).await
    }
}

async fn decode<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, TransportError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
        });
    }
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| TransportError::Request(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError> {
        self.post(&self.config.endpoints.chat, request).await
    }

    async fn appointment_step(
        &self,
        request: &StepRequest,
    ) -> Result<StepResponse, TransportError> {
        self.post(&self.config.endpoints.step, request).await
    }

    async fn availability(&self) -> Result<AvailabilityResponse, TransportError> {
        let resp: AvailabilityResponse = self.get(&self.config.endpoints.availability).await?;
        if resp.is_success() {
            Ok(resp)
        } else {
            Err(TransportError::Rejected(resp.status))
        }
    }
}
