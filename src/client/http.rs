use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use std::fmt::Debug;
use std::time::Duration;
use url::Url;

use crate::core::api::{
    Acknowledgement, ApiEnvelope, ChatReply, ChatRequest, CreatedSession, EmptyRequest,
    SessionIdRequest, SessionList, SessionMessages, ToolList,
};
use serde_json::Value;
use crate::core::{ApiResult, Config, FailureReason, Message};

/// HTTP client for the chat backend. One method per endpoint; no retries.
#[derive(Debug, Clone)]
pub struct ChatClient {
    base_url: Url,
    client: Client,
}

impl ChatClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| anyhow!("Invalid backend URL '{}': {}", base_url, e))?;
        // Url::join replaces the last path segment unless the base ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.backend.base_url, config.backend.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| FailureReason::Network(format!("Invalid endpoint '{}': {}", path, e)))
    }

    /// Check if the backend answers on its root endpoint
    pub async fn is_server_running(&self) -> bool {
        let Ok(url) = self.endpoint("") else {
            return false;
        };
        match self
            .client
            .get(url)
            .timeout(Duration::from_secs(2))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Backend probe failed: {}", e);
                false
            }
        }
    }

    /// Fetch all sessions plus the server's current-session hint
    pub async fn list_sessions(&self) -> ApiResult<SessionList> {
        self.post("sessions/list", &EmptyRequest::default())
            .await?
            .into_body("Failed to list sessions")
    }

    /// Fetch the stored messages of one session
    pub async fn get_session(&self, session_id: &str) -> ApiResult<Vec<Message>> {
        let body: SessionMessages = self
            .post("sessions/get", &SessionIdRequest { session_id })
            .await?
            .into_body("Failed to load session")?;
        Ok(body.messages)
    }

    /// Tell the backend which session the user is looking at. Any 2xx counts
    /// as success; the reply body is not read.
    pub async fn set_current_session(&self, session_id: &str) -> ApiResult<()> {
        let path = "sessions/set_current";
        let url = self.endpoint(path)?;
        tracing::debug!("POST /{} session_id: {}", path, session_id);

        let response = self
            .client
            .post(url)
            .json(&SessionIdRequest { session_id })
            .send()
            .await?;
        Self::check_status(path, response).await?;
        Ok(())
    }

    /// Allocate a new session and return its id
    pub async fn create_session(&self) -> ApiResult<String> {
        let created: CreatedSession = self
            .post("sessions/create", &EmptyRequest::default())
            .await?
            .into_body("Failed to create session")?;
        Ok(created.session_id)
    }

    pub async fn delete_session(&self, session_id: &str) -> ApiResult<()> {
        self.post("sessions/delete", &SessionIdRequest { session_id })
            .await?
            .into_body::<Acknowledgement>("Failed to delete session")?;
        Ok(())
    }

    /// Send the full conversation and wait for the assistant's reply
    pub async fn chat(&self, messages: &[Message], session_id: Option<&str>) -> ApiResult<ChatReply> {
        let request = ChatRequest {
            messages,
            stream: false,
            session_id,
        };
        let reply: ChatReply = self
            .post("chat", &request)
            .await?
            .into_body("Chat request failed")?;

        if let Some(tool_calls) = &reply.tool_calls {
            tracing::debug!("Chat reply carried {} tool calls", tool_calls.len());
        }
        Ok(reply)
    }

    /// Ask the backend to start over in a fresh session
    pub async fn clear_history(&self) -> ApiResult<String> {
        let created: CreatedSession = self
            .post("clear_history", &EmptyRequest::default())
            .await?
            .into_body("Failed to clear history")?;
        Ok(created.session_id)
    }

    pub async fn list_tools(&self) -> ApiResult<Vec<Value>> {
        let url = self.endpoint("tools")?;
        tracing::debug!("Making GET request to: {}", url);

        let response = self.client.get(url).send().await?;
        let list: ToolList = Self::decode("tools", response)
            .await?
            .into_body("Failed to list tools")?;
        Ok(list.tools)
    }

    async fn post<B>(&self, path: &str, body: &B) -> ApiResult<ApiEnvelope>
    where
        B: Serialize + Debug,
    {
        let url = self.endpoint(path)?;
        tracing::debug!("POST /{} request body: {:?}", path, body);

        let response = self.client.post(url).json(body).send().await?;
        Self::decode(path, response).await
    }

    async fn decode(path: &str, response: reqwest::Response) -> ApiResult<ApiEnvelope> {
        let response = Self::check_status(path, response).await?;
        let response_text = response.text().await?;
        let body: Value = serde_json::from_str(&response_text)
            .map_err(|e| FailureReason::Decode(format!("Failed to parse /{} response: {}", path, e)))?;
        Ok(ApiEnvelope::new(body))
    }

    async fn check_status(path: &str, response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();
        tracing::debug!("/{} response status: {}", path, status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!("/{} failed with status {}: {}", path, status, error_text);
            return Err(FailureReason::Http {
                status: status.as_u16(),
                body: error_text,
            });
        }
        Ok(response)
    }
}
