use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use docchat_types::{ChatReply, ChatRequest, ChatResponse, ClearRequest, Query};

use crate::config::{ClientConfig, DEFAULT_CLEAR_TIMEOUT, DEFAULT_QUERY_TIMEOUT};
use crate::error::TransportError;
use crate::timer::{with_timeout, Timer};
use crate::transport::Transport;

/// Request/response transport: one `POST` per query, no retries
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timer: Rc<dyn Timer>,
    query_timeout: Duration,
    clear_timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timer: Rc<dyn Timer>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timer,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            clear_timeout: DEFAULT_CLEAR_TIMEOUT,
        }
    }

    pub fn from_config(config: &ClientConfig, timer: Rc<dyn Timer>) -> Self {
        Self::new(config.endpoint.trim(), timer).with_timeouts(config.query_timeout, config.clear_timeout)
    }

    pub fn with_timeouts(mut self, query_timeout: Duration, clear_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self.clear_timeout = clear_timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post_chat(&self, body: &ChatRequest) -> Result<ChatReply, TransportError> {
        let response = self.client.post(self.url("chat")).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        log::debug!("Chat response body: {}", text);

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| TransportError::Malformed(e.to_string()))?;
        Ok(parsed.into())
    }

    async fn post_clear(&self, body: &ClearRequest) -> Result<(), TransportError> {
        let response = self.client.post(self.url("clear")).json(body).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status(status.as_u16()))
        }
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn exchange(&self, query: &Query) -> Result<ChatReply, TransportError> {
        let body = ChatRequest::from(query);
        log::debug!("POST {} ({} chars)", self.url("chat"), body.content.len());

        with_timeout(self.timer.as_ref(), self.query_timeout, self.post_chat(&body)).await?
    }

    async fn clear_remote(&self, session_id: Option<&str>) -> Result<(), TransportError> {
        let body = ClearRequest {
            session_id: session_id.map(str::to_string),
        };
        log::debug!("POST {}", self.url("clear"));

        with_timeout(self.timer.as_ref(), self.clear_timeout, self.post_clear(&body)).await?
    }
}
