//! Transport abstraction for opening chat streams

use async_trait::async_trait;
use pilot_client::{AgentClient, ByteStream, ChatRequest, Result};

/// Opens the response stream for one chat message
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Issue the request and return the raw body once the backend has
    /// answered with a success status.
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream>;
}

/// Transport backed by the HTTP chat endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: AgentClient,
}

impl HttpTransport {
    pub fn new(client: AgentClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream> {
        self.client.open_chat_stream(request).await
    }
}
