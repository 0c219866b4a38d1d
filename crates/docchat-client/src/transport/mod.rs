use async_trait::async_trait;
use docchat_types::{ChatReply, Query};

use crate::error::TransportError;

pub mod http;
pub mod socket;

pub use http::HttpTransport;
pub use socket::{ConnectionState, SocketConnection, SocketConnector, SocketTransport};

/// Exchange of a query for a reply with the chat backend
#[async_trait(?Send)]
pub trait Transport {
    /// Send one query and wait for its reply
    async fn exchange(&self, query: &Query) -> Result<ChatReply, TransportError>;

    /// Ask the backend to forget the conversation behind `session_id`
    async fn clear_remote(&self, session_id: Option<&str>) -> Result<(), TransportError>;

    /// Release any connection held by the transport
    async fn shutdown(&self) {}

    /// Send one query; failures come back as a fallback reply, never as an error
    async fn ask(&self, query: &Query) -> ChatReply {
        match self.exchange(query).await {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("Chat exchange failed: {}", e);
                ChatReply::new(e.fallback_text())
            }
        }
    }
}

#[async_trait(?Send)]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn exchange(&self, query: &Query) -> Result<ChatReply, TransportError> {
        (**self).exchange(query).await
    }

    async fn clear_remote(&self, session_id: Option<&str>) -> Result<(), TransportError> {
        (**self).clear_remote(session_id).await
    }

    async fn shutdown(&self) {
        (**self).shutdown().await
    }

    async fn ask(&self, query: &Query) -> ChatReply {
        (**self).ask(query).await
    }
}
