//! Core types for docchat
//!
//! This crate provides the message model, the unified reply contract and the
//! user-facing fallback strings shared by every docchat crate.

use serde::{Deserialize, Serialize};

pub mod protocol;

pub use protocol::*;

// ============================================================================
// Constants
// ============================================================================

/// Default name of the local chat database
pub const DEFAULT_DATABASE_NAME: &str = "ROCmChatDB";

/// Banner shown when there is no history to replay
pub const DEFAULT_WELCOME_HTML: &str =
    "<p>Welcome to the ROCm Documentation!</p><p>How can I assist you today?</p>";

/// Placeholder rendered while a reply is outstanding
pub const DEFAULT_PENDING_HTML: &str = "<p>Awaiting...</p>";

/// Static replies that stand in for an answer when the transport fails
pub mod fallback {
    pub const NETWORK_FAILURE: &str = "Sorry, the server could not be reached.";
    pub const SERVER_ERROR: &str = "Sorry, the server returned an error.";
    pub const MALFORMED_RESPONSE: &str = "Sorry, the server response could not be processed.";
    pub const TIMEOUT: &str = "Sorry, the server took too long to respond.";
    pub const SOCKET_CLOSED: &str = "Sorry, the server could not be reached.";
    pub const SOCKET_UNAVAILABLE: &str = "Sorry, the chat service is currently unavailable.";
}

// ============================================================================
// Messages
// ============================================================================

/// Session ID type (opaque token issued by the backend)
pub type SessionId = String;

/// Direction of a chat message, seen from the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Outgoing,
    Incoming,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Outgoing => "outgoing",
            Role::Incoming => "incoming",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub role: Role,
    /// Rendered HTML content
    #[serde(rename = "message")]
    pub content: String,
}

impl Message {
    pub fn outgoing(content: impl Into<String>) -> Self {
        Self {
            role: Role::Outgoing,
            content: content.into(),
        }
    }

    pub fn incoming(content: impl Into<String>) -> Self {
        Self {
            role: Role::Incoming,
            content: content.into(),
        }
    }
}

/// A message as persisted in the history log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: u64,
    #[serde(flatten)]
    pub message: Message,
}

// ============================================================================
// Exchange
// ============================================================================

/// A reader's question as handed to a transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub session_id: Option<SessionId>,
    pub current_url: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session_id: Option<SessionId>) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_url(mut self, current_url: Option<String>) -> Self {
        self.current_url = current_url;
        self
    }
}

/// The answer to a query, whatever transport produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub session_id: Option<SessionId>,
}

impl ChatReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: Option<SessionId>) -> Self {
        self.session_id = session_id;
        self
    }
}
