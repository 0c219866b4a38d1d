use serde::{Deserialize, Serialize};

use crate::{ChatReply, Query, SessionId};

// ============================================================================
// HTTP payloads
// ============================================================================

/// Body of `POST {base}/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub session_id: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub current_url: Option<String>,
}

impl From<&Query> for ChatRequest {
    fn from(query: &Query) -> Self {
        Self {
            content: query.text.clone(),
            session_id: query.session_id.clone(),
            current_url: query.current_url.clone(),
        }
    }
}

/// Body returned by `POST {base}/chat`
///
/// Older backends answer with `content` instead of `response`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(alias = "content")]
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub session_id: Option<SessionId>,
}

impl From<ChatResponse> for ChatReply {
    fn from(response: ChatResponse) -> Self {
        ChatReply::new(response.response).with_session(response.session_id)
    }
}

/// Body of `POST {base}/clear`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearRequest {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub session_id: Option<SessionId>,
}

// ============================================================================
// Socket frames
// ============================================================================

/// Frames sent from client to server over the socket (JSON framing)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    AskQuery {
        query: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        request_id: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        session_id: Option<SessionId>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        current_url: Option<String>,
    },
    ClearHistory {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        session_id: Option<SessionId>,
    },
}

impl ClientFrame {
    pub fn ask(query: &Query, request_id: u64) -> Self {
        ClientFrame::AskQuery {
            query: query.text.clone(),
            request_id: Some(request_id),
            session_id: query.session_id.clone(),
            current_url: query.current_url.clone(),
        }
    }
}

/// Frames sent from server to client over the socket (JSON framing)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFrame {
    #[serde(alias = "content")]
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub request_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub session_id: Option<SessionId>,
}

impl From<ServerFrame> for ChatReply {
    fn from(frame: ServerFrame) -> Self {
        ChatReply::new(frame.response).with_session(frame.session_id)
    }
}
