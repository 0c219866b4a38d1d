use std::time::Duration;

use docchat_types::{DEFAULT_DATABASE_NAME, DEFAULT_PENDING_HTML, DEFAULT_WELCOME_HTML};

use crate::error::ConfigError;

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CLEAR_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_SOCKET_REPLY_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// How queries reach the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// One `POST` per query
    Http,
    /// One shared, reconnecting socket
    Socket,
}

impl TransportKind {
    /// Pick the transport from the endpoint scheme
    pub fn infer(endpoint: &str) -> Self {
        let lower = endpoint.trim().to_ascii_lowercase();
        if lower.starts_with("ws://") || lower.starts_with("wss://") {
            TransportKind::Socket
        } else {
            TransportKind::Http
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "http" | "https" | "fetch" => Some(TransportKind::Http),
            "socket" | "ws" | "websocket" => Some(TransportKind::Socket),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Http => "http",
            TransportKind::Socket => "socket",
        }
    }
}

/// Encoding of frames on the socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketFraming {
    /// Raw query text out, raw reply text in
    Text,
    /// `ask_query` / `clear_history` objects out, `{response}` objects in
    Json,
}

/// How reply text is turned into HTML
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    /// The backend already answers with HTML
    Html,
    Markdown,
}

/// Configuration for a chat client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for HTTP, socket URL for the socket transport
    pub endpoint: String,
    pub transport: TransportKind,
    pub framing: SocketFraming,
    pub query_timeout: Duration,
    pub clear_timeout: Duration,
    /// `None` waits for a socket reply forever
    pub socket_reply_timeout: Option<Duration>,
    pub reconnect_delay: Duration,
    pub database_name: String,
    pub welcome_html: String,
    pub pending_html: String,
    pub reply_format: ReplyFormat,
}

impl ClientConfig {
    /// Create a configuration with defaults, inferring the transport from the endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let transport = TransportKind::infer(&endpoint);
        Self {
            endpoint,
            transport,
            framing: SocketFraming::Json,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            clear_timeout: DEFAULT_CLEAR_TIMEOUT,
            socket_reply_timeout: Some(DEFAULT_SOCKET_REPLY_TIMEOUT),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            welcome_html: DEFAULT_WELCOME_HTML.to_string(),
            pending_html: DEFAULT_PENDING_HTML.to_string(),
            reply_format: ReplyFormat::Html,
        }
    }

    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_framing(mut self, framing: SocketFraming) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_clear_timeout(mut self, timeout: Duration) -> Self {
        self.clear_timeout = timeout;
        self
    }

    pub fn with_socket_reply_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.socket_reply_timeout = timeout;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    pub fn with_welcome_html(mut self, html: impl Into<String>) -> Self {
        self.welcome_html = html.into();
        self
    }

    pub fn with_reply_format(mut self, format: ReplyFormat) -> Self {
        self.reply_format = format;
        self
    }

    /// Check that the configuration can produce a working client
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        if self.database_name.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseName);
        }

        let lower = endpoint.to_ascii_lowercase();
        let scheme_ok = match self.transport {
            TransportKind::Http => lower.starts_with("http://") || lower.starts_with("https://"),
            TransportKind::Socket => lower.starts_with("ws://") || lower.starts_with("wss://"),
        };
        if !scheme_ok {
            return Err(ConfigError::SchemeMismatch {
                endpoint: self.endpoint.clone(),
                transport: self.transport.as_str().to_string(),
            });
        }

        Ok(())
    }
}
