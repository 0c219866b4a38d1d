//! Chat session client for the documentation assistant
//!
//! The client sends a reader's question to the chat backend over HTTP or a
//! persistent socket, renders a pending placeholder, fills in the reply, and
//! keeps the conversation plus the backend's session id in a local store so
//! it survives reloads.
//!
//! Everything runs on a single thread: the traits are `?Send` so the same
//! code drives a browser page and a current-thread tokio runtime.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod render;
pub mod spawn;
pub mod store;
pub mod timer;
pub mod transport;
pub mod view;

#[cfg(not(target_arch = "wasm32"))]
pub mod native;

pub use client::{build_transport, ChatClient};
pub use config::{ClientConfig, ReplyFormat, SocketFraming, TransportKind};
pub use controller::{ConversationController, RequestState, SendOutcome};
pub use error::{ConfigError, StoreError, TransportError};
pub use spawn::Spawner;
pub use store::{ChatDatabase, KeyValueBackend, MemoryBackend};
pub use timer::Timer;
pub use transport::{
    ConnectionState, HttpTransport, SocketConnection, SocketConnector, SocketTransport, Transport,
};
pub use view::{ChatView, TranscriptView};

#[cfg(not(target_arch = "wasm32"))]
pub use native::{TokioSpawner, TokioTimer, TungsteniteConnector};
#[cfg(not(target_arch = "wasm32"))]
pub use store::FileBackend;

pub use docchat_types as types;
