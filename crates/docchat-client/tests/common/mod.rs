#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

use async_trait::async_trait;
use docchat_client::{SocketConnection, SocketConnector, Transport, TransportError};
use docchat_client::types::{ChatReply, Query};
use futures::channel::{mpsc, oneshot};
use futures::StreamExt;
use serde_json::{json, Value};

/// Run a test body on a `LocalSet`, where the socket transport spawns its tasks
pub async fn run_local<F: Future>(body: F) -> F::Output {
    tokio::task::LocalSet::new().run_until(body).await
}

// ============================================================================
// Scripted transport for controller tests
// ============================================================================

/// Transport answering from a queue of canned results
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Result<ChatReply, TransportError>>>,
    gate: RefCell<Option<oneshot::Receiver<ChatReply>>>,
    queries: RefCell<Vec<Query>>,
    clears: RefCell<Vec<Option<String>>>,
    clear_fails: Cell<bool>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.borrow_mut().push_back(Ok(ChatReply::new(text)));
        self
    }

    pub fn reply_with_session(self, text: &str, session_id: &str) -> Self {
        self.replies
            .borrow_mut()
            .push_back(Ok(ChatReply::new(text).with_session(Some(session_id.to_string()))));
        self
    }

    pub fn fail(self, error: TransportError) -> Self {
        self.replies.borrow_mut().push_back(Err(error));
        self
    }

    pub fn failing_clear(self) -> Self {
        self.clear_fails.set(true);
        self
    }

    /// Hold the next exchange until the returned sender fires
    pub fn gated(self) -> (Self, oneshot::Sender<ChatReply>) {
        let (tx, rx) = oneshot::channel();
        *self.gate.borrow_mut() = Some(rx);
        (self, tx)
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.borrow().clone()
    }

    pub fn clears(&self) -> Vec<Option<String>> {
        self.clears.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn exchange(&self, query: &Query) -> Result<ChatReply, TransportError> {
        self.queries.borrow_mut().push(query.clone());

        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            return gate.await.map_err(|_| TransportError::SocketClosed);
        }

        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(ChatReply::new("<p>ok</p>")))
    }

    async fn clear_remote(&self, session_id: Option<&str>) -> Result<(), TransportError> {
        self.clears.borrow_mut().push(session_id.map(str::to_string));
        if self.clear_fails.get() {
            Err(TransportError::Network("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// In-memory socket server
// ============================================================================

/// What the fake server does with the next query frame
#[derive(Debug, Clone)]
pub enum ServerAction {
    /// Answer with `{"response": .., "request_id": <echoed>}`
    Echo(String),
    /// Like `Echo`, also handing out a session id
    EchoWithSession(String, String),
    /// Send this exact frame text
    Raw(String),
    /// Send several frames in order
    Frames(Vec<String>),
    /// Close the connection without answering
    Close,
    /// Report a transport error on the connection
    Error,
    /// Never answer
    Silent,
}

struct ServerState {
    script: RefCell<VecDeque<ServerAction>>,
    received: RefCell<Vec<String>>,
    connects: Cell<u32>,
    refuse_connects: Cell<u32>,
    live: RefCell<Option<LiveConnection>>,
    /// Inbound side of every connection ever opened, oldest first
    opened: RefCell<Vec<mpsc::UnboundedSender<Result<String, TransportError>>>>,
}

struct LiveConnection {
    inbound: mpsc::UnboundedSender<Result<String, TransportError>>,
    closed: Rc<Cell<bool>>,
}

/// Scripted socket peer shared between a test and the connector it hands out
#[derive(Clone)]
pub struct FakeSocketServer {
    state: Rc<ServerState>,
}

impl FakeSocketServer {
    pub fn new() -> Self {
        Self {
            state: Rc::new(ServerState {
                script: RefCell::new(VecDeque::new()),
                received: RefCell::new(Vec::new()),
                connects: Cell::new(0),
                refuse_connects: Cell::new(0),
                live: RefCell::new(None),
                opened: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn then(&self, action: ServerAction) -> &Self {
        self.state.script.borrow_mut().push_back(action);
        self
    }

    pub fn refuse_next_connects(&self, count: u32) {
        self.state.refuse_connects.set(count);
    }

    pub fn connector(&self) -> Box<dyn SocketConnector> {
        Box::new(FakeConnector { server: self.clone() })
    }

    /// Successful connects so far
    pub fn connects(&self) -> u32 {
        self.state.connects.get()
    }

    /// Every frame the client sent, across connections
    pub fn received(&self) -> Vec<String> {
        self.state.received.borrow().clone()
    }

    pub fn received_json(&self) -> Vec<Value> {
        self.received()
            .iter()
            .map(|frame| serde_json::from_str(frame).expect("client frames are JSON"))
            .collect()
    }

    /// Send a frame nobody asked for on the current connection
    pub fn push(&self, text: &str) {
        if let Some(live) = self.state.live.borrow().as_ref() {
            let _ = live.inbound.unbounded_send(Ok(text.to_string()));
        }
    }

    /// Send a frame on the `index`-th connection opened, live or not
    pub fn push_on(&self, index: usize, text: &str) {
        if let Some(inbound) = self.state.opened.borrow().get(index) {
            let _ = inbound.unbounded_send(Ok(text.to_string()));
        }
    }

    /// Drop the live connection from the server side
    pub fn hang_up(&self) {
        if let Some(live) = self.state.live.borrow_mut().take() {
            live.closed.set(true);
            live.inbound.close_channel();
        }
    }

    fn on_frame(&self, frame: &str) {
        self.state.received.borrow_mut().push(frame.to_string());
        if frame.contains("\"clear_history\"") {
            return;
        }

        let request_id = serde_json::from_str::<Value>(frame)
            .ok()
            .and_then(|v| v.get("request_id").cloned())
            .unwrap_or(Value::Null);

        let action = self.state.script.borrow_mut().pop_front().unwrap_or(ServerAction::Silent);
        let live = self.state.live.borrow();
        let Some(live) = live.as_ref() else {
            return;
        };

        match action {
            ServerAction::Echo(text) => {
                let reply = json!({ "response": text, "request_id": request_id });
                let _ = live.inbound.unbounded_send(Ok(reply.to_string()));
            }
            ServerAction::EchoWithSession(text, session_id) => {
                let reply = json!({ "response": text, "request_id": request_id, "session_id": session_id });
                let _ = live.inbound.unbounded_send(Ok(reply.to_string()));
            }
            ServerAction::Raw(text) => {
                let _ = live.inbound.unbounded_send(Ok(text));
            }
            ServerAction::Frames(frames) => {
                for text in frames {
                    let _ = live.inbound.unbounded_send(Ok(text));
                }
            }
            ServerAction::Close => {
                live.closed.set(true);
                live.inbound.close_channel();
            }
            ServerAction::Error => {
                let _ = live
                    .inbound
                    .unbounded_send(Err(TransportError::Network("connection reset".to_string())));
            }
            ServerAction::Silent => {}
        }
    }
}

struct FakeConnector {
    server: FakeSocketServer,
}

#[async_trait(?Send)]
impl SocketConnector for FakeConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn SocketConnection>, TransportError> {
        let state = &self.server.state;
        if state.refuse_connects.get() > 0 {
            state.refuse_connects.set(state.refuse_connects.get() - 1);
            return Err(TransportError::SocketUnavailable("connection refused".to_string()));
        }

        let (tx, rx) = mpsc::unbounded();
        let closed = Rc::new(Cell::new(false));
        state.opened.borrow_mut().push(tx.clone());
        *state.live.borrow_mut() = Some(LiveConnection {
            inbound: tx,
            closed: closed.clone(),
        });
        state.connects.set(state.connects.get() + 1);

        Ok(Box::new(FakeConnection {
            server: self.server.clone(),
            inbound: rx,
            closed,
        }))
    }
}

struct FakeConnection {
    server: FakeSocketServer,
    inbound: mpsc::UnboundedReceiver<Result<String, TransportError>>,
    closed: Rc<Cell<bool>>,
}

#[async_trait(?Send)]
impl SocketConnection for FakeConnection {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed.get() {
            return Err(TransportError::Network("socket is closed".to_string()));
        }
        self.server.on_frame(&text);
        Ok(())
    }

    async fn next_text(&mut self) -> Option<Result<String, TransportError>> {
        self.inbound.next().await
    }

    async fn close(&mut self) {
        self.closed.set(true);
        self.inbound.close();
    }
}
