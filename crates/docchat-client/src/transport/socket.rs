use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use docchat_types::{ChatReply, ClientFrame, Query, ServerFrame};
use futures::channel::oneshot;
use futures::future::{self, Either, FutureExt, LocalBoxFuture, Shared};
use futures::lock::Mutex;

use crate::config::{ClientConfig, SocketFraming, DEFAULT_RECONNECT_DELAY, DEFAULT_SOCKET_REPLY_TIMEOUT};
use crate::error::TransportError;
use crate::spawn::Spawner;
use crate::timer::{with_optional_timeout, Timer};
use crate::transport::Transport;

/// Lifecycle of the shared socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Connecting,
    Open,
}

/// One open, bidirectional text connection
#[async_trait(?Send)]
pub trait SocketConnection {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Next text frame; `None` once the peer has closed the connection
    async fn next_text(&mut self) -> Option<Result<String, TransportError>>;

    async fn close(&mut self);
}

/// Platform adapter that opens socket connections
#[async_trait(?Send)]
pub trait SocketConnector {
    /// Resolves once the connection is open and ready to send
    async fn connect(&self, url: &str) -> Result<Box<dyn SocketConnection>, TransportError>;
}
/// Scheduled reconnect; `generation` tells a stale timer task apart
struct PendingReconnect {
    generation: u64,
    timer: Shared<LocalBoxFuture<'static, ()>>,
}

struct Link {
    connection: Option<Box<dyn SocketConnection>>,
    reconnect: Option<PendingReconnect>,
}

/// Persistent socket transport
///
/// The connection is opened lazily by the first query and shared by every
/// later one. Queries take turns on the connection, and JSON queries carry a
/// request id so a stray reply is never mistaken for the answer.
///
/// When the connection drops, a reconnect is scheduled after a fixed delay.
/// A failed attempt schedules the next one, forever, until shutdown. Between
/// queries a background watcher notices a server-side close and discards
/// unsolicited frames. A query issued while a reconnect is scheduled waits
/// for that attempt and is dropped if it fails.
pub struct SocketTransport {
    core: Rc<SocketCore>,
}

struct SocketCore {
    connector: Box<dyn SocketConnector>,
    url: String,
    framing: Cell<SocketFraming>,
    timer: Rc<dyn Timer>,
    spawner: Rc<dyn Spawner>,
    reconnect_delay: Cell<Duration>,
    reply_timeout: Cell<Option<Duration>>,
    link: Mutex<Link>,
    state: Cell<ConnectionState>,
    next_request_id: Cell<u64>,
    next_generation: Cell<u64>,
    reconnect_attempts: Cell<u32>,
    connect_failures: Cell<u32>,
    /// Set once the backend has echoed a `request_id`
    ids_echoed: Cell<bool>,
    shut_down: Cell<bool>,
    idle_release: RefCell<Option<oneshot::Sender<()>>>,
    stop_tx: RefCell<Option<oneshot::Sender<()>>>,
    stop: Shared<oneshot::Receiver<()>>,
}

fn shut_down_error() -> TransportError {
    TransportError::SocketUnavailable("transport shut down".to_string())
}

impl SocketTransport {
    pub fn new(
        connector: Box<dyn SocketConnector>,
        url: impl Into<String>,
        timer: Rc<dyn Timer>,
        spawner: Rc<dyn Spawner>,
    ) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();
        Self {
            core: Rc::new(SocketCore {
                connector,
                url: url.into(),
                framing: Cell::new(SocketFraming::Json),
                timer,
                spawner,
                reconnect_delay: Cell::new(DEFAULT_RECONNECT_DELAY),
                reply_timeout: Cell::new(Some(DEFAULT_SOCKET_REPLY_TIMEOUT)),
                link: Mutex::new(Link {
                    connection: None,
                    reconnect: None,
                }),
                state: Cell::new(ConnectionState::Closed),
                next_request_id: Cell::new(1),
                next_generation: Cell::new(0),
                reconnect_attempts: Cell::new(0),
                connect_failures: Cell::new(0),
                ids_echoed: Cell::new(false),
                shut_down: Cell::new(false),
                idle_release: RefCell::new(None),
                stop_tx: RefCell::new(Some(stop_tx)),
                stop: stop_rx.shared(),
            }),
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        connector: Box<dyn SocketConnector>,
        timer: Rc<dyn Timer>,
        spawner: Rc<dyn Spawner>,
    ) -> Self {
        Self::new(connector, config.endpoint.trim(), timer, spawner)
            .with_framing(config.framing)
            .with_reconnect_delay(config.reconnect_delay)
            .with_reply_timeout(config.socket_reply_timeout)
    }

    pub fn with_framing(self, framing: SocketFraming) -> Self {
        self.core.framing.set(framing);
        self
    }

    pub fn with_reconnect_delay(self, delay: Duration) -> Self {
        self.core.reconnect_delay.set(delay);
        self
    }

    pub fn with_reply_timeout(self, timeout: Option<Duration>) -> Self {
        self.core.reply_timeout.set(timeout);
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.core.state.get()
    }

    /// Number of reconnects attempted after a dropped connection or a failed connect
    pub fn reconnect_attempts(&self) -> u32 {
        self.core.reconnect_attempts.get()
    }
}

impl Drop for SocketTransport {
    fn drop(&mut self) {
        self.core.stop();
    }
}

impl SocketCore {
    fn take_request_id(&self) -> u64 {
        let id = self.next_request_id.get();
        self.next_request_id.set(id + 1);
        id
    }

    fn encode_query(&self, query: &Query, request_id: u64) -> Result<String, TransportError> {
        match self.framing.get() {
            SocketFraming::Text => Ok(query.text.clone()),
            SocketFraming::Json => serde_json::to_string(&ClientFrame::ask(query, request_id))
                .map_err(|e| TransportError::Malformed(e.to_string())),
        }
    }

    /// Mark the transport shut down and wake everything waiting on it
    fn stop(&self) {
        self.shut_down.set(true);
        if let Some(stop) = self.stop_tx.borrow_mut().take() {
            let _ = stop.send(());
        }
        self.release_idle();
    }

    /// Run `fut` unless shutdown interrupts it first
    async fn until_stopped<T, F>(&self, fut: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        futures::pin_mut!(fut);
        match future::select(fut, self.stop.clone()).await {
            Either::Left((result, _)) => result,
            Either::Right(_) => {
                log::info!("Socket request to {} abandoned by shutdown", self.url);
                Err(TransportError::SocketClosed)
            }
        }
    }

    fn schedule_reconnect(self: &Rc<Self>, link: &mut Link) {
        if self.shut_down.get() {
            link.reconnect = None;
            return;
        }

        let generation = self.next_generation.get() + 1;
        self.next_generation.set(generation);
        let delay = self.reconnect_delay.get();
        let timer = self.timer.sleep(delay).shared();
        link.reconnect = Some(PendingReconnect {
            generation,
            timer: timer.clone(),
        });
        log::info!("Reconnecting to {} in {:?}", self.url, delay);

        let core = Rc::downgrade(self);
        let reconnect = async move {
            timer.await;
            if let Some(core) = core.upgrade() {
                core.run_scheduled_reconnect(generation).await;
            }
        };
        let stop = self.stop.clone();
        self.spawner.spawn(
            async move {
                futures::pin_mut!(reconnect);
                let _ = future::select(reconnect, stop).await;
            }
            .boxed_local(),
        );
    }

    async fn run_scheduled_reconnect(self: &Rc<Self>, generation: u64) {
        let mut link = self.link.lock().await;
        let scheduled = link
            .reconnect
            .as_ref()
            .is_some_and(|pending| pending.generation == generation);
        if !scheduled || link.connection.is_some() || self.shut_down.get() {
            return;
        }

        let connected = self.reconnect(&mut link).await.is_ok();
        drop(link);
        if connected {
            self.watch_idle();
        }
    }

    async fn reconnect(self: &Rc<Self>, link: &mut Link) -> Result<(), TransportError> {
        link.reconnect = None;
        let attempt = self.reconnect_attempts.get() + 1;
        self.reconnect_attempts.set(attempt);
        log::info!("Reconnect attempt {} to {}", attempt, self.url);
        self.connect(link).await
    }

    async fn connect(self: &Rc<Self>, link: &mut Link) -> Result<(), TransportError> {
        self.state.set(ConnectionState::Connecting);
        match self.connector.connect(&self.url).await {
            Ok(connection) => {
                link.connection = Some(connection);
                self.state.set(ConnectionState::Open);
                log::info!("Socket connected: {}", self.url);
                Ok(())
            }
            Err(e) => {
                self.connect_failures.set(self.connect_failures.get() + 1);
                self.state.set(ConnectionState::Closed);
                log::error!("Failed to connect to {}: {}", self.url, e);
                self.schedule_reconnect(link);
                Err(TransportError::SocketUnavailable(e.to_string()))
            }
        }
    }

    /// Open connection for the caller holding `link`
    ///
    /// `failures_seen` is the failure count read before the caller queued for
    /// the link; a reconnect that failed in between drops the caller's frame.
    async fn ensure_open<'a>(
        self: &Rc<Self>,
        link: &'a mut Link,
        failures_seen: u32,
    ) -> Result<&'a mut Box<dyn SocketConnection>, TransportError> {
        if self.shut_down.get() {
            return Err(shut_down_error());
        }

        if link.connection.is_none() {
            if self.connect_failures.get() != failures_seen {
                return Err(TransportError::SocketUnavailable("reconnect failed".to_string()));
            }

            match link.reconnect.as_ref().map(|pending| pending.timer.clone()) {
                Some(timer) => {
                    log::debug!("Waiting for the scheduled reconnect to {}", self.url);
                    timer.await;
                    self.reconnect(link).await?;
                }
                None => {
                    log::info!("Connecting to {}", self.url);
                    self.connect(link).await?;
                }
            }
        }

        link.connection
            .as_mut()
            .ok_or_else(|| TransportError::SocketUnavailable("no connection".to_string()))
    }

    async fn drop_connection(self: &Rc<Self>, link: &mut Link, reason: &str) {
        if let Some(mut connection) = link.connection.take() {
            connection.close().await;
        }
        self.state.set(ConnectionState::Closed);
        log::warn!("Socket connection dropped ({})", reason);
        self.schedule_reconnect(link);
    }

    /// Send one frame, replacing a connection that turns out to be dead
    async fn send_frame(
        self: &Rc<Self>,
        link: &mut Link,
        frame: String,
        failures_seen: u32,
    ) -> Result<(), TransportError> {
        let had_connection = link.connection.is_some();
        let connection = self.ensure_open(link, failures_seen).await?;
        let sent = connection.send_text(frame.clone()).await;

        match sent {
            Ok(()) => return Ok(()),
            Err(e) if had_connection => {
                self.drop_connection(link, &format!("send failed: {}", e)).await;
            }
            Err(e) => {
                self.drop_connection(link, &format!("send failed: {}", e)).await;
                return Err(TransportError::SocketUnavailable(e.to_string()));
            }
        }

        let connection = self.ensure_open(link, self.connect_failures.get()).await?;
        let sent = connection.send_text(frame).await;
        if let Err(e) = sent {
            self.drop_connection(link, &format!("send failed: {}", e)).await;
            return Err(TransportError::SocketUnavailable(e.to_string()));
        }
        Ok(())
    }

    async fn read_reply(
        &self,
        connection: &mut Box<dyn SocketConnection>,
        request_id: u64,
    ) -> Result<ChatReply, TransportError> {
        loop {
            let text = match connection.next_text().await {
                Some(Ok(text)) => text,
                Some(Err(e)) => return Err(e),
                None => return Err(TransportError::SocketClosed),
            };
            log::debug!("Received frame: {}", text);

            if self.framing.get() == SocketFraming::Text {
                return Ok(ChatReply::new(text));
            }

            let frame: ServerFrame =
                serde_json::from_str(&text).map_err(|e| TransportError::Malformed(e.to_string()))?;
            if frame.request_id.is_some() {
                self.ids_echoed.set(true);
            }
            match frame.request_id {
                Some(id) if id != request_id => {
                    log::warn!("Discarding reply to request {} while waiting for {}", id, request_id);
                }
                _ => return Ok(frame.into()),
            }
        }
    }

    async fn exchange_on(
        self: &Rc<Self>,
        link: &mut Link,
        query: &Query,
        failures_seen: u32,
    ) -> Result<ChatReply, TransportError> {
        let request_id = self.take_request_id();
        let frame = self.encode_query(query, request_id)?;
        log::debug!("Sending request {}: {}", request_id, frame);
        self.send_frame(link, frame, failures_seen).await?;

        let connection = link
            .connection
            .as_mut()
            .ok_or_else(|| TransportError::SocketUnavailable("no connection".to_string()))?;
        let outcome = with_optional_timeout(
            self.timer.as_ref(),
            self.reply_timeout.get(),
            self.read_reply(connection, request_id),
        )
        .await;

        match outcome {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(TransportError::Malformed(detail))) => Err(TransportError::Malformed(detail)),
            Ok(Err(e)) => {
                self.drop_connection(link, &e.to_string()).await;
                Err(TransportError::SocketClosed)
            }
            Err(timeout) => {
                // A late reply is only recognisable when the backend echoes request ids
                if self.framing.get() == SocketFraming::Text || !self.ids_echoed.get() {
                    self.drop_connection(link, "reply timed out").await;
                }
                Err(timeout)
            }
        }
    }

    async fn request(self: &Rc<Self>, query: &Query) -> Result<ChatReply, TransportError> {
        if self.shut_down.get() {
            return Err(shut_down_error());
        }

        self.release_idle();
        let failures_seen = self.connect_failures.get();
        let mut link = self.link.lock().await;
        let result = self.exchange_on(&mut link, query, failures_seen).await;
        drop(link);

        self.watch_idle();
        result
    }

    async fn request_clear(self: &Rc<Self>, frame: String) -> Result<(), TransportError> {
        if self.shut_down.get() {
            return Err(shut_down_error());
        }

        self.release_idle();
        let failures_seen = self.connect_failures.get();
        let mut link = self.link.lock().await;
        let result = self.send_frame(&mut link, frame, failures_seen).await;
        drop(link);

        self.watch_idle();
        result
    }

    fn release_idle(&self) {
        if let Some(release) = self.idle_release.borrow_mut().take() {
            let _ = release.send(());
        }
    }

    /// Watch the idle connection until the next query needs it
    fn watch_idle(self: &Rc<Self>) {
        if self.shut_down.get() {
            return;
        }

        self.release_idle();
        let (release_tx, release_rx) = oneshot::channel();
        *self.idle_release.borrow_mut() = Some(release_tx);
        self.spawner.spawn(Rc::clone(self).watch(release_rx).boxed_local());
    }

    async fn watch(self: Rc<Self>, release: oneshot::Receiver<()>) {
        let mut wake = future::select(release, self.stop.clone());
        let mut link = self.link.lock().await;

        loop {
            let event = {
                let Some(connection) = link.connection.as_mut() else {
                    return;
                };
                match future::select(connection.next_text(), &mut wake).await {
                    Either::Left((event, _)) => event,
                    Either::Right(_) => return,
                }
            };

            match event {
                Some(Ok(text)) => log::debug!("Discarding unsolicited frame: {}", text),
                Some(Err(e)) => {
                    self.drop_connection(&mut link, &e.to_string()).await;
                    return;
                }
                None => {
                    self.drop_connection(&mut link, "closed by server while idle").await;
                    return;
                }
            }
        }
    }
}

#[async_trait(?Send)]
impl Transport for SocketTransport {
    async fn exchange(&self, query: &Query) -> Result<ChatReply, TransportError> {
        self.core.until_stopped(self.core.request(query)).await
    }

    async fn clear_remote(&self, session_id: Option<&str>) -> Result<(), TransportError> {
        if self.core.framing.get() == SocketFraming::Text {
            log::debug!("Text framing has no remote history to clear");
            return Ok(());
        }

        let frame = serde_json::to_string(&ClientFrame::ClearHistory {
            session_id: session_id.map(str::to_string),
        })
        .map_err(|e| TransportError::Malformed(e.to_string()))?;

        self.core.until_stopped(self.core.request_clear(frame)).await
    }

    /// Stop reconnecting and close the connection
    ///
    /// A query still waiting for its reply is abandoned with
    /// [`TransportError::SocketClosed`] rather than waited for.
    async fn shutdown(&self) {
        self.core.stop();
        let mut link = self.core.link.lock().await;
        if let Some(mut connection) = link.connection.take() {
            connection.close().await;
        }
        link.reconnect = None;
        self.core.state.set(ConnectionState::Closed);
        log::info!("Socket transport shut down: {}", self.core.url);
    }
}
