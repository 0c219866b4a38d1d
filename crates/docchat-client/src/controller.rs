use std::cell::Cell;

use docchat_types::{ChatReply, Message, Query, Role, SessionId, DEFAULT_PENDING_HTML, DEFAULT_WELCOME_HTML};

use crate::config::{ClientConfig, ReplyFormat};
use crate::render::{render_outgoing, render_reply};
use crate::store::{ChatDatabase, KeyValueBackend};
use crate::transport::Transport;
use crate::view::ChatView;

/// Where the controller is in the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Sending,
    AwaitingReply,
    Clearing,
}

/// Result of a send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing but whitespace was typed
    Empty,
    /// Another request is still outstanding; nothing happened
    Busy,
    /// The reply (or its fallback) has been rendered and stored
    Answered(ChatReply),
}

/// Holds the input disabled while a request is outstanding and releases it
/// even if the request future is dropped halfway.
struct InFlight<'a, V: ChatView> {
    state: &'a Cell<RequestState>,
    view: &'a V,
}

impl<'a, V: ChatView> InFlight<'a, V> {
    fn begin(state: &'a Cell<RequestState>, view: &'a V, initial: RequestState) -> Self {
        state.set(initial);
        view.set_input_enabled(false);
        Self { state, view }
    }

    fn advance(&self, next: RequestState) {
        self.state.set(next);
    }
}

impl<V: ChatView> Drop for InFlight<'_, V> {
    fn drop(&mut self) {
        self.state.set(RequestState::Idle);
        self.view.set_input_enabled(true);
    }
}

/// Drives one conversation: one request at a time, optimistic rendering,
/// persistence of every final message.
pub struct ConversationController<T, V, B> {
    transport: T,
    view: V,
    store: ChatDatabase<B>,
    welcome_html: String,
    pending_html: String,
    reply_format: ReplyFormat,
    state: Cell<RequestState>,
}

impl<T, V, B> ConversationController<T, V, B>
where
    T: Transport,
    V: ChatView,
    B: KeyValueBackend,
{
    pub fn new(transport: T, view: V, store: ChatDatabase<B>) -> Self {
        Self {
            transport,
            view,
            store,
            welcome_html: DEFAULT_WELCOME_HTML.to_string(),
            pending_html: DEFAULT_PENDING_HTML.to_string(),
            reply_format: ReplyFormat::Html,
            state: Cell::new(RequestState::Idle),
        }
    }

    pub fn from_config(config: &ClientConfig, transport: T, view: V, backend: B) -> Self {
        let store = ChatDatabase::open(config.database_name.clone(), backend);
        Self::new(transport, view, store)
            .with_welcome_html(config.welcome_html.clone())
            .with_pending_html(config.pending_html.clone())
            .with_reply_format(config.reply_format)
    }

    pub fn with_welcome_html(mut self, html: impl Into<String>) -> Self {
        self.welcome_html = html.into();
        self
    }

    pub fn with_pending_html(mut self, html: impl Into<String>) -> Self {
        self.pending_html = html.into();
        self
    }

    pub fn with_reply_format(mut self, format: ReplyFormat) -> Self {
        self.reply_format = format;
        self
    }

    pub fn state(&self) -> RequestState {
        self.state.get()
    }

    pub fn is_busy(&self) -> bool {
        self.state.get() != RequestState::Idle
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn store(&self) -> &ChatDatabase<B> {
        &self.store
    }

    /// Replay stored history into the view; the welcome banner stands in for
    /// an empty history. Returns the number of replayed messages.
    pub fn load(&self) -> usize {
        self.view.reset();

        let records = match self.store.messages() {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Could not read chat history: {}", e);
                Vec::new()
            }
        };

        if records.is_empty() {
            self.view.show_message(Role::Incoming, &self.welcome_html);
        }
        for record in &records {
            self.view.show_message(record.message.role, &record.message.content);
        }

        log::info!("Replayed {} stored messages", records.len());
        records.len()
    }

    /// Send what the reader typed and render the answer in place
    pub async fn send(&self, input: &str) -> SendOutcome {
        if self.is_busy() {
            log::debug!("Ignoring send while a request is outstanding");
            return SendOutcome::Busy;
        }

        let text = input.trim();
        if text.is_empty() {
            return SendOutcome::Empty;
        }

        let in_flight = InFlight::begin(&self.state, &self.view, RequestState::Sending);
        self.view.clear_input();

        let outgoing = Message::outgoing(render_outgoing(text));
        self.view.show_message(Role::Outgoing, &outgoing.content);
        self.persist(&outgoing);

        let pending = self.view.show_message(Role::Incoming, &self.pending_html);

        let stored_session = self.stored_session_id();
        let query = Query::new(text)
            .with_session(stored_session.clone())
            .with_url(self.view.page_url());

        in_flight.advance(RequestState::AwaitingReply);
        let reply = self.transport.ask(&query).await;

        self.adopt_session(stored_session.as_deref(), reply.session_id.as_deref());

        let incoming = Message::incoming(render_reply(&reply.text, self.reply_format));
        self.view.update_message(&pending, &incoming.content);
        self.persist(&incoming);

        drop(in_flight);
        SendOutcome::Answered(reply)
    }

    /// Reset the view to the welcome banner and forget the conversation
    /// locally and remotely. Local history is wiped whatever the backend says.
    /// Returns `false` when a request is outstanding and nothing was cleared.
    pub async fn clear(&self) -> bool {
        if self.is_busy() {
            log::debug!("Ignoring clear while a request is outstanding");
            return false;
        }

        let _in_flight = InFlight::begin(&self.state, &self.view, RequestState::Clearing);

        self.view.reset();
        self.view.show_message(Role::Incoming, &self.welcome_html);

        let session_id = self.stored_session_id();
        if let Err(e) = self.transport.clear_remote(session_id.as_deref()).await {
            log::warn!("Remote history clear failed: {}", e);
        }

        if let Err(e) = self.store.reset() {
            log::warn!("Could not clear local chat history: {}", e);
        }

        true
    }

    /// Close the transport; the controller stays usable for local history
    pub async fn shutdown(&self) {
        self.transport.shutdown().await;
    }

    fn persist(&self, message: &Message) {
        if let Err(e) = self.store.append_message(message) {
            log::warn!("Could not store {} message: {}", message.role, e);
        }
    }

    fn stored_session_id(&self) -> Option<SessionId> {
        self.store.session_id().unwrap_or_else(|e| {
            log::warn!("Could not read session id: {}", e);
            None
        })
    }

    fn adopt_session(&self, stored: Option<&str>, returned: Option<&str>) {
        let Some(returned) = returned.filter(|id| !id.is_empty()) else {
            return;
        };
        if stored == Some(returned) {
            return;
        }

        log::info!("Backend issued session {}", returned);
        if let Err(e) = self.store.set_session_id(returned) {
            log::warn!("Could not store session id: {}", e);
        }
    }
}
