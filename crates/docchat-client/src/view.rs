use std::cell::{Cell, RefCell};

use docchat_types::{Message, Role};

/// The UI the conversation is rendered into
pub trait ChatView {
    /// Handle to a rendered message, used to fill in a pending reply
    type Entry;

    /// Append a message and return its handle
    fn show_message(&self, role: Role, html: &str) -> Self::Entry;

    /// Replace the content of an already shown message
    fn update_message(&self, entry: &Self::Entry, html: &str);

    /// Remove every shown message
    fn reset(&self);

    fn clear_input(&self);

    /// Enable or disable both the input and the send control
    fn set_input_enabled(&self, enabled: bool);

    /// URL of the page the reader is looking at, sent along with queries
    fn page_url(&self) -> Option<String> {
        None
    }
}

/// Headless view that records the transcript in memory
#[derive(Debug)]
pub struct TranscriptView {
    messages: RefCell<Vec<Message>>,
    input_enabled: Cell<bool>,
    input_clears: Cell<usize>,
    page_url: Option<String>,
}

impl TranscriptView {
    pub fn new() -> Self {
        Self {
            messages: RefCell::new(Vec::new()),
            input_enabled: Cell::new(true),
            input_clears: Cell::new(0),
            page_url: None,
        }
    }

    pub fn with_page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = Some(url.into());
        self
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.borrow().clone()
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled.get()
    }

    pub fn input_clears(&self) -> usize {
        self.input_clears.get()
    }
}

impl Default for TranscriptView {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatView for TranscriptView {
    type Entry = usize;

    fn show_message(&self, role: Role, html: &str) -> usize {
        let mut messages = self.messages.borrow_mut();
        messages.push(Message {
            role,
            content: html.to_string(),
        });
        messages.len() - 1
    }

    fn update_message(&self, entry: &usize, html: &str) {
        if let Some(message) = self.messages.borrow_mut().get_mut(*entry) {
            message.content = html.to_string();
        }
    }

    fn reset(&self) {
        self.messages.borrow_mut().clear();
    }

    fn clear_input(&self) {
        self.input_clears.set(self.input_clears.get() + 1);
    }

    fn set_input_enabled(&self, enabled: bool) {
        self.input_enabled.set(enabled);
    }

    fn page_url(&self) -> Option<String> {
        self.page_url.clone()
    }
}

impl<V: ChatView + ?Sized> ChatView for std::rc::Rc<V> {
    type Entry = V::Entry;

    fn show_message(&self, role: Role, html: &str) -> Self::Entry {
        (**self).show_message(role, html)
    }

    fn update_message(&self, entry: &Self::Entry, html: &str) {
        (**self).update_message(entry, html)
    }

    fn reset(&self) {
        (**self).reset()
    }

    fn clear_input(&self) {
        (**self).clear_input()
    }

    fn set_input_enabled(&self, enabled: bool) {
        (**self).set_input_enabled(enabled)
    }

    fn page_url(&self) -> Option<String> {
        (**self).page_url()
    }
}
