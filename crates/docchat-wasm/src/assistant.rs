use std::cell::RefCell;
use std::rc::Rc;

use docchat_client::{ChatClient, ClientConfig, SocketConnector};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, KeyboardEvent};

use crate::dom::{self, Listener};
use crate::storage::LocalStorageBackend;
use crate::utils::{GlooTimer, WasmSpawner};
use crate::view::{DomView, CLEAR_BUTTON_ID};
use crate::websocket::GlooConnector;

type DomClient = ChatClient<DomView, LocalStorageBackend>;

/// Handle to the running assistant panel
#[wasm_bindgen]
pub struct Assistant {
    client: Rc<DomClient>,
    listeners: RefCell<Vec<Listener>>,
}

impl Assistant {
    pub(crate) fn start(document: &Document, endpoint: String) -> Result<Self, JsValue> {
        let view = DomView::bind(document)?;
        let backend = LocalStorageBackend::new()?;
        let connector: Box<dyn SocketConnector> = Box::new(GlooConnector);

        let client = ChatClient::new(
            ClientConfig::new(endpoint),
            Rc::new(GlooTimer),
            Rc::new(WasmSpawner),
            Some(connector),
            view,
            backend,
        )
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let client = Rc::new(client);

        client.load();
        let listeners = bind_controls(document, &client)?;

        Ok(Self {
            client,
            listeners: RefCell::new(listeners),
        })
    }
}

#[wasm_bindgen]
impl Assistant {
    /// Forget the conversation here and on the backend
    pub fn clear(&self) {
        spawn_clear(self.client.clone());
    }

    /// Detach from the page and close the transport
    pub fn shutdown(&self) {
        self.listeners.borrow_mut().clear();
        let client = self.client.clone();
        wasm_bindgen_futures::spawn_local(async move {
            client.shutdown().await;
        });
    }
}

fn spawn_send(client: Rc<DomClient>) {
    let input = client.controller().view().input().value();
    wasm_bindgen_futures::spawn_local(async move {
        client.send(&input).await;
    });
}

fn spawn_clear(client: Rc<DomClient>) {
    wasm_bindgen_futures::spawn_local(async move {
        client.clear().await;
    });
}

fn bind_controls(document: &Document, client: &Rc<DomClient>) -> Result<Vec<Listener>, JsValue> {
    let view = client.controller().view();
    let mut listeners = Vec::new();

    // Send button
    let c = client.clone();
    listeners.push(Listener::attach(view.send_button(), "click", move |_| {
        spawn_send(c.clone());
    })?);

    // Enter sends, Shift+Enter inserts a newline
    let c = client.clone();
    listeners.push(Listener::attach(view.input(), "keydown", move |event| {
        let Some(key_event) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        if key_event.key() == "Enter" && !key_event.shift_key() {
            event.prevent_default();
            spawn_send(c.clone());
        }
    })?);

    // Auto-resize textarea
    let c = client.clone();
    listeners.push(Listener::attach(view.input(), "input", move |_| {
        c.controller().view().fit_input();
    })?);

    let clear_button = dom::get_element_by_id(document, CLEAR_BUTTON_ID)?;
    let c = client.clone();
    listeners.push(Listener::attach(&clear_button, "click", move |_| {
        spawn_clear(c.clone());
    })?);

    Ok(listeners)
}
