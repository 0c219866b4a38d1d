use wasm_bindgen::prelude::*;
use web_sys::{Document, Window};

mod assistant;
pub mod dom;
pub mod storage;
pub mod utils;
pub mod view;
pub mod websocket;

pub use assistant::Assistant;
pub use storage::LocalStorageBackend;
pub use utils::{GlooTimer, WasmSpawner};
pub use view::DomView;
pub use websocket::GlooConnector;

/// Initialize the WASM module
/// This sets up panic hooks and logging
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    wasm_logger::init(wasm_logger::Config::default());

    log::info!("Docs assistant WASM initialized");
}

/// Start the assistant panel of the current page
///
/// `endpoint` overrides `window.CHATBOT_SOURCE`.
#[wasm_bindgen]
pub fn init_assistant(endpoint: Option<String>) -> Result<Assistant, JsValue> {
    let endpoint = match endpoint.filter(|e| !e.trim().is_empty()) {
        Some(endpoint) => endpoint,
        None => utils::configured_endpoint()?
            .ok_or_else(|| JsValue::from_str("No chat endpoint: set window.CHATBOT_SOURCE"))?,
    };

    log::info!("Initializing assistant against {}", endpoint);
    Assistant::start(&document()?, endpoint)
}

/// Get the window object
fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))
}

/// Get the document object
fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("No document object"))
}
