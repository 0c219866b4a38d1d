use std::time::Duration;

use docchat_client::{Spawner, Timer};
use futures::future::{FutureExt, LocalBoxFuture};
use wasm_bindgen::JsValue;

/// Timer backed by `setTimeout`
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooTimer;

impl Timer for GlooTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        gloo_timers::future::sleep(duration).boxed_local()
    }
}

/// Runs background tasks on the browser's microtask queue
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmSpawner;

impl Spawner for WasmSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// Full URL of the page the reader is on
pub fn current_page_url() -> Option<String> {
    web_sys::window().and_then(|w| w.location().href().ok())
}

/// Chat endpoint configured by the page as `window.CHATBOT_SOURCE`
pub fn configured_endpoint() -> Result<Option<String>, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let value = js_sys::Reflect::get(&window, &JsValue::from_str("CHATBOT_SOURCE"))?;
    Ok(value.as_string().filter(|s| !s.trim().is_empty()))
}
