#![cfg(target_arch = "wasm32")]

use std::time::Duration;

use docchat_client::types::{Message, Role};
use docchat_client::{ChatDatabase, ChatView, KeyValueBackend, Spawner, Timer};
use docchat_wasm::{DomView, GlooTimer, LocalStorageBackend, WasmSpawner};
use futures::FutureExt;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

fn mount_panel() -> web_sys::Element {
    let document = document();
    if let Some(old) = document.get_element_by_id("assistant") {
        old.remove();
    }

    let panel = document.create_element("div").unwrap();
    panel.set_id("assistant");
    panel.set_inner_html(
        r#"<ul id="chat-body"></ul>
           <textarea id="user-input"></textarea>
           <button id="send-button"></button>
           <button id="chat-clear"></button>"#,
    );
    document.body().unwrap().append_child(&panel).unwrap();
    panel
}

#[wasm_bindgen_test]
fn test_local_storage_backend() {
    let backend = LocalStorageBackend::new().unwrap();
    backend.set("DocchatTest.session", "\"abc\"").unwrap();
    assert_eq!(backend.get("DocchatTest.session").unwrap().as_deref(), Some("\"abc\""));

    backend.remove("DocchatTest.session").unwrap();
    assert_eq!(backend.get("DocchatTest.session").unwrap(), None);
}

#[wasm_bindgen_test]
fn test_history_survives_reopen() {
    let db = ChatDatabase::open("DocchatWebTest", LocalStorageBackend::new().unwrap());
    db.reset().unwrap();
    db.append_message(&Message::outgoing("<p>q</p>")).unwrap();
    db.append_message(&Message::incoming("<p>a</p>")).unwrap();

    let reopened = ChatDatabase::open("DocchatWebTest", LocalStorageBackend::new().unwrap());
    let roles: Vec<Role> = reopened.messages().unwrap().into_iter().map(|r| r.message.role).collect();
    assert_eq!(roles, vec![Role::Outgoing, Role::Incoming]);
    reopened.reset().unwrap();
}

#[wasm_bindgen_test]
fn test_dom_view_renders_messages() {
    let panel = mount_panel();
    let view = DomView::bind(&document()).unwrap();

    view.show_message(Role::Outgoing, "<p>hello</p>");
    let pending = view.show_message(Role::Incoming, "<p>Awaiting...</p>");
    view.update_message(&pending, "<p>hi there</p>");

    let body = document().get_element_by_id("chat-body").unwrap();
    assert_eq!(body.child_element_count(), 2);
    let reply = body.last_element_child().unwrap();
    assert_eq!(reply.class_name(), "chat-message incoming");
    assert_eq!(reply.inner_html(), "<p>hi there</p>");

    view.set_input_enabled(false);
    assert!(view.input().disabled());
    assert!(view.send_button().disabled());

    view.reset();
    assert_eq!(body.child_element_count(), 0);
    panel.remove();
}

#[wasm_bindgen_test]
async fn test_gloo_timer_sleeps() {
    GlooTimer.sleep(Duration::from_millis(5)).await;
}

#[wasm_bindgen_test]
async fn test_spawned_task_runs_in_background() {
    let (tx, rx) = futures::channel::oneshot::channel();
    WasmSpawner.spawn(
        async move {
            GlooTimer.sleep(Duration::from_millis(5)).await;
            let _ = tx.send("done");
        }
        .boxed_local(),
    );

    assert_eq!(rx.await.unwrap(), "done");
}
