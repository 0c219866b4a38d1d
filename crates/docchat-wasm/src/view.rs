use docchat_client::types::Role;
use docchat_client::ChatView;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlButtonElement, HtmlElement, HtmlTextAreaElement};

use crate::dom;
use crate::utils;

pub const CHAT_BODY_ID: &str = "chat-body";
pub const USER_INPUT_ID: &str = "user-input";
pub const SEND_BUTTON_ID: &str = "send-button";
pub const CLEAR_BUTTON_ID: &str = "chat-clear";

/// The assistant panel of a documentation page
pub struct DomView {
    document: Document,
    chat_body: Element,
    input: HtmlTextAreaElement,
    send_button: HtmlButtonElement,
    default_input_height: i32,
}

impl DomView {
    /// Bind to the assistant markup already present in the page
    pub fn bind(document: &Document) -> Result<Self, JsValue> {
        let chat_body = dom::get_element_by_id(document, CHAT_BODY_ID)?;
        let input = dom::get_textarea_by_id(document, USER_INPUT_ID)?;
        let send_button = dom::get_element_by_id(document, SEND_BUTTON_ID)?
            .dyn_into::<HtmlButtonElement>()
            .map_err(|_| JsValue::from_str(&format!("Element is not HtmlButtonElement: {}", SEND_BUTTON_ID)))?;
        let default_input_height = input.scroll_height();

        Ok(Self {
            document: document.clone(),
            chat_body,
            input,
            send_button,
            default_input_height,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn input(&self) -> &HtmlTextAreaElement {
        &self.input
    }

    pub fn send_button(&self) -> &HtmlButtonElement {
        &self.send_button
    }

    /// Grow the textarea to fit what has been typed
    pub fn fit_input(&self) {
        let input: &HtmlElement = self.input.as_ref();
        dom::set_style(input, "height", "auto");
        dom::set_style(input, "height", &format!("{}px", self.input.scroll_height()));
    }
}

impl ChatView for DomView {
    type Entry = Option<Element>;

    fn show_message(&self, role: Role, html: &str) -> Self::Entry {
        let class = format!("chat-message {}", role.as_str());
        let message = match dom::create_element_with_class(&self.document, "li", &class) {
            Ok(message) => message,
            Err(e) => {
                log::error!("Failed to create message element: {:?}", e);
                return None;
            }
        };

        message.set_inner_html(html);
        if let Err(e) = self.chat_body.append_child(&message) {
            log::error!("Failed to append message: {:?}", e);
            return None;
        }
        dom::scroll_to_bottom(&self.chat_body);
        Some(message)
    }

    fn update_message(&self, entry: &Self::Entry, html: &str) {
        match entry {
            Some(message) => {
                message.set_inner_html(html);
                dom::scroll_to_bottom(&self.chat_body);
            }
            // Placeholder never made it into the page
            None => {
                self.show_message(Role::Incoming, html);
            }
        }
    }

    fn reset(&self) {
        dom::clear_element(&self.chat_body);
    }

    fn clear_input(&self) {
        self.input.set_value("");
        dom::set_style(self.input.as_ref(), "height", &format!("{}px", self.default_input_height));
    }

    fn set_input_enabled(&self, enabled: bool) {
        self.input.set_disabled(!enabled);
        self.send_button.set_disabled(!enabled);
    }

    fn page_url(&self) -> Option<String> {
        utils::current_page_url()
    }
}
