use docchat_client::{KeyValueBackend, StoreError};
use wasm_bindgen::JsValue;
use web_sys::Storage;

/// `window.localStorage` as a key-value backend
pub struct LocalStorageBackend {
    storage: Storage,
}

impl LocalStorageBackend {
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let storage = window
            .local_storage()?
            .ok_or_else(|| JsValue::from_str("localStorage is not available"))?;
        Ok(Self { storage })
    }
}

fn backend_error(op: &str, key: &str, e: JsValue) -> StoreError {
    StoreError::Backend(format!("localStorage {} {}: {:?}", op, key, e))
}

impl KeyValueBackend for LocalStorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(|e| backend_error("get", key, e))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set_item(key, value).map_err(|e| backend_error("set", key, e))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.storage.remove_item(key).map_err(|e| backend_error("remove", key, e))
    }
}
