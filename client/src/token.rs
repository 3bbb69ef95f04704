use log::warn;
use wasm_bindgen::JsValue;
use web_sys::{Storage, Window};

/// Holds the opaque session token obtained from the login service.
pub trait TokenStore {
    fn load(&self) -> Option<String>;
    fn clear(&mut self);
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.clone().filter(|token| !token.is_empty())
    }

    fn clear(&mut self) {
        self.token = None;
    }
}

/// `window.localStorage`, where the login page leaves the token.
pub struct LocalStorageTokenStore {
    storage: Storage,
    key: String,
}

impl LocalStorageTokenStore {
    pub fn new(window: &Window, key: &str) -> Result<Self, JsValue> {
        let storage = window
            .local_storage()?
            .ok_or_else(|| JsValue::from_str("localStorage unavailable"))?;
        Ok(Self {
            storage,
            key: key.to_string(),
        })
    }
}

impl TokenStore for LocalStorageTokenStore {
    fn load(&self) -> Option<String> {
        self.storage
            .get_item(&self.key)
            .ok()
            .flatten()
            .filter(|token| !token.is_empty())
    }

    fn clear(&mut self) {
        if self.storage.remove_item(&self.key).is_err() {
            warn!("failed to drop the session token");
        }
    }
}
