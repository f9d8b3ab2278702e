use web_sys::Storage;
use workdesk_shell_core::store::{Listeners, StoreListener};
use workdesk_shell_core::{LayoutStore, StoreChange, StoreError, SubscriptionId};

/// `window.localStorage` behind the layout store interface. Changes made in
/// other tabs arrive through [`LocalLayoutStore::apply_external_change`].
#[derive(Debug, Default)]
pub(crate) struct LocalLayoutStore {
    listeners: Listeners,
}

impl LocalLayoutStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_available(&self) -> bool {
        storage().is_ok()
    }

    /// `key` is `None` when another tab cleared all of storage; by then this
    /// tab's view of storage is already empty.
    pub(crate) fn apply_external_change(&self, key: Option<String>, value: Option<String>) {
        let change = match key {
            Some(key) => StoreChange::Key { key, value },
            None => StoreChange::Cleared,
        };
        self.listeners.notify(&change);
    }
}

fn storage() -> Result<Storage, StoreError> {
    let window =
        web_sys::window().ok_or_else(|| StoreError::Unavailable("no window".to_string()))?;
    window
        .local_storage()
        .map_err(|error| StoreError::Backend {
            operation: "open",
            message: format!("{error:?}"),
        })?
        .ok_or_else(|| StoreError::Unavailable("localStorage disabled".to_string()))
}

fn backend_error(operation: &'static str, error: wasm_bindgen::JsValue) -> StoreError {
    StoreError::Backend {
        operation,
        message: format!("{error:?}"),
    }
}

impl LayoutStore for LocalLayoutStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        storage()?
            .get_item(key)
            .map_err(|error| backend_error("get", error))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        storage()?
            .set_item(key, value)
            .map_err(|error| backend_error("set", error))?;
        self.listeners.notify(&StoreChange::set(key, value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        storage()?
            .remove_item(key)
            .map_err(|error| backend_error("remove", error))?;
        self.listeners.notify(&StoreChange::removed(key));
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let storage = storage()?;
        let length = storage
            .length()
            .map_err(|error| backend_error("length", error))?;
        let mut keys = Vec::with_capacity(length as usize);
        for index in 0..length {
            if let Some(key) = storage
                .key(index)
                .map_err(|error| backend_error("key", error))?
            {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn subscribe(&self, listener: StoreListener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }
}
