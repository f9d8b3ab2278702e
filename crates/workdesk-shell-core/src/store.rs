//! String key-value stores for persisted layout preferences.
//!
//! The layout engine only ever talks to [`LayoutStore`]; hosts pick the
//! backing: [`MemoryLayoutStore`] for tests and fallbacks, [`FileLayoutStore`]
//! for native tools, and the browser's localStorage in the web shell.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const LAYOUT_SCHEMA_VERSION: u32 = 1;
const LAYOUT_FILE_NAME: &str = "layout.v1.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("layout store unavailable: {0}")]
    Unavailable(String),
    #[error("layout store {operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
    #[error("failed to read layout store {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write layout store {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode layout store: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    /// `value` is `None` when the key was removed.
    Key { key: String, value: Option<String> },
    /// Every key was dropped at once, e.g. `localStorage.clear()` in
    /// another tab.
    Cleared,
}

impl StoreChange {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        StoreChange::Key {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn removed(key: impl Into<String>) -> Self {
        StoreChange::Key {
            key: key.into(),
            value: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type StoreListener = Box<dyn Fn(&StoreChange)>;

pub trait LayoutStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
    /// Listeners run synchronously after each change, including changes made
    /// through this handle.
    fn subscribe(&self, listener: StoreListener) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

impl<S: LayoutStore + ?Sized> LayoutStore for Rc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }

    fn subscribe(&self, listener: StoreListener) -> SubscriptionId {
        (**self).subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        (**self).unsubscribe(id)
    }
}

/// Listener registry shared by store implementations.
#[derive(Default)]
pub struct Listeners {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(SubscriptionId, Rc<dyn Fn(&StoreChange)>)>>,
}

impl Listeners {
    pub fn add(&self, listener: StoreListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get().wrapping_add(1));
        self.entries.borrow_mut().push((id, Rc::from(listener)));
        id
    }

    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(candidate, _)| *candidate != id);
        before != entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Listeners may subscribe or unsubscribe from inside the callback.
    pub fn notify(&self, change: &StoreChange) {
        let listeners = self
            .entries
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect::<Vec<_>>();
        for listener in listeners {
            listener(change);
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.len())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct MemoryLayoutStore {
    entries: RefCell<BTreeMap<String, String>>,
    listeners: Listeners,
}

impl MemoryLayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RefCell::new(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
            listeners: Listeners::default(),
        }
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.borrow().clone()
    }
}

impl LayoutStore for MemoryLayoutStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.listeners.notify(&StoreChange::set(key, value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let removed = self.entries.borrow_mut().remove(key).is_some();
        if removed {
            self.listeners.notify(&StoreChange::removed(key));
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }

    fn subscribe(&self, listener: StoreListener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LayoutDocument {
    version: u32,
    entries: BTreeMap<String, String>,
}

/// JSON file store; every write rewrites the whole document.
#[derive(Debug)]
pub struct FileLayoutStore {
    path: PathBuf,
    entries: RefCell<BTreeMap<String, String>>,
    listeners: Listeners,
}

impl FileLayoutStore {
    pub fn load_default() -> Self {
        Self::load(default_layout_path())
    }

    /// Missing, unreadable or mismatched-version files load as empty.
    pub fn load(path: PathBuf) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<LayoutDocument>(raw.as_str()) {
                Ok(document) if document.version == LAYOUT_SCHEMA_VERSION => document.entries,
                Ok(document) => {
                    tracing::debug!(
                        path = %path.display(),
                        version = document.version,
                        "ignoring layout store with unknown version"
                    );
                    BTreeMap::new()
                }
                Err(error) => {
                    tracing::debug!(path = %path.display(), %error, "ignoring corrupt layout store");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            entries: RefCell::new(entries),
            listeners: Listeners::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries.borrow().clone()
    }

    /// Writes `entries` to disk; the in-memory map is only replaced once the
    /// file write succeeds.
    fn commit(&self, entries: BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        let encoded = serde_json::to_string_pretty(&LayoutDocument {
            version: LAYOUT_SCHEMA_VERSION,
            entries: entries.clone(),
        })?;
        fs::write(&self.path, encoded).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        *self.entries.borrow_mut() = entries;
        Ok(())
    }
}

impl LayoutStore for FileLayoutStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut next = self.entries.borrow().clone();
        next.insert(key.to_string(), value.to_string());
        self.commit(next)?;
        self.listeners.notify(&StoreChange::set(key, value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut next = self.entries.borrow().clone();
        if next.remove(key).is_none() {
            return Ok(());
        }
        self.commit(next)?;
        self.listeners.notify(&StoreChange::removed(key));
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }

    fn subscribe(&self, listener: StoreListener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }
}

pub fn default_layout_path() -> PathBuf {
    if let Some(mut data_dir) = dirs::data_local_dir() {
        data_dir.push("workdesk");
        data_dir.push(LAYOUT_FILE_NAME);
        return data_dir;
    }

    if let Some(mut home_dir) = dirs::home_dir() {
        home_dir.push(".workdesk");
        home_dir.push(LAYOUT_FILE_NAME);
        return home_dir;
    }

    PathBuf::from(LAYOUT_FILE_NAME)
}
