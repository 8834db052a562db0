/* src/state.rs */

//! Keyed reactive values shared between server rendering and the client.
//!
//! A [`StateStore`] lives for one render. Values are created once per key
//! with [`StateStore::use_state`] and reused afterwards. When rendering ends,
//! [`StateStore::payload`] serializes every value so that a client-side store
//! built with [`StateStore::hydrate`] starts from the same values instead of
//! recomputing them.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::warn;

use crate::error::{GeoError, Result};

/// Handle to one reactive value. Clones share the value.
#[derive(Debug)]
pub struct State<T> {
    inner: Arc<watch::Sender<T>>,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> State<T> {
    fn new(value: T) -> Self {
        let (sender, _) = watch::channel(value);
        Self {
            inner: Arc::new(sender),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.inner.borrow().clone()
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        self.inner.send_replace(value);
    }

    /// Modify the value in place and notify subscribers.
    pub fn update(&self, modify: impl FnOnce(&mut T)) {
        self.inner.send_modify(modify);
    }

    /// Receiver notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.inner.subscribe()
    }

    /// Whether both handles point at the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

trait StoredState: Send + Sync {
    fn to_json(&self) -> serde_json::Result<Value>;
    fn as_any(&self) -> &dyn Any;
}

impl<T> StoredState for State<T>
where
    T: Serialize + Send + Sync + 'static,
{
    fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(&*self.inner.borrow())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Keyed store of [`State`] values for one render.
#[derive(Default)]
pub struct StateStore {
    entries: HashMap<String, Box<dyn StoredState>>,
    payload: Map<String, Value>,
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .field("pending", &self.payload.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StateStore {
    /// Empty store, as used on the server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Client-side store seeded from a server payload.
    pub fn hydrate(payload: Map<String, Value>) -> Self {
        Self {
            entries: HashMap::new(),
            payload,
        }
    }

    /// Client-side store seeded from a serialized payload.
    pub fn hydrate_from_str(payload: &str) -> Result<Self> {
        let payload = serde_json::from_str(payload)
            .map_err(|e| GeoError::InvalidPayload(e.to_string()))?;
        Ok(Self::hydrate(payload))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Return the value stored under `key`, creating it on first use.
    ///
    /// A new value comes from the hydration payload when it holds `key`,
    /// otherwise from `init`. A payload entry that does not deserialize as
    /// `T` is discarded in favour of `init`.
    pub fn use_state<T, F>(&mut self, key: &str, init: F) -> Result<State<T>>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        if let Some(entry) = self.entries.get(key) {
            return entry
                .as_any()
                .downcast_ref::<State<T>>()
                .cloned()
                .ok_or_else(|| GeoError::StateType(key.to_string()));
        }

        let initial = match self.payload.remove(key) {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(key, error = %e, "Discarding unreadable state payload");
                init()
            }),
            None => init(),
        };

        let state = State::new(initial);
        self.entries.insert(key.to_string(), Box::new(state.clone()));
        Ok(state)
    }

    /// Serialize every value for the client.
    ///
    /// Payload entries that were never claimed are passed through untouched.
    pub fn payload(&self) -> Result<Map<String, Value>> {
        let mut payload = self.payload.clone();
        for (key, entry) in &self.entries {
            let value = entry.to_json().map_err(|e| GeoError::StateSerialization {
                key: key.clone(),
                message: e.to_string(),
            })?;
            payload.insert(key.clone(), value);
        }
        Ok(payload)
    }

    /// [`payload`](Self::payload) as a JSON string.
    pub fn payload_string(&self) -> Result<String> {
        let payload = self.payload()?;
        serde_json::to_string(&payload).map_err(|e| GeoError::StateSerialization {
            key: String::new(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_init_runs_once() {
        let mut store = StateStore::new();
        let mut calls = 0;

        let first = store
            .use_state("count", || {
                calls += 1;
                1u32
            })
            .unwrap();
        let second = store.use_state("count", || 2u32).unwrap();

        assert_eq!(calls, 1);
        assert!(first.ptr_eq(&second));
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_updates_are_shared() {
        let mut store = StateStore::new();
        let state = store.use_state("name", || "a".to_string()).unwrap();
        let mut receiver = state.subscribe();

        store
            .use_state("name", String::new)
            .unwrap()
            .set("b".to_string());
        assert_eq!(state.get(), "b");
        assert!(receiver.has_changed().unwrap());

        state.update(|name| name.push('c'));
        assert_eq!(*receiver.borrow_and_update(), "bc");
    }

    #[test]
    fn test_type_mismatch() {
        let mut store = StateStore::new();
        store.use_state("key", || 1u32).unwrap();
        let err = store.use_state("key", String::new).unwrap_err();
        assert_eq!(err, GeoError::StateType("key".to_string()));
    }

    #[test]
    fn test_payload_hydrates_client() {
        let mut server = StateStore::new();
        server.use_state("count", || 7u32).unwrap();
        let payload = server.payload_string().unwrap();

        let mut client = StateStore::hydrate_from_str(&payload).unwrap();
        let count = client.use_state("count", || 0u32).unwrap();
        assert_eq!(count.get(), 7);
    }

    #[test]
    fn test_bad_payload_entry_falls_back() {
        let mut payload = Map::new();
        payload.insert("count".to_string(), json!("not a number"));
        payload.insert("other".to_string(), json!(true));

        let mut client = StateStore::hydrate(payload);
        let count = client.use_state("count", || 3u32).unwrap();
        assert_eq!(count.get(), 3);

        let payload = client.payload().unwrap();
        assert_eq!(payload.get("count"), Some(&json!(3)));
        assert_eq!(payload.get("other"), Some(&json!(true)));
    }
}
