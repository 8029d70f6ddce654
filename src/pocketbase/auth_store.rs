//! PocketBase auth store
//!
//! Holds the current auth token and account record, and notifies change
//! listeners on every `save`/`clear`.

use super::Record;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Callback invoked with the new token and model after every change
pub type ChangeListener = Arc<dyn Fn(&str, Option<&Record>) + Send + Sync + 'static>;

/// Identifier returned by [`AuthStore::on_change`]
pub type ChangeListenerId = u64;

#[derive(Default)]
struct StoreState {
    token: String,
    model: Option<Record>,
}

#[derive(Default)]
struct Listeners {
    next_id: ChangeListenerId,
    entries: BTreeMap<ChangeListenerId, ChangeListener>,
}

/// Token and account record shared by every request of a client
#[derive(Clone, Default)]
pub struct AuthStore {
    state: Arc<RwLock<StoreState>>,
    listeners: Arc<Mutex<Listeners>>,
}

impl AuthStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Current token (empty when signed out)
    pub fn token(&self) -> String {
        self.state.read().unwrap_or_else(PoisonError::into_inner).token.clone()
    }

    /// Current account record, if the token came with one
    pub fn model(&self) -> Option<Record> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).model.clone()
    }

    /// Whether the store holds a token that has not expired
    ///
    /// Tokens without a readable JWT `exp` claim count as invalid.
    pub fn is_valid(&self) -> bool {
        let token = self.token();
        if token.is_empty() {
            return false;
        }
        let Some(exp) = token_expiry(&token) else {
            return false;
        };
        exp > chrono::Utc::now().timestamp()
    }

    /// Replace token and model, then notify listeners
    pub fn save(&self, token: impl Into<String>, model: Option<Record>) {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.token = token.into();
            state.model = model;
        }
        self.trigger_change();
    }

    /// Drop token and model, then notify listeners
    pub fn clear(&self) {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.token.clear();
            state.model = None;
        }
        self.trigger_change();
    }

    /// Register a change listener
    pub fn on_change<F>(&self, listener: F) -> ChangeListenerId
    where
        F: Fn(&str, Option<&Record>) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.insert(id, Arc::new(listener));
        id
    }

    /// Remove a change listener; returns whether it was registered
    pub fn remove_listener(&self, id: ChangeListenerId) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .remove(&id)
            .is_some()
    }

    /// Number of registered change listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    fn trigger_change(&self) {
        let (token, model) = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            (state.token.clone(), state.model.clone())
        };
        // Snapshot the listeners so callbacks may (un)register freely
        let listeners: Vec<ChangeListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(&token, model.as_ref());
        }
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("token", &"<redacted>")
            .field("has_model", &self.model().is_some())
            .finish()
    }
}

/// Read the `exp` claim from a JWT without verifying it
fn token_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}

#[cfg(test)]
pub(crate) fn test_token(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::json!({ "id": "u1", "exp": exp }).to_string());
    format!("{}.{}.signature", header, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_empty_store_is_invalid() {
        let store = AuthStore::new();
        assert!(!store.is_valid());
        assert!(store.model().is_none());
    }

    #[test]
    fn test_unexpired_jwt_is_valid() {
        let store = AuthStore::new();
        store.save(test_token(chrono::Utc::now().timestamp() + 3600), None);
        assert!(store.is_valid());
    }

    #[test]
    fn test_expired_or_opaque_token_is_invalid() {
        let store = AuthStore::new();
        store.save(test_token(chrono::Utc::now().timestamp() - 10), None);
        assert!(!store.is_valid());

        store.save("not-a-jwt", None);
        assert!(!store.is_valid());
        assert_eq!(store.token(), "not-a-jwt");
    }

    #[test]
    fn test_clear_notifies_with_empty_token() {
        let store = AuthStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        store.on_change(move |token, model| {
            assert!(token.is_empty());
            assert!(model.is_none());
            seen.fetch_add(1, Ordering::SeqCst);
        });

        store.clear();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_removed_listener_not_called() {
        let store = AuthStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let id = store.on_change(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.remove_listener(id));
        assert!(!store.remove_listener(id));
        store.save("token", None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.listener_count(), 0);
    }
}
