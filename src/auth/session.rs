//! Session context owned by the app handle

use crate::auth::types::User;
use crate::observer::ObserverRegistry;
use std::sync::{Arc, PoisonError, RwLock};

/// Value delivered to auth-state observers
pub(crate) type AuthState = Option<Arc<User>>;

/// Cached current user plus the auth-state observers of one app
pub(crate) struct Session {
    current_user: RwLock<AuthState>,
    pub(crate) observers: ObserverRegistry<AuthState>,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self {
            current_user: RwLock::new(None),
            observers: ObserverRegistry::new(),
        }
    }

    pub(crate) fn current_user(&self) -> AuthState {
        self.current_user.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Update the cache without notifying anyone
    pub(crate) fn set_current_user(&self, user: AuthState) {
        *self.current_user.write().unwrap_or_else(PoisonError::into_inner) = user;
    }

    /// Update the cache, then notify every observer
    pub(crate) fn publish(&self, user: AuthState) {
        self.set_current_user(user.clone());
        self.observers.notify(&user);
    }
}
