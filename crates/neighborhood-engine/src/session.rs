use std::sync::{PoisonError, RwLock};

use tracing::info;

use neighborhood_types::models::User;

/// Session-scoped storage for the logged-in user.
pub trait SessionStore: Send + Sync {
    fn get_current(&self) -> Option<User>;
    fn set_current(&self, user: &User);
    fn clear_current(&self);
}

#[derive(Default)]
pub struct MemorySessionStore {
    current: RwLock<Option<User>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get_current(&self) -> Option<User> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_current(&self, user: &User) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(user.clone());
    }

    fn clear_current(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// The current user, owned by whoever drives the orchestrator.
///
/// Loaded once at start, saved on login and profile edits, cleared on logout.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    /// Restore whatever the store holds at app start.
    pub fn load(store: &dyn SessionStore) -> Self {
        let user = store.get_current();
        if let Some(user) = &user {
            info!("Restored session for {} ({})", user.username, user.id);
        }
        Self { user }
    }

    pub fn login(&mut self, user: User, store: &dyn SessionStore) {
        info!("{} ({}) logged in", user.username, user.id);
        self.save(user, store);
    }

    /// Replace the current user after a profile edit.
    pub fn update(&mut self, user: User, store: &dyn SessionStore) {
        self.save(user, store);
    }

    /// Clear the session. Returns the user that was logged in, if any.
    pub fn logout(&mut self, store: &dyn SessionStore) -> Option<User> {
        store.clear_current();
        let previous = self.user.take();
        if let Some(user) = &previous {
            info!("{} ({}) logged out", user.username, user.id);
        }
        previous
    }

    pub fn current(&self) -> Option<&User> {
        self.user.as_ref()
    }

    fn save(&mut self, user: User, store: &dyn SessionStore) {
        store.set_current(&user);
        self.user = Some(user);
    }
}
