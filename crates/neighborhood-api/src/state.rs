use std::sync::Arc;

use tokio::sync::RwLock;

use neighborhood_engine::{IdentityStore, Orchestrator, Session, SessionStore};
use neighborhood_gateway::dispatcher::Dispatcher;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub orchestrator: Arc<Orchestrator>,
    pub dispatcher: Dispatcher,
    pub identities: Arc<dyn IdentityStore>,
    pub session_store: Arc<dyn SessionStore>,
    /// The one logged-in user of this process, if any.
    pub session: RwLock<Session>,
}

impl AppStateInner {
    /// Assemble state and restore any session the store already holds.
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        dispatcher: Dispatcher,
        identities: Arc<dyn IdentityStore>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        let session = Session::load(session_store.as_ref());
        Self {
            orchestrator,
            dispatcher,
            identities,
            session_store,
            session: RwLock::new(session),
        }
    }
}
