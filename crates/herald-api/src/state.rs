use std::sync::Arc;

use herald_auth::TokenKeys;
use herald_db::Database;
use herald_gateway::ConnectionRegistry;

use crate::dispatcher::NotificationDispatcher;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub keys: TokenKeys,
    pub registry: ConnectionRegistry,
    pub dispatcher: NotificationDispatcher,
}

impl AppStateInner {
    /// Wire the store, token keys and a fresh connection registry together.
    pub fn new(db: Database, keys: TokenKeys) -> AppState {
        let db = Arc::new(db);
        let registry = ConnectionRegistry::new();
        let dispatcher = NotificationDispatcher::new(db.clone(), registry.clone());
        Arc::new(Self {
            db,
            keys,
            registry,
            dispatcher,
        })
    }
}
