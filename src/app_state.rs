// Application state shared across request handlers.

use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::sessions::{MemorySessionStore, SessionStore};
use crate::store::Db;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub db: Db,
    /// Injected so a multi-process deployment can plug in an external
    /// registry; the default is the in-memory single-instance store.
    pub sessions: Arc<dyn SessionStore>,
    pub auth: TokenIssuer,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let db = match &config.state_file {
            Some(path) => Db::load_or_default(path),
            None => Db::new(),
        };
        Self::with_parts(config, db, Arc::new(MemorySessionStore::new()))
    }

    pub fn with_parts(config: Config, db: Db, sessions: Arc<dyn SessionStore>) -> Self {
        let auth = TokenIssuer::new(&config);
        Self { db, sessions, auth, config }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }
}
