use std::sync::Arc;

use crate::{services::resource_service::ResourceService, store::sqlite::SqliteStore};

/// Shared handler state. Cloned per request; everything inside is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub resources: ResourceService,
    pub store: SqliteStore,
}

impl AppState {
    /// Wire the service to a SQLite store that also resolves access tokens.
    pub fn new(store: SqliteStore) -> Self {
        let shared = Arc::new(store.clone());
        Self {
            resources: ResourceService::new(shared.clone(), shared),
            store,
        }
    }
}
