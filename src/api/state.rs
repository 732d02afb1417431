use std::sync::Arc;

use crate::auth::AuthService;
use crate::services::{EventCatalog, GeminiClient, Pipeline, ProfileStore, Recommender, TextGenerator};
use crate::store::{KeyedStore, MemoryStore};

/// Shared application state: the adapter stack over one keyed store
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub profiles: Arc<ProfileStore>,
    pub catalog: Arc<EventCatalog>,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Wires the services over the given store and text-generation backend
    pub fn new(store: Arc<dyn KeyedStore>, generator: Arc<dyn TextGenerator>) -> Self {
        let auth = Arc::new(AuthService::new(store.clone()));
        let profiles = Arc::new(ProfileStore::new(store.clone()));
        let catalog = Arc::new(EventCatalog::new(store));
        let recommender = Arc::new(Recommender::new(profiles.clone(), generator));
        let pipeline = Arc::new(Pipeline::new(profiles.clone(), catalog.clone(), recommender));

        Self {
            auth,
            profiles,
            catalog,
            pipeline,
        }
    }

    /// In-memory state with no text-generation key (always falls back);
    /// used by tests and keyless development runs
    pub fn in_memory() -> Self {
        let generator = Arc::new(GeminiClient::new(
            None,
            "http://localhost:0".to_string(),
        ));
        Self::new(Arc::new(MemoryStore::new()), generator)
    }
}
