use std::sync::Arc;

use crate::db::{MemoryStorage, Storage};
use crate::services::{AffinityIndex, FriendshipLedger, RecommendationEngine};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub ledger: FriendshipLedger,
    pub recommender: RecommendationEngine,
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl AppState {
    /// Wires the ledger and the recommendation engine to one store
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            ledger: FriendshipLedger::new(storage.clone()),
            recommender: RecommendationEngine::new(AffinityIndex::new(storage.clone())),
            storage,
        }
    }

    /// State backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }
}
