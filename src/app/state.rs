//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::matches::MatchService;
use crate::store::{MatchStore, MemoryMatchStore, SupabaseClient, SupabaseMatchStore};
use crate::util::rate_limit::{create_match_limiter, MatchLimiter};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub matches: Arc<MatchService>,
    pub score_limiter: Arc<MatchLimiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        // Supabase when configured, otherwise an in-process store
        let store = match &config.supabase {
            Some(supabase) => MatchStore::Supabase(SupabaseMatchStore::new(SupabaseClient::new(
                &supabase.url,
                &supabase.service_role_key,
            ))),
            None => MatchStore::Memory(MemoryMatchStore::new()),
        };

        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: MatchStore) -> Self {
        let score_limiter = create_match_limiter(config.score_rate_limit);

        Self {
            config: Arc::new(config),
            matches: Arc::new(MatchService::new(store)),
            score_limiter,
        }
    }
}
