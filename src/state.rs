use crate::application::cache_store::CacheStore;
use crate::application::wizard::Wizard;
use crate::domain::error::WizardError;
use crate::domain::traits::{BlobStore, Clock, QuoteProvider, ResearchService};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::config::{get_spool_dir, Config};
use crate::infrastructure::network::http::create_client;
use crate::infrastructure::network::quote::{NaverQuoteClient, NoQuotes};
use crate::infrastructure::spool::SpoolResearchService;
use crate::infrastructure::storage::sqlite::SqliteBlobStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_rusqlite::Connection;

/// Collaborators shared by every command.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub blobs: Arc<dyn BlobStore>,
    pub clock: Arc<dyn Clock>,
    pub research: Arc<dyn ResearchService>,
    pub quotes: Arc<dyn QuoteProvider>,
}

impl AppState {
    pub fn new(db: Connection, config: Config) -> Result<Self, WizardError> {
        let quotes: Arc<dyn QuoteProvider> = if config.quotes.enable {
            let http_client = create_client(Duration::from_secs(config.quotes.timeout_secs))?;
            Arc::new(NaverQuoteClient::new(
                http_client,
                config.quotes.endpoint.clone(),
            ))
        } else {
            Arc::new(NoQuotes)
        };

        Ok(Self {
            blobs: Arc::new(SqliteBlobStore::new(db)),
            clock: Arc::new(SystemClock),
            research: Arc::new(SpoolResearchService::new(get_spool_dir(&config))),
            quotes,
            config: Arc::new(config),
        })
    }

    /// Loads the cache and builds a wizard over it.
    pub async fn wizard(&self) -> Wizard {
        let cache = &self.config.cache;
        let store = CacheStore::load(
            self.blobs.clone(),
            self.clock.clone(),
            cache.namespace.clone(),
            cache.prune_window(),
        )
        .await;
        Wizard::new(store, cache.subject_window(), cache.scan_window())
    }
}
