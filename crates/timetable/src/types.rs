/// Shared application state
use crate::config::AppConfig;
use crate::db::{TimetableDb, TimetableStore};
use crate::error::TimetableError;
use crate::import::{PeriodIngestor, RecognizerClient};
use std::sync::Arc;

/// State shared by every request handler.
pub struct AppState {
    /// Where subjects and periods live
    pub store: Arc<dyn TimetableStore>,
    /// Client for the image recognizer
    pub recognizer: RecognizerClient,
    /// Resolves recognized labels and writes periods
    pub ingestor: PeriodIngestor,
}

impl AppState {
    /// Builds the state from configuration, opening the SQLite database.
    pub fn from_config(config: &AppConfig) -> Result<Self, TimetableError> {
        let db = TimetableDb::open(&config.db_path)?;
        Self::with_store(Arc::new(db), config)
    }

    /// Builds the state around an existing store.
    pub fn with_store(
        store: Arc<dyn TimetableStore>,
        config: &AppConfig,
    ) -> Result<Self, TimetableError> {
        Ok(Self {
            store,
            recognizer: RecognizerClient::new(&config.recognizer)?,
            ingestor: PeriodIngestor::default(),
        })
    }
}
