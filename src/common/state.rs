use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::sources::{CatalogSource, ReadingSource};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<Config>,
    pub readings: Arc<dyn ReadingSource>,
    pub catalog: Arc<dyn CatalogSource>,
    /// Held for the duration of a run; at most one run executes at a time.
    pub run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Config,
        readings: Arc<dyn ReadingSource>,
        catalog: Arc<dyn CatalogSource>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            readings,
            catalog,
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}
