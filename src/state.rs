use std::sync::Arc;

use crate::config::Config;
use crate::error::AppResult;
use crate::models::Dataset;
use crate::services::csv_loader;

/// Shared, read-only application state.
///
/// The dataset is not kept here: every render reads the CSV again so the
/// dashboard always reflects the file on disk.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn load_dataset(&self) -> AppResult<Dataset> {
        csv_loader::load_csv(&self.config.csv_path)
    }
}
