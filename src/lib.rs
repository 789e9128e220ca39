pub mod algorithms;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod utils;

pub use catalog::Catalog;
pub use config::Config;
pub use error::{RecResult, RecommenderError};
pub use models::*;
pub use session::RatingSession;

use algorithms::{CoOccurrenceIndex, SimilarityModel};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Process-wide state, constructed once at start-up and shared by reference.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<Catalog>,
    pub model: Arc<dyn SimilarityModel>,
    pub serving_service: Arc<services::serving::ServingService>,
}

impl AppState {
    /// Loads the catalog and, when configured, the transaction log named in
    /// `config`.
    pub fn load(config: Config) -> Result<Self> {
        config.validate()?;

        let catalog = Catalog::from_path(&config.catalog.path, &config.catalog)?;

        let index = match &config.transactions.path {
            Some(path) => Some(CoOccurrenceIndex::from_path(path, &config.transactions, &catalog)?),
            None => {
                info!("No transaction log configured; recommendations are popularity based");
                None
            }
        };

        Ok(Self::from_parts(config, catalog, index))
    }

    /// Assembles state from an already-read catalog and optional index.
    pub fn from_parts(config: Config, catalog: Catalog, index: Option<CoOccurrenceIndex>) -> Self {
        let config = Arc::new(config);

        let basket_counts = index.as_ref().map(CoOccurrenceIndex::basket_counts);
        let catalog = Arc::new(catalog.resolve_popularity(&config.catalog, basket_counts.as_ref()));

        let model = algorithms::build_model(&config.recommendation, index);

        let serving_service = Arc::new(services::serving::ServingService::new(
            catalog.clone(),
            model.clone(),
            config.clone(),
        ));

        Self {
            config,
            catalog,
            model,
            serving_service,
        }
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
