use std::sync::Arc;

use log::info;

use crate::config::Settings;

#[cfg(test)]
pub(crate) mod memory;
pub mod models;
pub mod postgres;
mod store;

pub use postgres::PostgresClient;
pub use store::VideoStore;

/// Database handle shared by the scrape cycle and the report binary.
///
/// PostgreSQL holds one row per tracked video, including the serialized
/// trend series for each metric.
#[derive(Clone)]
pub struct Database {
    pub postgres: Arc<PostgresClient>,
}

impl Database {
    pub async fn new(settings: Arc<Settings>) -> anyhow::Result<Self> {
        let postgres = PostgresClient::new(settings.postgres.clone()).await?;

        // Run migrations
        postgres.migrate().await?;

        info!("Database ready");

        Ok(Self {
            postgres: Arc::new(postgres),
        })
    }
}
