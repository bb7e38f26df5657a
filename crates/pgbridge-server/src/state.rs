//! Shared application state.

use pgbridge::Pool;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
}

impl AppState {
    /// The pool connects lazily, so this succeeds even while the database is down.
    pub fn new(config: &ServerConfig) -> pgbridge::BridgeResult<Self> {
        let pool = pgbridge::create_pool_with_config(&config.database_url, config.pool_max_size)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }
}
