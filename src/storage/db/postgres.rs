//! PostgreSQL backend using sqlx.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool as SqlxPool, PgPoolOptions};

use crate::storage::StorageError;

/// Queries run strictly one after another, so one connection is enough.
const MAX_CONNECTIONS: u32 = 1;

/// Default connection acquire timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// PostgreSQL connection pool wrapper.
#[derive(Clone)]
pub struct PgPool {
    inner: SqlxPool,
}

impl std::fmt::Debug for PgPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgPool").finish_non_exhaustive()
    }
}

impl PgPool {
    /// Connect to the annotation store.
    ///
    /// # Arguments
    ///
    /// * `url` - PostgreSQL URL, e.g. `postgres://apollo:secret@db/apollo`
    /// * `acquire_timeout` - how long to wait for the connection
    pub async fn connect(url: &str, acquire_timeout: Duration) -> Result<Self, StorageError> {
        let options =
            PgConnectOptions::from_str(url).map_err(|e| StorageError::InvalidUrl(e.to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;

        Ok(Self { inner: pool })
    }

    /// Get the underlying sqlx pool for direct query execution.
    #[inline]
    pub fn inner(&self) -> &SqlxPool {
        &self.inner
    }

    /// Close the connection pool gracefully.
    pub async fn close(&self) {
        self.inner.close().await;
    }
}
