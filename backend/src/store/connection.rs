//! Lazily established, reusable store connection.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::StoreError;

/// Knows how to open a connection and whether an open one is still usable.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Clone + Send + Sync;

    async fn connect(&self) -> Result<Self::Connection, StoreError>;

    /// Inspects local state only; must not talk to the server.
    fn is_ready(&self, connection: &Self::Connection) -> bool;
}

/// Holds at most one connection, opened on first use.
///
/// A cached connection is handed out again as long as
/// [`Connector::is_ready`] accepts it; otherwise a new one replaces it.
/// Callers arriving while a connection is being opened wait for that attempt.
pub struct LazyConnection<C: Connector> {
    connector: C,
    connect_timeout: Duration,
    slot: Mutex<Option<C::Connection>>,
}

impl<C: Connector> LazyConnection<C> {
    pub fn new(connector: C, connect_timeout: Duration) -> Self {
        Self {
            connector,
            connect_timeout,
            slot: Mutex::new(None),
        }
    }

    pub async fn get(&self) -> Result<C::Connection, StoreError> {
        let mut slot = self.slot.lock().await;
        if let Some(connection) = slot.as_ref() {
            if self.connector.is_ready(connection) {
                return Ok(connection.clone());
            }
            warn!("cached store connection is not ready, reconnecting");
            *slot = None;
        }

        let connection = tokio::time::timeout(self.connect_timeout, self.connector.connect())
            .await
            .map_err(|_| StoreError::Timeout(self.connect_timeout))??;
        debug!("store connection cached");
        *slot = Some(connection.clone());
        Ok(connection)
    }

    pub async fn is_cached(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}
