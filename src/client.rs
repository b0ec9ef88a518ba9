use anyhow::Result;
use async_trait::async_trait;

/// Opens store connections. One connection is handed out per worker; the
/// connector itself owns whatever is shared behind them (session state,
/// an embedded store instance, ...).
#[async_trait]
pub trait Connector: Clone + Send + Sync + 'static {
    type Client: StoreClient;

    async fn connect(&self, address: &str) -> Result<Self::Client>;
}

/// One store connection, owned exclusively by a single worker.
///
/// The store is assumed to handle retries and consistency itself; callers
/// treat every error as final.
#[async_trait]
pub trait StoreClient: Send + Sync + 'static {
    /// Write a single record.
    async fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    /// Write a group of records in one atomic call. `keys` and `values`
    /// must be the same length.
    async fn batch_put(&self, keys: Vec<Vec<u8>>, values: Vec<Vec<u8>>) -> Result<()>;

    /// Delete a single record.
    async fn delete(&self, key: Vec<u8>) -> Result<()>;

    /// Release the connection.
    async fn close(&self) -> Result<()>;
}
