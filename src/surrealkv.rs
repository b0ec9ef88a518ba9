use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::client::{Connector, StoreClient};

/// Embedded surrealkv backend. The store address is the on-disk directory
/// of the store; the connector opens it once and every worker connection
/// shares the same instance.
#[derive(Clone)]
pub struct SurrealKvConnector {
    db: Arc<surrealkv::Store>,
}

impl SurrealKvConnector {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let mut opts = surrealkv::Options::new();
        opts.enable_versions = false;
        opts.disk_persistence = true;
        opts.dir = dir.into();

        let db = Arc::new(surrealkv::Store::new(opts)?);
        Ok(Self { db })
    }
}

#[async_trait]
impl Connector for SurrealKvConnector {
    type Client = SurrealKvClient;

    async fn connect(&self, _address: &str) -> Result<SurrealKvClient> {
        Ok(SurrealKvClient {
            db: self.db.clone(),
        })
    }
}

pub struct SurrealKvClient {
    db: Arc<surrealkv::Store>,
}

#[async_trait]
impl StoreClient for SurrealKvClient {
    async fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        let mut txn = self.db.begin_with_mode(surrealkv::Mode::ReadWrite)?;
        txn.set(&key, &value)?;
        txn.commit().await?;
        Ok(())
    }

    // One transaction per batch keeps the batch atomic.
    async fn batch_put(&self, keys: Vec<Vec<u8>>, values: Vec<Vec<u8>>) -> Result<()> {
        anyhow::ensure!(
            keys.len() == values.len(),
            "batch_put called with {} keys but {} values",
            keys.len(),
            values.len()
        );
        let mut txn = self.db.begin_with_mode(surrealkv::Mode::ReadWrite)?;
        for (key, value) in keys.iter().zip(&values) {
            txn.set(key, value)?;
        }
        txn.commit().await?;
        Ok(())
    }

    async fn delete(&self, key: Vec<u8>) -> Result<()> {
        let mut txn = self.db.begin_with_mode(surrealkv::Mode::ReadWrite)?;
        txn.delete(&key)?;
        txn.commit().await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // The store is shared by all connections and lives until the
        // connector is dropped.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::record_key;

    #[tokio::test]
    async fn writes_and_deletes_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let connector = SurrealKvConnector::open(dir.path()).unwrap();
        let client = connector.connect("unused").await.unwrap();

        let keys: Vec<_> = (0..10u64).map(record_key).collect();
        let values: Vec<_> = (0..10).map(|_| vec![7u8; 32]).collect();
        client.batch_put(keys.clone(), values).await.unwrap();

        let mut txn = connector.db.begin_with_mode(surrealkv::Mode::ReadOnly).unwrap();
        assert_eq!(txn.get(&keys[3]).unwrap(), Some(vec![7u8; 32]));
        drop(txn);

        for key in &keys {
            client.delete(key.clone()).await.unwrap();
        }
        let mut txn = connector.db.begin_with_mode(surrealkv::Mode::ReadOnly).unwrap();
        assert_eq!(txn.get(&keys[3]).unwrap(), None);
    }
}
