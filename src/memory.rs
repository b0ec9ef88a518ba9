use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::client::{Connector, StoreClient};

/// Per-operation call counters, shared by every connection the connector
/// hands out.
#[derive(Debug, Default)]
pub struct MemStats {
    pub connects: AtomicUsize,
    pub puts: AtomicUsize,
    pub batch_puts: AtomicUsize,
    pub deletes: AtomicUsize,
    pub closes: AtomicUsize,
}

/// In-process store backend. Useful as a dry run target when no real store
/// is at hand, and as the harness the phase tests assert against: the
/// counters record exactly how many calls of each kind the run issued.
#[derive(Clone, Default)]
pub struct MemConnector {
    records: Arc<DashMap<Vec<u8>, Vec<u8>>>,
    stats: Arc<MemStats>,
}

impl MemConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &MemStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.records.get(key).map(|v| v.value().clone())
    }
}

#[async_trait]
impl Connector for MemConnector {
    type Client = MemClient;

    async fn connect(&self, _address: &str) -> Result<MemClient> {
        self.stats.connects.fetch_add(1, Ordering::Relaxed);
        Ok(MemClient {
            records: self.records.clone(),
            stats: self.stats.clone(),
        })
    }
}

pub struct MemClient {
    records: Arc<DashMap<Vec<u8>, Vec<u8>>>,
    stats: Arc<MemStats>,
}

#[async_trait]
impl StoreClient for MemClient {
    async fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.stats.puts.fetch_add(1, Ordering::Relaxed);
        self.records.insert(key, value);
        Ok(())
    }

    async fn batch_put(&self, keys: Vec<Vec<u8>>, values: Vec<Vec<u8>>) -> Result<()> {
        anyhow::ensure!(
            keys.len() == values.len(),
            "batch_put called with {} keys but {} values",
            keys.len(),
            values.len()
        );
        self.stats.batch_puts.fetch_add(1, Ordering::Relaxed);
        for (key, value) in keys.into_iter().zip(values) {
            self.records.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, key: Vec<u8>) -> Result<()> {
        self.stats.deletes.fetch_add(1, Ordering::Relaxed);
        self.records.remove(&key);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.stats.closes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
