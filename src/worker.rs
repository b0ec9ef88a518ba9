use std::sync::Arc;

use rand::RngCore;
use thiserror::Error;
use tracing::{info, warn};

use crate::client::StoreClient;
use crate::config::RunConfig;

const KEY_PREFIX: &str = "TestEntry";

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to connect to store: {0}")]
    Connect(#[source] anyhow::Error),
    #[error("store operation failed at record index {index}: {source}")]
    Operation {
        index: u64,
        #[source]
        source: anyhow::Error,
    },
}

/// Key for a record index. Pure: the same index always maps to the same key,
/// across threads, phases, and version repetitions.
pub fn record_key(index: u64) -> Vec<u8> {
    format!("{KEY_PREFIX}{index}").into_bytes()
}

/// Fresh random bytes for one record. Regenerated on every write, so
/// rewriting an index in a later version pass produces a different value.
pub fn random_value(record_size: usize) -> Vec<u8> {
    let mut value = vec![0u8; record_size];
    rand::thread_rng().fill_bytes(&mut value);
    value
}

/// Executes one phase's work over one partition, through a store connection
/// it owns exclusively.
pub struct Worker<C> {
    client: C,
    cfg: Arc<RunConfig>,
    thread_index: usize,
}

impl<C: StoreClient> Worker<C> {
    pub fn new(client: C, cfg: Arc<RunConfig>, thread_index: usize) -> Self {
        Self {
            client,
            cfg,
            thread_index,
        }
    }

    /// Writes the worker's partition in batches of `batch_size`. A partition
    /// whose size is not a multiple of the batch size gets a final short
    /// batch; the worker never writes outside its own index range.
    ///
    /// Stops at the first store error, leaving already-written batches in
    /// place.
    pub async fn write_partition(&self) -> Result<(), WorkerError> {
        let range = self.cfg.partition(self.thread_index);
        let batch_size = self.cfg.batch_size as u64;

        let mut index = range.start;
        while index < range.end {
            let chunk = batch_size.min(range.end - index);
            let mut keys = Vec::with_capacity(chunk as usize);
            let mut values = Vec::with_capacity(chunk as usize);
            for i in index..index + chunk {
                keys.push(record_key(i));
                values.push(random_value(self.cfg.record_size));
            }
            self.client
                .batch_put(keys, values)
                .await
                .map_err(|source| WorkerError::Operation { index, source })?;
            index += chunk;
        }

        info!(
            thread_index = self.thread_index,
            start_index = range.start,
            end_index = range.end,
            "thread finished batch write"
        );
        Ok(())
    }

    /// Deletes the worker's partition one key at a time. Stops at the first
    /// store error.
    pub async fn delete_partition(&self) -> Result<(), WorkerError> {
        let range = self.cfg.partition(self.thread_index);
        for index in range.clone() {
            self.client
                .delete(record_key(index))
                .await
                .map_err(|source| WorkerError::Operation { index, source })?;
        }

        info!(
            thread_index = self.thread_index,
            start_index = range.start,
            end_index = range.end,
            "thread finished deletion"
        );
        Ok(())
    }

    /// Closes the connection. Called on every exit path; a close failure is
    /// logged rather than propagated so it cannot mask an operation error.
    pub async fn release(self) {
        if let Err(error) = self.client.close().await {
            warn!(thread_index = self.thread_index, %error, "error closing store connection");
        }
    }
}
