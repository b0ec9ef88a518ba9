use std::ops::Range;

use thiserror::Error;
use tracing::info;

/// Anything below 100 MB is too small to tell us anything about the store's
/// write or compaction behavior.
const MIN_DATA_SIZE_BYTES: u64 = 100_000_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("data size too small ({bytes} bytes), please request at least 100MB")]
    DataSizeTooSmall { bytes: u64 },
}

/// Immutable parameters for one run, derived once at startup and shared by
/// every worker.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub store_address: String,
    pub target_bytes: u64,
    pub threads: usize,
    pub record_size: usize,
    pub batch_size: usize,
    pub record_count: u64,
    pub records_per_thread: u64,
}

impl RunConfig {
    /// Derives the record counts from the requested data volume. Integer
    /// division truncates twice: `record_count % threads` trailing indices
    /// are never assigned to any partition.
    ///
    /// Only the data volume is validated; `threads`, `record_size` and
    /// `batch_size` are expected to be sane (the CLI defaults are).
    pub fn new(
        store_address: impl Into<String>,
        size_gb: f64,
        threads: usize,
        record_size: usize,
        batch_size: usize,
    ) -> Result<Self, ConfigError> {
        let target_bytes = (size_gb * 1e9) as u64;
        if target_bytes < MIN_DATA_SIZE_BYTES {
            return Err(ConfigError::DataSizeTooSmall {
                bytes: target_bytes,
            });
        }

        let record_count = target_bytes / record_size as u64;
        let records_per_thread = record_count / threads as u64;
        let cfg = Self {
            store_address: store_address.into(),
            target_bytes,
            threads,
            record_size,
            batch_size,
            record_count,
            records_per_thread,
        };

        info!(
            store_address = %cfg.store_address,
            target_bytes = cfg.target_bytes,
            threads = cfg.threads,
            record_size = cfg.record_size,
            batch_size = cfg.batch_size,
            record_count = cfg.record_count,
            records_per_thread = cfg.records_per_thread,
            "generated run config"
        );
        Ok(cfg)
    }

    /// The half-open index range owned exclusively by `thread_index`.
    pub fn partition(&self, thread_index: usize) -> Range<u64> {
        let start = thread_index as u64 * self.records_per_thread;
        start..start + self.records_per_thread
    }
}
