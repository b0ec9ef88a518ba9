use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::client::Connector;
use crate::config::RunConfig;
use crate::worker::{Worker, WorkerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Load,
    Delete,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::Load => "load",
            Phase::Delete => "delete",
        }
    }
}

/// Outcome of one fan-out-and-join cycle. Every spawned worker is accounted
/// for in exactly one of the two counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: Phase,
    pub succeeded: usize,
    pub failed: usize,
}

impl PhaseReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Runs the whole job: the load phase `version_count` times back to back,
/// then the delete phase once. Phases never overlap; each one joins all of
/// its workers before the next starts.
///
/// Worker failures are contained per partition and reflected in the returned
/// reports; they never abort a phase or the run.
pub async fn execute<C: Connector>(
    connector: &C,
    cfg: Arc<RunConfig>,
    version_count: usize,
) -> Vec<PhaseReport> {
    let mut reports = Vec::with_capacity(version_count + 1);
    for round in 0..version_count {
        info!(round, version_count, "starting load phase");
        reports.push(run_phase(connector, cfg.clone(), Phase::Load).await);
    }
    info!("starting delete phase");
    reports.push(run_phase(connector, cfg.clone(), Phase::Delete).await);
    reports
}

/// One parallel fan-out over all partitions. Spawns one task per thread
/// index and always waits for every task to reach a terminal state.
pub async fn run_phase<C: Connector>(
    connector: &C,
    cfg: Arc<RunConfig>,
    phase: Phase,
) -> PhaseReport {
    let handles: Vec<JoinHandle<Result<(), WorkerError>>> = (0..cfg.threads)
        .map(|thread_index| {
            let connector = connector.clone();
            let cfg = cfg.clone();
            tokio::task::spawn(async move {
                run_worker(&connector, cfg, thread_index, phase).await
            })
        })
        .collect();

    let mut report = PhaseReport {
        phase,
        succeeded: 0,
        failed: 0,
    };
    for (thread_index, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(Ok(())) => report.succeeded += 1,
            Ok(Err(err)) => {
                error!(thread_index, error = %err, phase = phase.name(), "worker failed");
                report.failed += 1;
            }
            Err(join_err) => {
                error!(thread_index, error = %join_err, phase = phase.name(), "worker panicked");
                report.failed += 1;
            }
        }
    }

    info!(
        phase = phase.name(),
        succeeded = report.succeeded,
        failed = report.failed,
        "phase complete"
    );
    report
}

/// acquire -> operate -> release, with the connection released on both the
/// success and the failure path.
async fn run_worker<C: Connector>(
    connector: &C,
    cfg: Arc<RunConfig>,
    thread_index: usize,
    phase: Phase,
) -> Result<(), WorkerError> {
    let client = connector
        .connect(&cfg.store_address)
        .await
        .map_err(WorkerError::Connect)?;
    let worker = Worker::new(client, cfg, thread_index);
    let result = match phase {
        Phase::Load => worker.write_partition().await,
        Phase::Delete => worker.delete_partition().await,
    };
    worker.release().await;
    result
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::Result;
    use async_trait::async_trait;

    use super::*;
    use crate::memory::{MemClient, MemConnector};
    use crate::worker::record_key;

    fn scenario_config() -> Arc<RunConfig> {
        // 100 MB of 100 KB records over 4 threads: 1000 records, 250 per
        // thread, 25 batches of 10 per worker.
        Arc::new(RunConfig::new("mem", 0.1, 4, 100_000, 10).unwrap())
    }

    #[tokio::test]
    async fn single_version_run_writes_then_deletes_every_record() {
        let cfg = scenario_config();
        assert_eq!(cfg.record_count, 1000);
        assert_eq!(cfg.records_per_thread, 250);

        let connector = MemConnector::new();
        let load = run_phase(&connector, cfg.clone(), Phase::Load).await;
        assert_eq!(load.succeeded, 4);
        assert!(load.all_succeeded());

        // 25 batches per worker, 100 in total, all 1000 keys present.
        assert_eq!(connector.stats().batch_puts.load(Ordering::Relaxed), 100);
        assert_eq!(connector.len(), 1000);
        for index in 0..1000 {
            assert!(connector.get(&record_key(index)).is_some());
        }

        let delete = run_phase(&connector, cfg, Phase::Delete).await;
        assert!(delete.all_succeeded());
        assert_eq!(connector.stats().deletes.load(Ordering::Relaxed), 1000);
        assert!(connector.is_empty());
    }

    #[tokio::test]
    async fn version_repetitions_rewrite_the_same_key_range() {
        let cfg = scenario_config();
        let connector = MemConnector::new();

        let reports = execute(&connector, cfg, 3).await;
        assert_eq!(reports.len(), 4);
        assert_eq!(reports[0].phase, Phase::Load);
        assert_eq!(reports[2].phase, Phase::Load);
        assert_eq!(reports[3].phase, Phase::Delete);
        assert!(reports.iter().all(PhaseReport::all_succeeded));

        // Three load passes over the same 100 batches per pass, one delete
        // pass over the 1000 keys.
        assert_eq!(connector.stats().batch_puts.load(Ordering::Relaxed), 300);
        assert_eq!(connector.stats().deletes.load(Ordering::Relaxed), 1000);
        assert!(connector.is_empty());
    }

    #[tokio::test]
    async fn every_worker_gets_and_releases_its_own_connection() {
        let cfg = scenario_config();
        let connector = MemConnector::new();
        execute(&connector, cfg, 2).await;

        // 4 workers per phase, 2 load phases + 1 delete phase.
        assert_eq!(connector.stats().connects.load(Ordering::Relaxed), 12);
        assert_eq!(connector.stats().closes.load(Ordering::Relaxed), 12);
    }

    /// Refuses the first N connection attempts, then delegates to the
    /// in-memory backend.
    #[derive(Clone)]
    struct FlakyConnector {
        inner: MemConnector,
        refusals_left: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Connector for FlakyConnector {
        type Client = MemClient;

        async fn connect(&self, address: &str) -> Result<MemClient> {
            let left = self.refusals_left.load(Ordering::SeqCst);
            if left > 0
                && self
                    .refusals_left
                    .compare_exchange(left, left - 1, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
            {
                anyhow::bail!("store unreachable at {address}");
            }
            self.inner.connect(address).await
        }
    }

    #[tokio::test]
    async fn connect_failure_is_isolated_to_one_worker() {
        let cfg = scenario_config();
        let connector = FlakyConnector {
            inner: MemConnector::new(),
            refusals_left: Arc::new(AtomicUsize::new(1)),
        };

        let report = run_phase(&connector, cfg.clone(), Phase::Load).await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.succeeded, 3);

        // The failed worker contributed nothing; the other three wrote their
        // full partitions.
        let stats = connector.inner.stats();
        assert_eq!(stats.batch_puts.load(Ordering::Relaxed), 75);
        assert_eq!(connector.inner.len(), 750);
        assert_eq!(stats.closes.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn failed_delete_worker_leaves_only_its_partition_behind() {
        let cfg = scenario_config();
        let connector = MemConnector::new();
        run_phase(&connector, cfg.clone(), Phase::Load).await;

        // A delete pass against a connector that refuses one worker still
        // clears the other partitions.
        let flaky = FlakyConnector {
            inner: connector,
            refusals_left: Arc::new(AtomicUsize::new(1)),
        };
        let report = run_phase(&flaky, cfg, Phase::Delete).await;
        assert_eq!(report.failed, 1);
        assert_eq!(flaky.inner.len(), 250);
    }
}
