mod args;
mod backend;
mod client;
mod config;
mod memory;
mod run;
#[cfg(feature = "surrealkv")]
mod surrealkv;
mod worker;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::backend::Backend;
use crate::config::RunConfig;
use crate::memory::MemConnector;
use crate::run::PhaseReport;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = match RunConfig::new(
        &args.addr,
        args.size,
        args.thread,
        args.record_size,
        args.batch_size,
    ) {
        Ok(cfg) => Arc::new(cfg),
        Err(err) => {
            error!(error = %err, "failed to create run config");
            return ExitCode::FAILURE;
        }
    };

    let runtime = configure_runtime();
    let reports = runtime.block_on(async {
        match args.backend {
            Backend::Memory => {
                let connector = MemConnector::new();
                run::execute(&connector, cfg, args.version_count).await
            }
            #[cfg(feature = "surrealkv")]
            Backend::Surrealkv => {
                let connector = match surrealkv::SurrealKvConnector::open(&cfg.store_address) {
                    Ok(connector) => connector,
                    Err(err) => {
                        error!(error = %err, "failed to open surrealkv store");
                        return Vec::new();
                    }
                };
                run::execute(&connector, cfg, args.version_count).await
            }
        }
    });

    // Worker failures are already in the logs and the reports; the run is
    // best effort and still exits 0 once every phase has joined.
    summarize(&reports);
    ExitCode::SUCCESS
}

fn configure_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
}

fn summarize(reports: &[PhaseReport]) {
    for report in reports {
        info!(
            phase = ?report.phase,
            succeeded = report.succeeded,
            failed = report.failed,
            "phase report"
        );
    }
    let failed: usize = reports.iter().map(|r| r.failed).sum();
    if failed > 0 {
        info!(failed, "run completed with failed partitions");
    } else {
        info!("run completed");
    }
}
