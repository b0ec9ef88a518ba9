use clap::Parser;

use crate::backend::Backend;

#[derive(Parser, Debug)]
#[command(term_width = 0)]
pub struct Args {
    /// Store address (for the surrealkv backend, its data directory)
    #[arg(long, default_value = "127.0.0.1:2379")]
    pub addr: String,

    /// Size of data to write per load pass, in GB
    #[arg(long, default_value_t = 1.0)]
    pub size: f64,

    /// Number of threads executing load and delete
    #[arg(long, default_value_t = 40)]
    pub thread: usize,

    /// Size of a single record in bytes
    #[arg(long, default_value_t = 400)]
    pub record_size: usize,

    /// Number of records per batch in batch load
    #[arg(long, default_value_t = 100)]
    pub batch_size: usize,

    /// Total number of versions to write for each key
    #[arg(long, default_value_t = 1)]
    pub version_count: usize,

    /// The store backend to run against
    #[arg(long, default_value = "memory")]
    pub backend: Backend,
}
