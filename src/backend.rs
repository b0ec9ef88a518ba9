use clap::ValueEnum;

/// Store implementation to aim the run at.
#[derive(ValueEnum, Debug, Clone)]
pub enum Backend {
    /// In-process map; a dry run that exercises only the generator itself.
    Memory,
    #[cfg(feature = "surrealkv")]
    /// Embedded surrealkv store; the address is its on-disk directory.
    Surrealkv,
}
