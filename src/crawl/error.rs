// src/crawl/error.rs
// =============================================================================
// Startup errors for a mirror run.
//
// These are the only failures a run reports. Anything that goes wrong with a
// single URL (fetch, save) is recorded in the report instead, see report.rs.
// =============================================================================

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("concurrency limit must be between 1 and the semaphore maximum, got {0}")]
    InvalidConcurrency(usize),

    #[error("admission gate was closed")]
    GateClosed,

    #[error("no valid urls provided")]
    NoSeeds,

    #[error("failed to create output directory {path}: {source}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
