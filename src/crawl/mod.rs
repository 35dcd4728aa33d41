// src/crawl/mod.rs
// =============================================================================
// This module mirrors websites to disk.
//
// Features:
// - One breadth-first worker per seed URL
// - A global admission gate bounding concurrent work (per seed or per fetch)
// - A visited set shared by all workers, so each URL is fetched at most once
// - Same-site links rewritten to local paths for offline browsing
// - Broken links are reported and skipped, never fatal
//
// Submodules:
// - gate: the admission gate
// - visited: the shared visited set
// - worker: the per-seed crawl loop
// - orchestrator: starts workers and collects the report
// - report: saved/skipped bookkeeping
// =============================================================================

mod error;
mod gate;
mod orchestrator;
mod report;
mod visited;
mod worker;

// Re-export the public API so callers can write `crawl::Mirror`
pub use error::MirrorError;
pub use gate::{AdmissionGate, GatePermit, GateScope};
pub use orchestrator::{
    Mirror, MirrorConfig, DEFAULT_CONCURRENCY, DEFAULT_OUTPUT_DIR, DEFAULT_TIMEOUT_SECS,
};
pub use report::{MirrorEvent, MirrorReport, Phase, SavedResource, SkippedResource};
pub use visited::VisitedSet;
