// src/crawl/orchestrator.rs
// =============================================================================
// Runs a whole mirror: one worker per seed, all sharing one visited set and
// one admission gate.
//
// Startup problems (bad concurrency limit, unusable output directory, HTTP
// client that won't build) fail the run before any worker starts. After that
// the run always succeeds; what went wrong with individual URLs is listed in
// the returned MirrorReport.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::gate::{AdmissionGate, GateScope};
use super::report::MirrorReport;
use super::visited::VisitedSet;
use super::worker::{crawl_seed, WorkerContext};
use super::MirrorError;
use crate::resource::Fetcher;

pub const DEFAULT_OUTPUT_DIR: &str = "result";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Everything a mirror run needs to know.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Absolute http(s) URLs to start from
    pub seeds: Vec<Url>,
    /// Root of the mirrored tree, created if missing
    pub output_dir: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
    /// Admission gate size
    pub concurrency: usize,
    /// What one gate slot bounds
    pub gate_scope: GateScope,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            gate_scope: GateScope::default(),
        }
    }
}

pub struct Mirror {
    config: MirrorConfig,
}

impl Mirror {
    pub fn new(config: MirrorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Mirrors every seed, returning once all workers are done.
    ///
    /// Cancelling `cancel` makes workers stop at their next URL (or abandon
    /// the request in flight) and stops new seeds from starting. Whatever was
    /// already written stays on disk.
    pub async fn run(&self, cancel: CancellationToken) -> Result<MirrorReport, MirrorError> {
        let config = &self.config;
        if config.seeds.is_empty() {
            return Err(MirrorError::NoSeeds);
        }

        let gate = AdmissionGate::new(config.concurrency)?;
        let fetcher = Fetcher::new(config.timeout)?;
        tokio::fs::create_dir_all(&config.output_dir)
            .await
            .map_err(|source| MirrorError::CreateOutputDir {
                path: config.output_dir.clone(),
                source,
            })?;

        let (events, mut receiver) = mpsc::unbounded_channel();
        let visited = VisitedSet::new();
        let ctx = WorkerContext {
            fetcher,
            visited: visited.clone(),
            gate: gate.clone(),
            gate_scope: config.gate_scope,
            output_dir: config.output_dir.clone(),
            cancel: cancel.clone(),
            events,
        };

        tracing::info!(
            seeds = config.seeds.len(),
            concurrency = config.concurrency,
            gate_scope = ?config.gate_scope,
            output_dir = %config.output_dir.display(),
            "Starting mirror"
        );

        let mut workers = Vec::with_capacity(config.seeds.len());
        for seed in &config.seeds {
            // In seed scope the slot is taken here and held until the worker
            // finishes, so at most `concurrency` seeds run at once
            let permit = match config.gate_scope {
                GateScope::Seed => tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::info!(seed = %seed, "Cancelled before seed started");
                        break;
                    }
                    permit = gate.acquire() => Some(permit?),
                },
                GateScope::Fetch => None,
            };

            let seed = seed.clone();
            let ctx = ctx.clone();
            workers.push(tokio::spawn(async move {
                let _permit = permit;
                let result = crawl_seed(seed.clone(), ctx).await;
                (seed, result)
            }));
        }

        // Workers hold the remaining senders; the channel closes when the
        // last one finishes
        drop(ctx);

        for joined in futures::future::join_all(workers).await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((seed, Err(e))) => tracing::error!(seed = %seed, error = %e, "Worker stopped early"),
                Err(e) => tracing::error!(error = %e, "Worker task panicked"),
            }
        }

        let mut report = MirrorReport::default();
        while let Some(event) = receiver.recv().await {
            report.record(event);
        }

        tracing::info!(
            visited = visited.len(),
            saved = report.saved.len(),
            skipped = report.skipped.len(),
            "Mirror finished"
        );

        Ok(report)
    }
}
