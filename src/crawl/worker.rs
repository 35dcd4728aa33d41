// src/crawl/worker.rs
// =============================================================================
// This module mirrors one seed URL with a breadth-first crawl.
//
// How it works:
// 1. Start with the seed URL in a queue
// 2. Claim the next URL in the shared visited set (skip it if taken)
// 3. Fetch it
// 4. If it's HTML, collect same-site links and rewrite them to local paths
// 5. Save the body under <output-dir>/<seed-host>/...
// 6. Repeat until the queue is empty or the crawl is cancelled
//
// Each worker owns its queue. Workers only share the visited set, the
// admission gate and the HTTP client. A broken link is recorded and skipped,
// it never stops the worker.
//
// Rust concepts:
// - VecDeque: Double-ended queue for breadth-first crawling
// - mpsc channels: Report saved/skipped resources to the orchestrator
// =============================================================================

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::gate::{AdmissionGate, GateScope};
use super::report::{MirrorEvent, Phase, SavedResource, SkippedResource};
use super::visited::VisitedSet;
use super::MirrorError;
use crate::resource::{extract_links, local_path, FetchError, FetchedResource, Fetcher};

// Everything a worker shares with the other workers
//
// Cloning is cheap: every field is either reference counted or small.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub fetcher: Fetcher,
    pub visited: VisitedSet,
    pub gate: AdmissionGate,
    pub gate_scope: GateScope,
    pub output_dir: PathBuf,
    pub cancel: CancellationToken,
    pub events: UnboundedSender<MirrorEvent>,
}

// Crawls everything reachable from `seed` that no other worker got to first
//
// Returns once the queue is empty or the crawl is cancelled. Per-URL failures
// are reported through ctx.events, so the only error here is a broken gate.
pub async fn crawl_seed(seed: Url, ctx: WorkerContext) -> Result<(), MirrorError> {
    let mut queue = VecDeque::from([seed.clone()]);

    tracing::info!(seed = %seed, "Worker started");

    while let Some(url) = queue.pop_front() {
        if ctx.cancel.is_cancelled() {
            tracing::info!(seed = %seed, abandoned = queue.len() + 1, "Worker cancelled");
            return Ok(());
        }

        // Claimed before fetching: a failed fetch still uses up the URL
        if !ctx.visited.claim(&url) {
            continue;
        }

        let resource = match ctx.fetch(&url).await? {
            Ok(resource) => resource,
            Err(FetchError::Cancelled { .. }) => {
                tracing::info!(seed = %seed, abandoned = queue.len() + 1, "Worker cancelled");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Download failed");
                ctx.report_skip(&url, Phase::Fetch, e.to_string());
                continue;
            }
        };

        let path = local_path(&ctx.output_dir, &seed, &url, &resource.mime_type);

        let body = if resource.is_html() {
            let extraction = extract_links(&resource.body, &url);
            tracing::debug!(url = %url, links = extraction.links.len(), "Extracted links");
            queue.extend(extraction.links);
            extraction.body
        } else {
            resource.body
        };

        match save_file(&path, &body).await {
            Ok(()) => {
                tracing::debug!(url = %url, path = %path.display(), "Saved");
                ctx.report(MirrorEvent::Saved(SavedResource {
                    url: url.to_string(),
                    path,
                }));
            }
            Err(e) => {
                tracing::warn!(url = %url, path = %path.display(), error = %e, "Save failed");
                ctx.report_skip(&url, Phase::Persist, format!("{}: {}", path.display(), e));
            }
        }
    }

    tracing::info!(seed = %seed, "Worker finished");
    Ok(())
}

impl WorkerContext {
    // Fetches `url`, holding a gate slot for the request when the gate bounds
    // individual fetches
    //
    // The outer Result is a gate failure, the inner one the fetch itself.
    async fn fetch(&self, url: &Url) -> Result<Result<FetchedResource, FetchError>, MirrorError> {
        let _permit = match self.gate_scope {
            GateScope::Seed => None,
            GateScope::Fetch => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Ok(Err(FetchError::Cancelled { url: url.to_string() }));
                }
                permit = self.gate.acquire() => Some(permit?),
            },
        };

        tracing::debug!(url = %url, "Fetching");
        Ok(self.fetcher.fetch(url, &self.cancel).await)
    }

    fn report(&self, event: MirrorEvent) {
        // The receiver outlives every worker; if it's gone nobody is listening
        let _ = self.events.send(event);
    }

    fn report_skip(&self, url: &Url, phase: Phase, cause: String) {
        self.report(MirrorEvent::Skipped(SkippedResource {
            url: url.to_string(),
            phase,
            cause,
        }));
    }
}

// Writes `payload` to `path`, creating parent directories and replacing any
// existing file
async fn save_file(path: &Path, payload: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    tokio::fs::write(path, payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::seed_dir_name;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    fn context(output_dir: &Path, cancel: CancellationToken) -> (WorkerContext, mpsc::UnboundedReceiver<MirrorEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let ctx = WorkerContext {
            fetcher: Fetcher::new(Duration::from_secs(5)).unwrap(),
            visited: VisitedSet::new(),
            gate: AdmissionGate::new(2).unwrap(),
            gate_scope: GateScope::Seed,
            output_dir: output_dir.to_path_buf(),
            cancel,
            events,
        };
        (ctx, rx)
    }

    fn drain(mut rx: mpsc::UnboundedReceiver<MirrorEvent>) -> Vec<MirrorEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_save_file_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("subdir").join("file.txt");

        save_file(&path, b"hello world").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");

        // Saving again replaces the file
        save_file(&path, b"bye").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"bye");
    }

    #[tokio::test]
    async fn test_crawl_seed_mirrors_site() {
        let mut server = mockito::Server::new_async().await;
        let home = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(r#"<a href="/about">About</a><img src="/logo.png"><a href="https://other.org/">x</a>"#)
            .expect(1)
            .create_async()
            .await;
        let about = server
            .mock("GET", "/about")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(r#"<a href="/">Home</a><a href="/about#team">Team</a>"#)
            .expect(1)
            .create_async()
            .await;
        let logo = server
            .mock("GET", "/logo.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body([0x89, b'P', b'N', b'G'])
            .expect(1)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let (ctx, rx) = context(dir.path(), CancellationToken::new());
        let seed = Url::parse(&server.url()).unwrap();

        crawl_seed(seed.clone(), ctx).await.unwrap();

        home.assert_async().await;
        about.assert_async().await;
        logo.assert_async().await;

        let site = dir.path().join(seed_dir_name(&seed));
        let index = std::fs::read_to_string(site.join("index.html")).unwrap();
        assert!(index.contains(r#"href="/about""#));
        assert!(index.contains(r#"href="https://other.org/""#));

        let about_page = std::fs::read_to_string(site.join("about.html")).unwrap();
        assert!(about_page.contains(r#"href="/index.html""#));

        assert_eq!(std::fs::read(site.join("logo.png")).unwrap(), [0x89, b'P', b'N', b'G']);

        let saved = drain(rx)
            .into_iter()
            .filter(|e| matches!(e, MirrorEvent::Saved(_)))
            .count();
        assert_eq!(saved, 3);
    }

    #[tokio::test]
    async fn test_dead_link_does_not_stop_worker() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(r#"<a href="/gone">Gone</a><a href="/here">Here</a>"#)
            .create_async()
            .await;
        server
            .mock("GET", "/gone")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/here")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<p>here</p>")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let (ctx, rx) = context(dir.path(), CancellationToken::new());
        let seed = Url::parse(&server.url()).unwrap();

        crawl_seed(seed.clone(), ctx).await.unwrap();

        let site = dir.path().join(seed_dir_name(&seed));
        assert!(site.join("here.html").exists());
        assert!(!site.join("gone.html").exists());
        assert!(!site.join("gone").exists());

        let skipped: Vec<_> = drain(rx)
            .into_iter()
            .filter_map(|e| match e {
                MirrorEvent::Skipped(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].url.ends_with("/gone"));
        assert_eq!(skipped[0].phase, Phase::Fetch);
    }

    #[tokio::test]
    async fn test_save_error_is_reported_not_fatal() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<p>home</p>")
            .create_async()
            .await;

        // A regular file where the output directory should be
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("out");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let (ctx, rx) = context(&blocker, CancellationToken::new());
        let seed = Url::parse(&server.url()).unwrap();

        crawl_seed(seed, ctx).await.unwrap();

        let events = drain(rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            MirrorEvent::Skipped(SkippedResource { phase: Phase::Persist, .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_worker_fetches_nothing() {
        let mut server = mockito::Server::new_async().await;
        let home = server
            .mock("GET", "/")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (ctx, rx) = context(dir.path(), cancel);

        crawl_seed(Url::parse(&server.url()).unwrap(), ctx).await.unwrap();

        home.assert_async().await;
        assert!(drain(rx).is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_crawl_abandons_request_and_queue() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(r#"<a href="/slow">Slow</a><a href="/later">Later</a>"#)
            .create_async()
            .await;
        server
            .mock("GET", "/slow")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(2));
                w.write_all(b"<p>slow</p>")
            })
            .create_async()
            .await;
        let later = server
            .mock("GET", "/later")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let cancel = CancellationToken::new();
        let (ctx, mut rx) = context(dir.path(), cancel.clone());
        let seed = Url::parse(&server.url()).unwrap();
        let worker = tokio::spawn(crawl_seed(seed.clone(), ctx));

        // Home page saved; the worker is now waiting on /slow
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, MirrorEvent::Saved(_)));
        cancel.cancel();

        let finished = tokio::time::timeout(Duration::from_secs(1), worker).await;
        assert!(finished.is_ok(), "worker should not wait for the slow response");
        finished.unwrap().unwrap().unwrap();

        later.assert_async().await;
        let site = dir.path().join(seed_dir_name(&seed));
        assert!(site.join("index.html").exists());
        assert!(!site.join("slow.html").exists());
        // No skip is reported for the abandoned request
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_scope_releases_slot_after_each_request() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(r#"<a href="/next">Next</a>"#)
            .create_async()
            .await;
        server
            .mock("GET", "/next")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<p>next</p>")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let (mut ctx, rx) = context(dir.path(), CancellationToken::new());
        ctx.gate = AdmissionGate::new(1).unwrap();
        ctx.gate_scope = GateScope::Fetch;
        let gate = ctx.gate.clone();

        crawl_seed(Url::parse(&server.url()).unwrap(), ctx).await.unwrap();

        assert_eq!(gate.available(), 1);
        assert_eq!(drain(rx).len(), 2);
    }
}
