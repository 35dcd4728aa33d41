// src/lib.rs
// =============================================================================
// site-mirror: download a website into a browsable offline copy.
//
// The binary (src/main.rs) parses arguments and wires up Ctrl-C; everything
// that actually mirrors lives in these two modules:
// - crawl: workers, the shared visited set, the admission gate, the report
// - resource: fetching, link rewriting and the URL -> file mapping
// =============================================================================

pub mod crawl;
pub mod resource;

pub use crawl::{GateScope, Mirror, MirrorConfig, MirrorError, MirrorReport};
