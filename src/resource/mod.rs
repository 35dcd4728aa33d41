// src/resource/mod.rs
// =============================================================================
// This module deals with single resources: downloading one, rewriting the
// links inside one HTML page, and deciding where one is saved.
//
// Submodules:
// - http: Downloads a URL (GET, timeout, cancellation, 200-only)
// - html: Finds same-site links and rewrites them to local paths
// - path: Maps URLs to files on disk and to local link targets
// =============================================================================

mod html;
mod http;
mod path;

pub use html::{extract_links, registrable_domain, Extraction};
pub use http::{mime_type, FetchError, FetchedResource, Fetcher};
pub use path::{extension_for, local_link, local_path, seed_dir_name};
