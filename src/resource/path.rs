// src/resource/path.rs
// =============================================================================
// This module maps URLs to places on disk.
//
// Two mappings live here:
// - local_path: where a fetched resource is saved
//     <output-dir>/<seed-host>/<url-path>[index][.ext]
// - local_link: what a rewritten link attribute points at
//     <url-path>[index.html]
//
// Both are pure functions of their inputs, so the same URL always lands in
// the same file and two workers never race on one path.
// =============================================================================

use std::path::{Path, PathBuf};

use url::Url;

// Known MIME types and the file extension we save them with
const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("text/html", "html"),
    ("application/xhtml+xml", "xhtml"),
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("application/javascript", "js"),
    ("text/css", "css"),
    ("application/json", "json"),
    ("application/xml", "xml"),
    ("application/pdf", "pdf"),
    ("image/gif", "gif"),
    ("image/svg+xml", "svg"),
    ("audio/mpeg", "mp3"),
    ("video/mp4", "mp4"),
];

/// File extension (without the dot) for a MIME type, if we know one.
pub fn extension_for(mime_type: &str) -> Option<&'static str> {
    MIME_EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == mime_type)
        .map(|(_, ext)| *ext)
}

/// Directory name for everything mirrored under `seed`.
///
/// The host, plus `:port` when the seed names a non-default port.
pub fn seed_dir_name(seed: &Url) -> String {
    let host = seed.host_str().unwrap_or("unknown-host");
    match seed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Where the resource at `url`, found while crawling `seed`, is saved.
///
/// Example (mime "text/html"):
///   https://example.com/          -> <out>/example.com/index.html
///   https://example.com/docs/     -> <out>/example.com/docs/index.html
///   https://example.com/about     -> <out>/example.com/about.html
///   https://example.com/page.html -> <out>/example.com/page.html
pub fn local_path(output_dir: &Path, seed: &Url, url: &Url, mime_type: &str) -> PathBuf {
    let mut url_path = url.path().to_string();
    if url_path.is_empty() || url_path.ends_with('/') {
        url_path.push_str("index");
    }

    if let Some(ext) = extension_for(mime_type) {
        if last_extension(&url_path) != Some(ext) {
            url_path.push('.');
            url_path.push_str(ext);
        }
    }

    let mut path = output_dir.join(seed_dir_name(seed));
    for segment in url_path.split('/') {
        if let Some(name) = file_name(segment) {
            path.push(name);
        }
    }

    path
}

/// Link target written into a rewritten attribute.
///
/// The link's path, with "index.html" appended when it names a directory.
pub fn local_link(url: &Url) -> String {
    let mut link = url.path().to_string();
    if link.is_empty() || link.ends_with('/') {
        link.push_str("index.html");
    }
    link
}

// Extension of the last path segment, the part after its final dot
fn last_extension(url_path: &str) -> Option<&str> {
    let last = url_path.rsplit('/').next().unwrap_or(url_path);
    last.rfind('.').map(|dot| &last[dot + 1..])
}

// Turns one URL path segment into a safe file name
//
// Segments are percent-decoded so "/my%20page" is saved as "my page", which
// is what a browser looks for when it follows the rewritten link. Anything
// that could climb out of the seed directory is dropped.
fn file_name(segment: &str) -> Option<String> {
    let decoded = match urlencoding::decode(segment) {
        Ok(decoded) if !decoded.contains(['/', '\\', '\0']) => decoded.into_owned(),
        _ => segment.to_string(),
    };

    match decoded.as_str() {
        "" | "." | ".." => None,
        _ => Some(decoded),
    }
}
