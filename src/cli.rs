// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// It also turns the raw URL arguments into seed URLs. Users tend to type
// "example.com" rather than "https://example.com", so anything that doesn't
// carry a scheme gets a second chance with "https://" in front.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use site_mirror::crawl::{DEFAULT_CONCURRENCY, DEFAULT_OUTPUT_DIR, DEFAULT_TIMEOUT_SECS};
use site_mirror::{GateScope, MirrorConfig};
use url::Url;

#[derive(Parser, Debug)]
#[command(
    name = "site-mirror",
    version,
    about = "Mirror websites into a browsable offline copy",
    long_about = "site-mirror crawls each URL you give it, follows links within the same site, \
                  and saves every page and asset under <output-dir>/<host>/ with links \
                  rewritten to point at the local copies."
)]
pub struct Cli {
    /// URLs to mirror (e.g., https://example.com or just example.com)
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Directory the mirrored sites are written to
    #[arg(long, short, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// How many slots the admission gate has
    #[arg(long, short, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// What one slot bounds: a whole seed crawl, or a single request
    #[arg(long, value_enum, default_value_t = ScopeArg::Seed)]
    pub gate_scope: ScopeArg,

    /// Output the final report in JSON format instead of a table
    #[arg(long)]
    pub json: bool,

    /// Log per-URL progress (same as RUST_LOG=debug)
    #[arg(long, short)]
    pub verbose: bool,
}

// --gate-scope values
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    /// One slot per seed crawl
    Seed,
    /// One slot per request
    Fetch,
}

impl From<ScopeArg> for GateScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Seed => GateScope::Seed,
            ScopeArg::Fetch => GateScope::Fetch,
        }
    }
}

impl Cli {
    /// Builds the mirror configuration from the parsed arguments and seeds.
    pub fn mirror_config(&self, seeds: Vec<Url>) -> MirrorConfig {
        MirrorConfig {
            seeds,
            output_dir: self.output_dir.clone(),
            timeout: Duration::from_secs(self.timeout),
            concurrency: self.concurrency,
            gate_scope: self.gate_scope.into(),
        }
    }
}

// Parses every argument into a seed URL, skipping the ones that don't work
//
// Returns the valid seeds plus a (argument, reason) pair for each rejected one.
pub fn parse_seeds(args: &[String]) -> (Vec<Url>, Vec<(String, String)>) {
    let mut seeds = Vec::new();
    let mut rejected = Vec::new();

    for arg in args {
        match parse_seed(arg) {
            Ok(url) => seeds.push(url),
            Err(reason) => rejected.push((arg.clone(), reason)),
        }
    }

    (seeds, rejected)
}

// Parses one argument
//
// Example:
//   "https://example.com/docs" -> https://example.com/docs
//   "example.com"              -> https://example.com/
//   "localhost:3000"           -> https://localhost:3000/
//   "ftp://example.com"        -> error (only http and https can be mirrored)
fn parse_seed(arg: &str) -> Result<Url, String> {
    let arg = arg.trim();

    let url = match Url::parse(arg) {
        Ok(url) if url.has_host() => url,
        // "localhost:3000" parses fine, with "localhost" as the scheme
        Ok(url) => with_https(arg).map_err(|_| format!("unsupported scheme '{}'", url.scheme()))?,
        Err(url::ParseError::RelativeUrlWithoutBase) => with_https(arg)?,
        Err(e) => return Err(e.to_string()),
    };

    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
        "http" | "https" => Err("URL has no host".to_string()),
        scheme => Err(format!("unsupported scheme '{}'", scheme)),
    }
}

// Second attempt for arguments typed without a scheme
fn with_https(arg: &str) -> Result<Url, String> {
    let url = Url::parse(&format!("https://{}", arg)).map_err(|e| e.to_string())?;

    // "mailto:me@example.com" would come back with "mailto" as the user name
    if !url.username().is_empty() || url.password().is_some() {
        return Err("URL carries credentials".to_string());
    }

    Ok(url)
}
