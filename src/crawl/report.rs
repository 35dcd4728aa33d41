// src/crawl/report.rs
// =============================================================================
// What a mirror run did, resource by resource.
//
// Workers never fail the run because of a single URL. Instead they send a
// MirrorEvent for every resource they save or skip, and the orchestrator folds
// those events into a MirrorReport once all workers are done.
// =============================================================================

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Step of the pipeline where a resource was given up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Fetch,
    Persist,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Fetch => f.write_str("fetch"),
            Phase::Persist => f.write_str("persist"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedResource {
    pub url: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedResource {
    pub url: String,
    pub phase: Phase,
    pub cause: String,
}

// Sent by workers while they run
#[derive(Debug, Clone)]
pub enum MirrorEvent {
    Saved(SavedResource),
    Skipped(SkippedResource),
}

// Summary of a whole run
//
// Serialized as-is for --json output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MirrorReport {
    pub saved: Vec<SavedResource>,
    pub skipped: Vec<SkippedResource>,
}

impl MirrorReport {
    pub fn record(&mut self, event: MirrorEvent) {
        match event {
            MirrorEvent::Saved(saved) => self.saved.push(saved),
            MirrorEvent::Skipped(skipped) => self.skipped.push(skipped),
        }
    }

    pub fn total(&self) -> usize {
        self.saved.len() + self.skipped.len()
    }

    pub fn skipped_in(&self, phase: Phase) -> impl Iterator<Item = &SkippedResource> {
        self.skipped.iter().filter(move |s| s.phase == phase)
    }
}
