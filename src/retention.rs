//! Retention policy (spec §4.6)
//!
//! Decides, given the set of existing rotated log files, which ones to
//! delete. Candidates are already filtered to files matching the base
//! name's retention regex (see [`crate::file_sink`]) before reaching here.

use chrono::{DateTime, TimeDelta, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Policy controlling how many previously-rotated files survive.
#[derive(Clone)]
pub enum RetentionPolicy {
    /// Keep all matching files.
    None,
    /// Keep the `k` most recent (by mtime, then lexical name); delete the rest.
    Count(usize),
    /// Delete files older than `now - age`.
    Age(TimeDelta),
    /// Called with the candidate list; returns the subset to delete.
    Callable(Arc<dyn Fn(&[PathBuf]) -> Vec<PathBuf> + Send + Sync>),
}

impl std::fmt::Debug for RetentionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetentionPolicy::None => write!(f, "RetentionPolicy::None"),
            RetentionPolicy::Count(k) => write!(f, "RetentionPolicy::Count({k})"),
            RetentionPolicy::Age(d) => write!(f, "RetentionPolicy::Age({d:?})"),
            RetentionPolicy::Callable(_) => write!(f, "RetentionPolicy::Callable(<fn>)"),
        }
    }
}

fn mtime(path: &Path) -> std::time::SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
}

impl RetentionPolicy {
    /// Returns the subset of `candidates` that should be deleted.
    pub fn files_to_delete(&self, candidates: &[PathBuf], now: DateTime<Utc>) -> Vec<PathBuf> {
        match self {
            RetentionPolicy::None => Vec::new(),
            RetentionPolicy::Count(keep) => {
                let mut sorted: Vec<&PathBuf> = candidates.iter().collect();
                sorted.sort_by(|a, b| {
                    mtime(b)
                        .cmp(&mtime(a))
                        .then_with(|| a.to_string_lossy().cmp(&b.to_string_lossy()))
                });
                sorted
                    .into_iter()
                    .skip(*keep)
                    .cloned()
                    .collect()
            }
            RetentionPolicy::Age(age) => {
                let cutoff = now - *age;
                candidates
                    .iter()
                    .filter(|path| {
                        let modified: DateTime<Utc> = mtime(path).into();
                        modified < cutoff
                    })
                    .cloned()
                    .collect()
            }
            RetentionPolicy::Callable(f) => f(candidates),
        }
    }
}
