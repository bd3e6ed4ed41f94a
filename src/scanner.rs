//! Directory Scanner (§4.C): enumerate candidate binaries in a directory
//! and apply a prober, tolerating permission and non-existence errors.

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::constants::DEFAULT_SCAN_CONCURRENCY;
use crate::kit::Kit;

/// `scan_directory(dir, probe)` (§4.C).
///
/// Absent directories and non-directories both yield an empty list;
/// `EACCES`/`EPERM` while listing entries is absorbed the same way.
/// Probes run with bounded parallelism (the same `buffer_unordered`
/// idiom the aggregator uses for cross-directory fan-out) and a failing
/// individual probe is logged, never allowed to abort the scan.
pub async fn scan_directory<F, Fut>(dir: &Path, probe: F) -> Vec<Kit>
where
    F: Fn(PathBuf) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Option<Kit>> + Send,
{
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            debug!(dir = %dir.display(), "permission denied listing directory");
            return Vec::new();
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "unexpected error listing directory");
            return Vec::new();
        }
    };

    if !dir.is_dir() {
        return Vec::new();
    }

    let paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();

    stream::iter(paths)
        .map(|path| {
            let probe = &probe;
            async move { probe(path).await }
        })
        .buffer_unordered(DEFAULT_SCAN_CONCURRENCY)
        .filter_map(|kit| async move { kit })
        .collect()
        .await
}
