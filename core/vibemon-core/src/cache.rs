//! Project metadata cache.
//!
//! A small JSON file mapping project name → `{model, memory, ts}`, written
//! by the statusline hook and read by the notification hook. The file holds
//! at most [`MAX_PROJECTS`] entries; when the cap is exceeded the entries
//! with the newest timestamps win.
//!
//! # Concurrency
//!
//! Writers take an OS advisory lock (`flock`) on a `<cache>.lock` sentinel
//! file, polling for up to 5 seconds before proceeding unconditionally. The
//! lock is advisory only: it reduces collision probability between
//! concurrent hook invocations, it does not guarantee exclusion. Release is
//! an RAII guard so the sentinel is cleaned up on every exit path.
//!
//! Readers never lock. A stale or partially-written read degrades to an
//! empty result, which is acceptable for a best-effort status display. The
//! write itself is atomic (temp file in the same directory + rename), so
//! readers see either the old or the new file, never a torn one.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VibemonError};

/// Maximum number of projects retained in the cache file.
pub const MAX_PROJECTS: usize = 10;

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(100);
const LOCK_POLL_ATTEMPTS: u32 = 50;

/// Per-project metadata recorded by the statusline hook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub memory: String,
    #[serde(default)]
    pub ts: i64,
}

/// Handle to the on-disk cache file.
pub struct MetadataCache {
    path: PathBuf,
}

impl MetadataCache {
    pub fn new(path: PathBuf) -> Self {
        MetadataCache { path }
    }

    /// Looks up previously recorded metadata for a project.
    ///
    /// Lock-free: absent file, unparseable content, or a missing key all
    /// read as `None`.
    pub fn lookup(&self, project: &str) -> Option<CacheEntry> {
        if project.is_empty() {
            return None;
        }
        let content = std::fs::read_to_string(&self.path).ok()?;
        let map: HashMap<String, CacheEntry> = serde_json::from_str(&content).ok()?;
        map.get(project).cloned()
    }

    /// Records metadata for a project, evicting the oldest entries beyond
    /// the cap. Never raises: any failure is logged and swallowed.
    pub fn upsert(&self, project: &str, model: &str, memory: &str) {
        self.upsert_at(project, model, memory, Utc::now().timestamp());
    }

    fn upsert_at(&self, project: &str, model: &str, memory: &str, ts: i64) {
        if project.is_empty() {
            return;
        }
        if let Err(err) = self.write_entry(project, model, memory, ts) {
            tracing::warn!(error = %err, cache = %self.path.display(), "Cache upsert failed");
        }
    }

    fn write_entry(&self, project: &str, model: &str, memory: &str, ts: i64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| VibemonError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        // Held for the read-modify-write; released (and the sentinel
        // removed) on drop, even if the write below fails.
        let _lock = CacheLock::acquire(&self.path);

        let mut map = self.read_all();
        map.insert(
            project.to_string(),
            CacheEntry {
                model: model.to_string(),
                memory: memory.to_string(),
                ts,
            },
        );

        if map.len() > MAX_PROJECTS {
            let mut entries: Vec<(String, CacheEntry)> = map.into_iter().collect();
            entries.sort_by(|a, b| b.1.ts.cmp(&a.1.ts));
            entries.truncate(MAX_PROJECTS);
            map = entries.into_iter().collect();
        }

        let content = serde_json::to_string(&map).map_err(|source| VibemonError::Json {
            context: "serializing cache".to_string(),
            source,
        })?;

        let tmp_path = PathBuf::from(format!(
            "{}.tmp.{}",
            self.path.display(),
            std::process::id()
        ));
        fs::write(&tmp_path, content).map_err(|source| VibemonError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| VibemonError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn read_all(&self) -> HashMap<String, CacheEntry> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }
}

/// Advisory lock on the cache's `.lock` sentinel file.
///
/// Polls `flock(LOCK_EX | LOCK_NB)` for up to 5 seconds, then proceeds
/// unconditionally. Drop unlocks and best-effort removes the sentinel.
struct CacheLock {
    file: Option<std::fs::File>,
    path: PathBuf,
}

impl CacheLock {
    fn acquire(cache_path: &Path) -> CacheLock {
        let path = PathBuf::from(format!("{}.lock", cache_path.display()));
        let file = match std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
        {
            Ok(mut file) => {
                let _ = write!(file, "{}", std::process::id());
                for attempt in 0..LOCK_POLL_ATTEMPTS {
                    if try_flock(&file) {
                        break;
                    }
                    if attempt + 1 == LOCK_POLL_ATTEMPTS {
                        tracing::debug!(
                            lock = %path.display(),
                            "Lock wait exceeded; proceeding without exclusion"
                        );
                        break;
                    }
                    std::thread::sleep(LOCK_POLL_INTERVAL);
                }
                Some(file)
            }
            Err(err) => {
                tracing::debug!(error = %err, lock = %path.display(), "Could not open lock file");
                None
            }
        };
        CacheLock { file, path }
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            unlock_flock(&file);
        }
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(unix)]
fn try_flock(file: &std::fs::File) -> bool {
    use std::os::unix::io::AsRawFd;
    // SAFETY: flock on a valid owned fd; non-blocking, no memory involved.
    unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) == 0 }
}

#[cfg(not(unix))]
fn try_flock(_file: &std::fs::File) -> bool {
    // No flock available; sentinel existence is the only signal.
    true
}

#[cfg(unix)]
fn unlock_flock(file: &std::fs::File) {
    use std::os::unix::io::AsRawFd;
    // SAFETY: releasing a lock we hold on a valid owned fd.
    unsafe {
        libc::flock(file.as_raw_fd(), libc::LOCK_UN);
    }
}

#[cfg(not(unix))]
fn unlock_flock(_file: &std::fs::File) {}
