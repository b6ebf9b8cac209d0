//! Cross-process run exclusion
//!
//! At most one exporter may run against a server at a time. Exclusion is a
//! pid-stamped marker file: acquisition writes the current pid, a later
//! acquisition probes whether that pid is still alive and either reports
//! contention or clears the stale marker. Liveness probing sits behind
//! [`ProcessProbe`] so each platform (and each test) supplies its own
//! implementation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ExportError, Result};

/// Default marker filename inside the system temp directory
const LOCK_FILE_NAME: &str = "plexport.lock";

/// Platform seam for pid liveness checks
pub trait ProcessProbe: Send + Sync {
    /// Whether a process with the given pid is currently running
    fn is_alive(&self, pid: u32) -> bool;
}

/// Unix liveness probe using a null signal.
///
/// `kill(pid, 0)` delivers nothing but performs the existence and
/// permission checks; EPERM still means the process exists.
#[cfg(unix)]
pub struct SignalProbe;

#[cfg(unix)]
impl ProcessProbe for SignalProbe {
    fn is_alive(&self, pid: u32) -> bool {
        let result = unsafe { libc::kill(pid as libc::pid_t, 0) };
        if result == 0 {
            return true;
        }
        std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }
}

/// Cross-process run lock backed by a pid marker file.
pub struct RunLock {
    path: PathBuf,
    probe: Box<dyn ProcessProbe>,
}

impl RunLock {
    /// Lock at the well-known marker path with the platform probe.
    #[cfg(unix)]
    pub fn standard() -> Self {
        Self::with_probe(std::env::temp_dir().join(LOCK_FILE_NAME), Box::new(SignalProbe))
    }

    /// Lock at an explicit path with an explicit probe (used by tests and
    /// non-unix builds).
    pub fn with_probe(path: impl Into<PathBuf>, probe: Box<dyn ProcessProbe>) -> Self {
        Self {
            path: path.into(),
            probe,
        }
    }

    /// Marker path this lock guards
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the marker currently records this process as the holder.
    pub fn is_held(&self) -> bool {
        matches!(read_pid(&self.path), Some(pid) if pid == std::process::id())
    }

    /// Acquire the lock, returning a guard that releases on drop.
    ///
    /// # Errors
    /// - `ExportError::LockBusy` when a live process holds the marker
    /// - `ExportError::Io` when the marker cannot be created
    ///
    /// A marker whose content cannot be read or parsed is treated as
    /// "liveness undeterminable" and removed; blocking forever on a
    /// corrupted file would deadlock every future run.
    pub fn acquire(&self) -> Result<LockGuard<'_>> {
        if self.path.exists() {
            match read_pid(&self.path) {
                Some(pid) if self.probe.is_alive(pid) => {
                    return Err(ExportError::LockBusy {
                        path: self.path.clone(),
                        pid,
                    });
                }
                Some(stale_pid) => {
                    tracing::info!(pid = stale_pid, path = %self.path.display(), "removing stale lock");
                    remove_marker(&self.path);
                }
                None => {
                    tracing::warn!(path = %self.path.display(), "removing unreadable lock marker");
                    remove_marker(&self.path);
                }
            }
        }

        fs::write(&self.path, std::process::id().to_string())?;
        Ok(LockGuard { lock: self })
    }
}

/// Scoped ownership of an acquired [`RunLock`].
///
/// Dropping the guard releases the lock on every exit path, normal or not.
pub struct LockGuard<'a> {
    lock: &'a RunLock,
}

impl LockGuard<'_> {
    /// Release explicitly. Best-effort: a missing marker is not an error.
    pub fn release(self) {
        // Drop does the work
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        remove_marker(&self.lock.path);
    }
}

fn read_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn remove_marker(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), "failed to remove lock marker: {}", err);
        }
    }
}
