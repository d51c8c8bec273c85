//! PID file for daemon-style operation.
//!
//! The server writes its PID to the configured path while holding an `fs2`
//! exclusive lock on it, so two gateways never run from the same PID file.
//! The file is only truncated after the lock is won; a losing instance
//! leaves the running one's PID intact.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use fs2::FileExt;

/// Lock `path` and write the current PID into it.
///
/// The returned [`File`] holds the lock; keep it alive for as long as the
/// server runs.
pub fn write_pid_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .read(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("opening PID file {}: {e}", path.display()))?;

    FileExt::try_lock_exclusive(&file).map_err(|_| {
        anyhow::anyhow!(
            "another sessionbridge instance is running (PID file {} is locked)",
            path.display()
        )
    })?;

    let pid = std::process::id();
    file.set_len(0)?;
    {
        let mut f = &file;
        writeln!(f, "{pid}")?;
        f.flush()?;
    }

    tracing::info!(path = %path.display(), pid, "PID file written");
    Ok(file)
}

/// Remove the PID file; the lock goes away with `_handle`.
pub fn remove_pid_file(path: &Path, _handle: File) {
    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove PID file");
    } else {
        tracing::info!(path = %path.display(), "PID file removed");
    }
}
