//! Output redirection targets and the scoped stdout rebinding.

use crate::error::RedirectionError;
use nix::libc::STDOUT_FILENO;
use nix::unistd::{close, dup, dup2};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

/// Permissions of a freshly created redirection target.
const TARGET_MODE: u32 = 0o600;

/// Create the file a redirected command writes into.
///
/// Refuses a target that can already be opened for reading, so nothing is
/// ever overwritten. The probe and the create are two separate calls.
pub fn open_target(path: &Path) -> Result<File, RedirectionError> {
    if File::open(path).is_ok() {
        return Err(RedirectionError::TargetExists(path.to_path_buf()));
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .mode(TARGET_MODE)
        .open(path)
        .map_err(|source| RedirectionError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Process stdout bound to a file for as long as this value lives.
///
/// Dropping it flushes, puts the original descriptor back on fd 1, closes the
/// saved duplicate and finally closes the target.
pub struct StdoutRedirect {
    saved: RawFd,
    // Closed when the fields drop, after `drop` has put fd 1 back.
    target: File,
}

impl StdoutRedirect {
    /// Point fd 1 at `target`, keeping a duplicate of the old stdout.
    pub fn bind(target: File) -> Result<Self, RedirectionError> {
        io::stdout()
            .flush()
            .map_err(RedirectionError::Descriptor)?;

        let saved = dup(STDOUT_FILENO).map_err(|e| RedirectionError::Descriptor(e.into()))?;
        if let Err(e) = dup2(target.as_raw_fd(), STDOUT_FILENO) {
            let _ = close(saved);
            return Err(RedirectionError::Descriptor(e.into()));
        }

        tracing::debug!(saved, target_fd = target.as_raw_fd(), "stdout redirected");
        Ok(Self { saved, target })
    }
}

impl Drop for StdoutRedirect {
    fn drop(&mut self) {
        if let Err(e) = io::stdout().flush() {
            tracing::warn!("flush before restoring stdout failed: {}", e);
        }
        if let Err(e) = dup2(self.saved, STDOUT_FILENO) {
            tracing::warn!("restoring stdout failed: {}", e);
        }
        if let Err(e) = close(self.saved) {
            tracing::warn!("closing saved stdout failed: {}", e);
        }
        tracing::debug!(target_fd = self.target.as_raw_fd(), "stdout restored");
    }
}
