//! The one message the shell ever prints about a failure.

use crate::error::ShellError;
use std::io::{self, Write};

/// Text emitted for every failure, whatever the cause.
pub const GENERIC_MESSAGE: &str = "An error has occurred\n";

/// Write the generic diagnostic for `err` to standard output.
///
/// The underlying error is only visible in the debug log.
pub fn report(err: &ShellError) {
    let mut stdout = io::stdout().lock();
    if let Err(e) = report_to(&mut stdout, err) {
        tracing::warn!("could not write diagnostic: {}", e);
    }
}

/// Same as [`report`], but into an arbitrary writer.
pub fn report_to(out: &mut dyn Write, err: &ShellError) -> io::Result<()> {
    tracing::debug!(error = %err, "reporting failure");
    emit(out)
}

/// Write the generic diagnostic with no associated error.
///
/// Used where the original failure was an external program that could not be
/// started, and by the binary for CLI misuse.
pub fn emit(out: &mut dyn Write) -> io::Result<()> {
    out.write_all(GENERIC_MESSAGE.as_bytes())?;
    out.flush()
}
