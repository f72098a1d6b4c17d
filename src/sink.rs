//! Logging sink capability for streamed progress lines.
//!
//! The driver and strategies report progress as plain text lines through an
//! explicit `&mut dyn Write` capability rather than ambient global state.
//! Writes are best-effort: a sink that fails to accept a line never
//! interrupts an acquisition run.

use std::io::Write;

/// Write one line of progress output to the sink.
///
/// # Examples
///
/// ```
/// use modfetch::sink::write_log_line;
///
/// let mut sink = Vec::new();
/// write_log_line(&mut sink, "Sodium placed: sodium-0.6.13.jar");
/// assert_eq!(sink, b"Sodium placed: sodium-0.6.13.jar\n");
/// ```
pub fn write_log_line(sink: &mut dyn Write, line: impl std::fmt::Display) {
    if writeln!(sink, "{line}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}
