//! Sequential rule processing with best-effort cleanup.
//!
//! The driver owns one acquisition run: for every rule it deletes files
//! matching the rule's cleanup patterns, then runs the rule's fallback
//! pipeline. No rule's failure affects another's, and the driver itself
//! never raises — every outcome surfaces as a line on the logging sink.

use std::fs;
use std::io::Write;
use std::path::Path;

use regex::Regex;

use crate::fetch::download::DownloadPolicy;
use crate::fetch::strategy::{FetchContext, run_pipeline};
use crate::fetch::transport::{HttpTransport, Transport};
use crate::rules::Rule;
use crate::sink::write_log_line;

/// Process every rule against `dest_dir` using the production HTTP
/// transport and the default retry policy.
pub fn fetch_all(rules: &[Rule], dest_dir: &Path, log: &mut dyn Write) {
    fetch_all_with(rules, dest_dir, &HttpTransport, &DownloadPolicy::default(), log);
}

/// Testable inner driver with injected transport and retry policy.
///
/// Rules are processed strictly sequentially. The destination directory is
/// created when absent; when it cannot be created the run is abandoned
/// with a log line, since neither cleanup nor installs could succeed.
pub fn fetch_all_with(
    rules: &[Rule],
    dest_dir: &Path,
    transport: &dyn Transport,
    policy: &DownloadPolicy,
    log: &mut dyn Write,
) {
    if rules.is_empty() {
        write_log_line(log, "(no artifact rules configured - nothing to fetch)");
        return;
    }
    if let Err(err) = fs::create_dir_all(dest_dir) {
        write_log_line(
            log,
            format!("cannot create {}: {err}", dest_dir.display()),
        );
        return;
    }

    let ctx = FetchContext {
        transport,
        policy,
        dest_dir,
    };
    for rule in rules {
        for pattern in &rule.cleanup {
            delete_matching(dest_dir, pattern, log);
        }
        match run_pipeline(&rule.name, &rule.pipeline, &ctx, log) {
            Ok(placed) => {
                let filename = placed
                    .file_name()
                    .map_or_else(|| placed.display().to_string(), |n| {
                        n.to_string_lossy().into_owned()
                    });
                write_log_line(log, format!("{} placed: {filename}", rule.name));
            }
            Err(err) => {
                write_log_line(log, format!("{} download failed: {err}", rule.name));
            }
        }
    }
}

/// Delete regular files in `dir` whose names match `pattern`.
///
/// Best-effort: an unreadable directory is skipped outright and failed
/// deletes are logged, never aborting the run.
fn delete_matching(dir: &Path, pattern: &Regex, log: &mut dyn Write) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !pattern.is_match(name) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => write_log_line(log, format!("Deleted old: {name}")),
            Err(err) => write_log_line(log, format!("failed to delete {name}: {err}")),
        }
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
