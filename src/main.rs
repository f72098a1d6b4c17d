//! modfetch CLI entrypoint.
//!
//! Resolves the rule list (an override file or the embedded default) and
//! the destination directory, then hands both to the acquisition driver.
//! The driver itself never fails the process: once it runs, every outcome
//! is a log line. A non-zero exit only signals a pre-run problem such as
//! an unreadable rule list override.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use clap::Parser;
use directories_next::BaseDirs;
use modfetch::cli::Cli;
use modfetch::driver::fetch_all;
use modfetch::rules::load_rules;
use modfetch::sink::write_log_line;

/// Embedded default rule list, compiled into the binary.
const EMBEDDED_RULES: &str = include_str!("embedded/rules.json");

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    if let Err(err) = run(&cli, &mut stderr) {
        write_log_line(&mut stderr, format!("error: {err}"));
        std::process::exit(1);
    }
}

/// Errors that stop a run before the driver starts.
#[derive(Debug, thiserror::Error)]
enum RunError {
    /// The rule list override could not be read.
    #[error("failed to read rule list {path}: {source}")]
    RulesUnreadable {
        /// Path that was given on the command line.
        path: Utf8PathBuf,
        /// The underlying I/O failure.
        source: std::io::Error,
    },

    /// No destination directory was given and none could be derived.
    #[error("no default mods directory could be resolved; pass --mods-dir")]
    NoDefaultModsDir,
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<(), RunError> {
    let document = match &cli.rules {
        Some(path) => {
            fs::read_to_string(path).map_err(|source| RunError::RulesUnreadable {
                path: path.clone(),
                source,
            })?
        }
        None => EMBEDDED_RULES.to_owned(),
    };

    let mods_dir = match &cli.mods_dir {
        Some(dir) => dir.as_std_path().to_path_buf(),
        None => default_mods_dir().ok_or(RunError::NoDefaultModsDir)?,
    };

    let mut discard = std::io::sink();
    let log: &mut dyn Write = if cli.quiet { &mut discard } else { stderr };

    let rules = load_rules(&document, &cli.game_version, log);
    fetch_all(&rules, &mods_dir, log);
    Ok(())
}

/// Platform-specific default mods directory under the local game
/// installation.
fn default_mods_dir() -> Option<PathBuf> {
    let dirs = BaseDirs::new()?;
    let game_dir = if cfg!(target_os = "windows") {
        dirs.config_dir().join(".minecraft")
    } else if cfg!(target_os = "macos") {
        dirs.home_dir()
            .join("Library")
            .join("Application Support")
            .join("minecraft")
    } else {
        dirs.home_dir().join(".minecraft")
    };
    Some(game_dir.join("mods"))
}
