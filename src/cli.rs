//! CLI argument definitions for the artifact fetcher.
//!
//! This module defines the command-line interface using clap. It is
//! separated from the main entrypoint to keep the binary small and focused
//! on orchestration.

use camino::Utf8PathBuf;
use clap::Parser;

/// Game version the embedded rule list targets.
pub const DEFAULT_GAME_VERSION: &str = "1.21.8";

/// Fetch declared mod artifacts into a mods directory.
#[derive(Parser, Debug)]
#[command(name = "modfetch")]
#[command(version, about)]
#[command(long_about = concat!(
    "Fetch declared mod artifacts into a mods directory.\n\n",
    "modfetch resolves a declarative rule list into verified files on disk. ",
    "Each rule names an artifact, optional cleanup patterns for stale files, ",
    "and an ordered list of sources tried in turn: an exact Modrinth version, ",
    "the latest matching Modrinth version, or a direct URL. Downloads are ",
    "verified against published SHA-512 digests where available and installed ",
    "atomically, so an interrupted run never leaves a partial file.\n\n",
    "A missing or unresolvable artifact is reported and skipped; the run ",
    "continues with the remaining rules.",
))]
#[command(after_help = concat!(
    "SOURCE TYPES:\n",
    "  modrinth_exact      One exact version id, checked against the loader\n",
    "  modrinth_filtered   Latest version filtered by loader and game version\n",
    "  direct              A direct URL with optional filename and sha512\n\n",
    "EXAMPLES:\n",
    "  Fetch the embedded rule list into the default mods directory:\n",
    "    $ modfetch\n\n",
    "  Fetch a custom rule list for a specific game version:\n",
    "    $ modfetch --rules my-rules.json --game-version 1.21.8\n\n",
    "  Fetch into an explicit directory:\n",
    "    $ modfetch --mods-dir ./server/mods\n",
))]
pub struct Cli {
    /// Destination directory for fetched artifacts [default: the local
    /// Minecraft mods directory].
    #[arg(short, long, value_name = "DIR")]
    pub mods_dir: Option<Utf8PathBuf>,

    /// Target game version, used for `${mc}` template expansion.
    #[arg(short, long, value_name = "VERSION", default_value = DEFAULT_GAME_VERSION)]
    pub game_version: String,

    /// Rule list file overriding the embedded one.
    #[arg(short, long, value_name = "FILE")]
    pub rules: Option<Utf8PathBuf>,

    /// Suppress progress output.
    #[arg(short, long)]
    pub quiet: bool,
}
