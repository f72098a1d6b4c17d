//! Candidate file selection precedence.
//!
//! A version record can list several downloadable files (one per loader,
//! sources jars, and so on). Selection follows a fixed precedence: a file
//! whose name carries the required loader's brand token without a competing
//! brand token, else the file the index flags as primary, else the first
//! file listed.

use super::index::VersionFile;

/// Loader brand tokens that can appear in published filenames.
const LOADER_BRANDS: [&str; 4] = ["neoforge", "forge", "fabric", "quilt"];

/// Select one file from `files` for the given loader, or `None` when the
/// list is empty.
#[must_use]
pub fn choose_file<'a>(files: &'a [VersionFile], loader: &str) -> Option<&'a VersionFile> {
    let loader = loader.to_ascii_lowercase();
    files
        .iter()
        .find(|f| branded_for(&f.filename, &loader))
        .or_else(|| files.iter().find(|f| f.primary))
        .or_else(|| files.first())
}

/// Whether `filename` carries the loader's brand token and no competing
/// brand token.
fn branded_for(filename: &str, loader: &str) -> bool {
    let name = filename.to_ascii_lowercase();
    name.contains(loader) && !competing_brands(loader).iter().any(|b| name.contains(*b))
}

/// Brand tokens that compete with `loader`.
///
/// Brands overlapping the loader as substrings are excluded, so a
/// `neoforge` filename is not rejected for containing `forge`.
fn competing_brands(loader: &str) -> Vec<&'static str> {
    LOADER_BRANDS
        .iter()
        .copied()
        .filter(|b| *b != loader && !loader.contains(b) && !b.contains(loader))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::index::FileHashes;

    fn file(filename: &str, primary: bool) -> VersionFile {
        VersionFile {
            url: format!("https://cdn.example.test/{filename}"),
            filename: filename.to_owned(),
            primary,
            hashes: FileHashes::default(),
        }
    }

    #[test]
    fn brand_token_beats_primary_flag() {
        let files = vec![
            file("mod-1.0-fabric.jar", true),
            file("mod-1.0-neoforge.jar", false),
        ];
        let chosen = choose_file(&files, "neoforge").expect("non-empty list");
        assert_eq!(chosen.filename, "mod-1.0-neoforge.jar");
    }

    #[test]
    fn competing_brand_disqualifies_a_name() {
        // The combined jar mentions both brands, so the primary flag decides.
        let files = vec![
            file("mod-1.0-neoforge-fabric.jar", false),
            file("mod-1.0.jar", true),
        ];
        let chosen = choose_file(&files, "neoforge").expect("non-empty list");
        assert_eq!(chosen.filename, "mod-1.0.jar");
    }

    #[test]
    fn forge_is_not_a_competitor_of_neoforge() {
        let files = vec![file("mod-1.0-neoforge.jar", false)];
        let chosen = choose_file(&files, "neoforge").expect("non-empty list");
        assert_eq!(chosen.filename, "mod-1.0-neoforge.jar");
    }

    #[test]
    fn falls_back_to_primary_then_first() {
        let files = vec![file("mod-sources.jar", false), file("mod.jar", true)];
        let chosen = choose_file(&files, "neoforge").expect("non-empty list");
        assert_eq!(chosen.filename, "mod.jar");

        let unflagged = vec![file("first.jar", false), file("second.jar", false)];
        let chosen = choose_file(&unflagged, "neoforge").expect("non-empty list");
        assert_eq!(chosen.filename, "first.jar");
    }

    #[test]
    fn empty_list_selects_nothing() {
        assert!(choose_file(&[], "neoforge").is_none());
    }

    #[test]
    fn brand_match_is_case_insensitive() {
        let files = vec![
            file("Mod-1.0-Fabric.jar", true),
            file("Mod-1.0-NeoForge.jar", false),
        ];
        let chosen = choose_file(&files, "NeoForge").expect("non-empty list");
        assert_eq!(chosen.filename, "Mod-1.0-NeoForge.jar");
    }
}
