//! Declarative rule list loading and template expansion.
//!
//! The rule list is a JSON array of artifact descriptors, each with a
//! display name, optional cleanup patterns, and an ordered list of source
//! descriptors. Loading is deliberately forgiving: malformed cleanup
//! patterns and unrecognised source types are skipped with a diagnostic,
//! a descriptor that yields no usable source is dropped, and a document
//! that fails to parse at all yields an empty rule set.

use std::io::Write;

use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::fetch::strategy::Strategy;
use crate::sink::write_log_line;

/// Placeholder token standing for the current target game version.
pub const GAME_VERSION_PLACEHOLDER: &str = "${mc}";

/// Expand every occurrence of the game-version placeholder.
///
/// # Examples
///
/// ```
/// use modfetch::rules::expand_placeholders;
///
/// assert_eq!(
///     expand_placeholders("https://example.test/x-${mc}.jar", "1.21.8"),
///     "https://example.test/x-1.21.8.jar",
/// );
/// ```
#[must_use]
pub fn expand_placeholders(value: &str, game_version: &str) -> String {
    value.replace(GAME_VERSION_PLACEHOLDER, game_version)
}

/// One named artifact to acquire.
///
/// Constructed once at load time; immutable thereafter.
#[derive(Debug)]
pub struct Rule {
    /// Display name used in log lines.
    pub name: String,
    /// Patterns matched against existing filenames in the destination
    /// directory; matches are deleted before the pipeline runs.
    pub cleanup: Vec<Regex>,
    /// Fallback pipeline, tried in declared order.
    pub pipeline: Vec<Strategy>,
}

/// Raw rule descriptor as it appears in the JSON document.
#[derive(Debug, Deserialize)]
struct RuleSpec {
    #[serde(default = "default_rule_name")]
    name: String,
    #[serde(default)]
    cleanup: Vec<String>,
    #[serde(default)]
    sources: Vec<serde_json::Value>,
}

fn default_rule_name() -> String {
    "Unknown Mod".to_owned()
}

/// Raw source descriptor, dispatched on its `type` tag.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SourceSpec {
    #[serde(rename_all = "camelCase")]
    ModrinthExact {
        slug: String,
        version: String,
        #[serde(default = "default_loader")]
        require_loader: String,
    },
    #[serde(rename_all = "camelCase")]
    ModrinthFiltered {
        slug: String,
        #[serde(default = "default_loader")]
        loader: String,
        mc: Option<String>,
        #[serde(default = "default_loader")]
        require_loader: String,
    },
    #[serde(rename_all = "camelCase")]
    Direct {
        url: String,
        filename: Option<String>,
        sha512: Option<String>,
        expect_filename_contains: Option<String>,
    },
}

fn default_loader() -> String {
    "neoforge".to_owned()
}

/// Parse the declarative rule list.
///
/// Diagnostics for skipped entries go to `log`; an unparseable document
/// yields an empty rule set rather than an error, and the caller treats
/// "no rules" as a no-op.
#[must_use]
pub fn load_rules(document: &str, game_version: &str, log: &mut dyn Write) -> Vec<Rule> {
    let specs: Vec<RuleSpec> = match serde_json::from_str(document) {
        Ok(specs) => specs,
        Err(err) => {
            write_log_line(log, format!("Failed to read rule list: {err}"));
            return Vec::new();
        }
    };
    specs
        .into_iter()
        .filter_map(|spec| build_rule(spec, game_version, log))
        .collect()
}

/// Build one rule, or drop it when no source descriptor survives.
fn build_rule(spec: RuleSpec, game_version: &str, log: &mut dyn Write) -> Option<Rule> {
    let cleanup = spec
        .cleanup
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(err) => {
                write_log_line(
                    log,
                    format!("{}: invalid cleanup pattern {pattern:?}: {err} (skip)", spec.name),
                );
                None
            }
        })
        .collect();

    let pipeline: Vec<Strategy> = spec
        .sources
        .into_iter()
        .filter_map(|source| build_strategy(&spec.name, source, game_version, log))
        .collect();

    if pipeline.is_empty() {
        debug!("dropping rule {:?}: no usable sources", spec.name);
        return None;
    }
    Some(Rule {
        name: spec.name,
        cleanup,
        pipeline,
    })
}

/// Build one strategy from a source descriptor, or skip it.
fn build_strategy(
    rule_name: &str,
    source: serde_json::Value,
    game_version: &str,
    log: &mut dyn Write,
) -> Option<Strategy> {
    let tag = source
        .get("type")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("")
        .to_owned();
    match serde_json::from_value::<SourceSpec>(source) {
        Ok(spec) => Some(expand_source(spec, game_version)),
        Err(err) if matches!(tag.as_str(), "modrinth_exact" | "modrinth_filtered" | "direct") => {
            write_log_line(
                log,
                format!("{rule_name}: invalid {tag} source: {err} (skip)"),
            );
            None
        }
        Err(_) => {
            write_log_line(log, format!("Unknown source type: {tag} (skip)"));
            None
        }
    }
}

/// Turn a parsed source descriptor into a template-expanded strategy.
fn expand_source(spec: SourceSpec, game_version: &str) -> Strategy {
    match spec {
        SourceSpec::ModrinthExact {
            slug,
            version,
            require_loader,
        } => Strategy::ModrinthExact {
            project: slug,
            version: expand_placeholders(&version, game_version),
            required_loader: require_loader,
        },
        SourceSpec::ModrinthFiltered {
            slug,
            loader,
            mc,
            require_loader,
        } => Strategy::ModrinthFiltered {
            project: slug,
            loader,
            game_version: expand_placeholders(
                mc.as_deref().unwrap_or(game_version),
                game_version,
            ),
            required_loader: require_loader,
        },
        SourceSpec::Direct {
            url,
            filename,
            sha512,
            expect_filename_contains,
        } => Strategy::Direct {
            url: expand_placeholders(&url, game_version),
            filename: filename.map(|f| expand_placeholders(&f, game_version)),
            sha512,
            expect_contains: expect_filename_contains,
        },
    }
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod tests;
