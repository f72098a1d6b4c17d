//! Unit tests for the acquisition driver.

use super::*;
use crate::fetch::strategy::Strategy;
use crate::fetch::transport::{MockTransport, TransportError};
use crate::rules::load_rules;
use std::time::Duration;

fn test_policy() -> DownloadPolicy {
    DownloadPolicy {
        attempts: 3,
        backoff_unit: Duration::from_millis(1),
    }
}

fn direct_rule(name: &str, url: &str) -> Rule {
    Rule {
        name: name.to_owned(),
        cleanup: Vec::new(),
        pipeline: vec![Strategy::Direct {
            url: url.to_owned(),
            filename: None,
            sha512: None,
            expect_contains: None,
        }],
    }
}

fn entries_named(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn cleanup_patterns_delete_matching_files_before_the_fetch() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("OldMod-1.2.jar"), b"stale").expect("seed stale file");
    fs::write(dir.path().join("unrelated.jar"), b"keep").expect("seed unrelated file");

    let mut rule = direct_rule("Old Mod", "https://example.test/OldMod-2.0.jar");
    rule.cleanup = vec![Regex::new(r"OldMod-.*\.jar").expect("valid pattern")];

    let mut transport = MockTransport::new();
    transport
        .expect_fetch_to_file()
        .times(1)
        .returning(|_url, dest| fs::write(dest, b"fresh").map_err(TransportError::Io));

    let mut log = Vec::new();
    fetch_all_with(&[rule], dir.path(), &transport, &test_policy(), &mut log);

    let logged = String::from_utf8(log).expect("utf-8 log");
    assert!(logged.contains("Deleted old: OldMod-1.2.jar"));
    assert!(logged.contains("Old Mod placed: OldMod-2.0.jar"));
    assert_eq!(
        entries_named(dir.path()),
        vec!["OldMod-2.0.jar", "unrelated.jar"]
    );
}

#[test]
fn one_failing_rule_does_not_stop_the_next() {
    let dir = tempfile::tempdir().expect("temp dir");

    let failing = Rule {
        name: "Broken Mod".to_owned(),
        cleanup: Vec::new(),
        pipeline: vec![Strategy::Direct {
            url: "https://example.test/broken.jar".to_owned(),
            filename: None,
            sha512: None,
            expect_contains: Some("never-matches".to_owned()),
        }],
    };
    let working = direct_rule("Working Mod", "https://example.test/working.jar");

    let mut transport = MockTransport::new();
    transport
        .expect_fetch_to_file()
        .times(1)
        .withf(|url, _dest| url == "https://example.test/working.jar")
        .returning(|_url, dest| fs::write(dest, b"ok").map_err(TransportError::Io));

    let mut log = Vec::new();
    fetch_all_with(
        &[failing, working],
        dir.path(),
        &transport,
        &test_policy(),
        &mut log,
    );

    let logged = String::from_utf8(log).expect("utf-8 log");
    assert!(
        logged.contains("Broken Mod download failed: no valid source found for Broken Mod")
    );
    assert!(logged.contains("Working Mod placed: working.jar"));
    assert!(dir.path().join("working.jar").exists());
}

#[test]
fn end_to_end_direct_rule_with_template_expansion() {
    let dir = tempfile::tempdir().expect("temp dir");
    let document = r#"[
        {
            "name": "X",
            "sources": [
                { "type": "direct", "url": "https://example.test/x-${mc}.jar" }
            ]
        }
    ]"#;
    let mut log = Vec::new();
    let rules = load_rules(document, "1.21.8", &mut log);

    let mut transport = MockTransport::new();
    transport
        .expect_fetch_to_file()
        .times(1)
        .withf(|url, _dest| url == "https://example.test/x-1.21.8.jar")
        .returning(|_url, dest| fs::write(dest, b"x payload").map_err(TransportError::Io));

    fetch_all_with(&rules, dir.path(), &transport, &test_policy(), &mut log);

    let logged = String::from_utf8(log).expect("utf-8 log");
    assert!(logged.contains("X placed: x-1.21.8.jar"));
    assert_eq!(
        fs::read(dir.path().join("x-1.21.8.jar")).expect("placed readable"),
        b"x payload"
    );
    // No temp leftovers in the destination directory.
    assert_eq!(entries_named(dir.path()), vec!["x-1.21.8.jar"]);
}

#[test]
fn rerunning_a_rule_over_a_correct_file_keeps_it_correct() {
    let dir = tempfile::tempdir().expect("temp dir");
    let rule = || direct_rule("X", "https://example.test/x.jar");

    let mut transport = MockTransport::new();
    transport
        .expect_fetch_to_file()
        .times(2)
        .returning(|_url, dest| fs::write(dest, b"x payload").map_err(TransportError::Io));

    let mut log = Vec::new();
    fetch_all_with(&[rule()], dir.path(), &transport, &test_policy(), &mut log);
    fetch_all_with(&[rule()], dir.path(), &transport, &test_policy(), &mut log);

    assert_eq!(
        fs::read(dir.path().join("x.jar")).expect("placed readable"),
        b"x payload"
    );
    assert_eq!(entries_named(dir.path()), vec!["x.jar"]);
}

#[test]
fn an_empty_rule_set_is_a_logged_no_op() {
    let dir = tempfile::tempdir().expect("temp dir");
    let transport = MockTransport::new();

    let mut log = Vec::new();
    fetch_all_with(&[], dir.path(), &transport, &test_policy(), &mut log);

    let logged = String::from_utf8(log).expect("utf-8 log");
    assert!(logged.contains("no artifact rules configured"));
}

#[test]
fn the_destination_directory_is_created_when_absent() {
    let dir = tempfile::tempdir().expect("temp dir");
    let dest = dir.path().join("mods");

    let mut transport = MockTransport::new();
    transport
        .expect_fetch_to_file()
        .times(1)
        .returning(|_url, path| fs::write(path, b"ok").map_err(TransportError::Io));

    let mut log = Vec::new();
    fetch_all_with(
        &[direct_rule("X", "https://example.test/x.jar")],
        &dest,
        &transport,
        &test_policy(),
        &mut log,
    );

    assert!(dest.join("x.jar").exists());
}
