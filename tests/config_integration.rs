//! Integration tests for update plans
//!
//! Tests loading, guards, dry runs and write-back over a copied fixture tree

use pom_patcher::config::{
    apply_updates, check_updates, load_from_path, load_from_str, ApplicationError, ConfigError,
    PlanOrigin, Target, UpdateResult,
};
use pom_patcher::log::{NoopLog, RecordingLog, Severity};
use pom_patcher::model::{DiscoveryOptions, FsSource, MissingModulePolicy, ModelTree};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Copy the findProperty fixture into a scratch directory
fn setup_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    copy_dir(
        &Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("findProperty"),
        dir.path(),
    );
    dir
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).unwrap();
        }
    }
}

fn load(dir: &Path) -> ModelTree {
    ModelTree::load(dir, &DiscoveryOptions::default(), &FsSource, &NoopLog).unwrap()
}

fn read(dir: &Path, relative: &str) -> String {
    fs::read_to_string(dir.join(relative)).unwrap()
}

#[test]
fn test_load_plan_from_path() {
    let dir = TempDir::new().unwrap();
    let plan = dir.path().join("plan.toml");
    fs::write(
        &plan,
        r#"
[meta]
name = "bump-a"
description = "Raise property a everywhere it is defined"
missing_modules = "fail"

[[updates]]
id = "a-from-grandchild"
target = { type = "property", name = "a" }
value = "2.0"
module = "grandchild"
"#,
    )
    .unwrap();

    let config = load_from_path(&plan).unwrap();
    assert_eq!(config.meta.name, "bump-a");
    assert_eq!(config.meta.missing_modules, MissingModulePolicy::Fail);
    assert_eq!(config.updates.len(), 1);
    assert_eq!(
        config.updates[0].target,
        Target::Property {
            name: "a".to_string()
        }
    );
}

#[test]
fn test_invalid_plan_reports_path() {
    let dir = TempDir::new().unwrap();
    let plan = dir.path().join("broken.toml");
    fs::write(
        &plan,
        r#"
[[updates]]
id = "bad-guard"
target = { type = "project-version" }
value = "2.0"
only_if = "[2.0,1.0]"
"#,
    )
    .unwrap();

    let err = load_from_path(&plan).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Validation {
            origin: PlanOrigin::File(_),
            ..
        }
    ));
    let message = err.to_string();
    assert!(message.contains("broken.toml"));
    assert!(message.contains("bad-guard"));
}

#[test]
fn test_property_updates_hit_owning_descriptors() {
    let dir = setup_workspace();
    let mut tree = load(dir.path());
    let config = load_from_str(
        r#"
[[updates]]
id = "a-via-grandchild"
target = { type = "property", name = "a" }
value = "from-grandchild"
module = "grandchild"

[[updates]]
id = "a-via-child-b"
target = { type = "property", name = "a" }
value = "from-child-b"
module = "childB"

[[updates]]
id = "b"
target = { type = "property", name = "b" }
value = "new-b"
module = "childB"
"#,
    )
    .unwrap();

    let results = apply_updates(&config, &mut tree, &NoopLog);
    for (id, result) in &results {
        assert!(
            matches!(result, Ok(UpdateResult::Applied { .. })),
            "{id}: {result:?}"
        );
    }

    assert!(read(dir.path(), "childA/pom.xml").contains("<a>from-grandchild</a>"));
    assert!(read(dir.path(), "pom.xml").contains("<a>from-child-b</a>"));
    assert!(read(dir.path(), "childB/pom.xml").contains("<b>new-b</b>"));
    assert!(!read(dir.path(), "childA/grandchild/pom.xml").contains("<a>"));
}

#[test]
fn test_guarded_version_updates() {
    let dir = setup_workspace();
    let mut tree = load(dir.path());
    let config = load_from_str(
        r#"
[[updates]]
id = "bump-child-a"
target = { type = "project-version" }
value = "1.1"
module = "childA"
only_if = "[1.0,2.0)"

[[updates]]
id = "never"
target = { type = "project-version" }
value = "3.0"
module = "childB"
only_if = "[2.0,)"

[[updates]]
id = "grandchild-parent"
target = { type = "parent-version" }
value = "1.1"
module = "grandchild"
"#,
    )
    .unwrap();

    let results = apply_updates(&config, &mut tree, &NoopLog);
    assert!(matches!(results[0].1, Ok(UpdateResult::Applied { .. })));
    assert!(matches!(results[1].1, Ok(UpdateResult::Skipped { .. })));
    assert!(matches!(results[2].1, Ok(UpdateResult::Applied { .. })));

    let child_a = read(dir.path(), "childA/pom.xml");
    assert!(child_a.contains("<artifactId>childA</artifactId>\n  <version>1.1</version>"));
    // The parent reference of childA is untouched
    assert!(child_a.contains("<artifactId>grandparent</artifactId>\n    <version>1.0</version>"));
    let grandchild = read(dir.path(), "childA/grandchild/pom.xml");
    assert!(grandchild.contains("<artifactId>childA</artifactId>\n    <version>1.1</version>"));
    assert!(read(dir.path(), "childB/pom.xml").contains("<version>1.0</version>"));
}

#[test]
fn test_check_updates_is_read_only() {
    let dir = setup_workspace();
    let before = read(dir.path(), "pom.xml");
    let tree = load(dir.path());
    let config = load_from_str(
        r#"
[[updates]]
id = "a"
target = { type = "property", name = "a" }
value = "changed"

[[updates]]
id = "a-again"
target = { type = "property", name = "a" }
value = "grandparent-a"
"#,
    )
    .unwrap();

    let results = check_updates(&config, &tree, &NoopLog);
    assert!(matches!(results[0].1, Ok(UpdateResult::Applied { .. })));
    assert!(matches!(results[1].1, Ok(UpdateResult::Applied { .. })));
    assert_eq!(read(dir.path(), "pom.xml"), before);

    // Re-running the original value against the unchanged tree is a no-op
    let config = load_from_str(
        r#"
[[updates]]
id = "same"
target = { type = "property", name = "a" }
value = "grandparent-a"
"#,
    )
    .unwrap();
    let results = check_updates(&config, &tree, &NoopLog);
    assert!(matches!(results[0].1, Ok(UpdateResult::AlreadySet { .. })));
}

#[test]
fn test_unknown_targets_are_errors() {
    let dir = setup_workspace();
    let mut tree = load(dir.path());
    let config = load_from_str(
        r#"
[[updates]]
id = "undefined"
target = { type = "property", name = "b" }
value = "x"
module = "grandchild"

[[updates]]
id = "typo"
target = { type = "property", name = "aa" }
value = "x"
"#,
    )
    .unwrap();

    let log = RecordingLog::new();
    let results = apply_updates(&config, &mut tree, &log);
    match &results[0].1 {
        Err(ApplicationError::UnknownProperty { name, .. }) => assert_eq!(name, "b"),
        other => panic!("unexpected {other:?}"),
    }
    match &results[1].1 {
        Err(ApplicationError::UnknownProperty { suggestion, .. }) => {
            assert_eq!(suggestion.as_deref(), Some("a"))
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(log.messages(Severity::Warn).len(), 2);
}

#[test]
fn test_formatting_is_preserved() {
    let dir = setup_workspace();
    let before = read(dir.path(), "childB/pom.xml");
    let mut tree = load(dir.path());
    let config = load_from_str(
        r#"
[[updates]]
id = "b"
target = { type = "property", name = "b" }
value = "childB-b-2"
module = "childB"
"#,
    )
    .unwrap();
    let results = apply_updates(&config, &mut tree, &NoopLog);
    assert!(matches!(results[0].1, Ok(UpdateResult::Applied { .. })));
    assert_eq!(
        read(dir.path(), "childB/pom.xml"),
        before.replace("<b>childB-b</b>", "<b>childB-b-2</b>")
    );
}
