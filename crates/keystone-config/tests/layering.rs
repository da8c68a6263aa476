//! Layered loading against files on disk.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use keystone_config::loader::{self, LOG_LEVEL_VAR, PLUGIN_PATHS_VAR, WORKSPACE_FILE};
use keystone_config::{ConfigError, LoadSources};

fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn no_files_yields_defaults() {
    let resolved = loader::load(&LoadSources::default()).unwrap();
    assert_eq!(resolved.config.logging.level, "info");
    assert!(resolved.config.plugins.paths.is_empty());
    assert!(resolved.loaded_files.is_empty());
}

#[test]
fn workspace_overrides_user() {
    let dir = tempfile::tempdir().unwrap();
    let user = write(
        &dir,
        "user.toml",
        "[plugins]\npaths = [\"user.so\"]\nstrict = true\n[logging]\nlevel = \"debug\"\n",
    );
    write(&dir, WORKSPACE_FILE, "[plugins]\npaths = [\"ws.so\"]\n");

    let resolved = loader::load(&LoadSources {
        user_file: Some(user.clone()),
        workspace_root: Some(dir.path().to_path_buf()),
        ..LoadSources::default()
    })
    .unwrap();

    assert_eq!(resolved.config.plugins.paths, vec![PathBuf::from("ws.so")]);
    assert!(resolved.config.plugins.strict);
    assert_eq!(resolved.config.logging.level, "debug");
    assert_eq!(
        resolved.loaded_files,
        vec![user, dir.path().join(WORKSPACE_FILE)]
    );
}

#[test]
fn explicit_file_replaces_workspace_file() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir, WORKSPACE_FILE, "[logging]\nlevel = \"trace\"\n");
    let explicit = write(&dir, "other.toml", "[logging]\nlevel = \"warn\"\n");

    let resolved = loader::load(&LoadSources {
        workspace_root: Some(dir.path().to_path_buf()),
        explicit: Some(explicit),
        ..LoadSources::default()
    })
    .unwrap();

    assert_eq!(resolved.config.logging.level, "warn");
    assert_eq!(resolved.loaded_files.len(), 1);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = loader::load(&LoadSources {
        explicit: Some(dir.path().join("absent.toml")),
        ..LoadSources::default()
    })
    .unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "got {err:?}");
}

#[test]
fn malformed_file_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write(&dir, "bad.toml", "[plugins\npaths = 3\n");

    let err = loader::load(&LoadSources {
        explicit: Some(bad.clone()),
        ..LoadSources::default()
    })
    .unwrap_err();

    assert!(matches!(err, ConfigError::ParseError { .. }));
    assert!(err.to_string().contains(&bad.display().to_string()));
}

#[test]
fn invalid_values_fail_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "keystone.toml", "[logging]\nformat = \"xml\"\n");

    let err = loader::load(&LoadSources {
        workspace_root: Some(dir.path().to_path_buf()),
        ..LoadSources::default()
    })
    .unwrap_err();

    assert!(matches!(err, ConfigError::ValidationError { .. }), "{path:?}: {err}");
}

#[test]
fn env_fallbacks_apply() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir, WORKSPACE_FILE, "[plugins]\npaths = [\"first.so\"]\n");
    let env = HashMap::from([
        (LOG_LEVEL_VAR.to_owned(), "error".to_owned()),
        (PLUGIN_PATHS_VAR.to_owned(), "second.so".to_owned()),
    ]);

    let resolved = loader::load(&LoadSources {
        workspace_root: Some(dir.path().to_path_buf()),
        env,
        ..LoadSources::default()
    })
    .unwrap();

    assert_eq!(resolved.config.logging.level, "error");
    assert_eq!(
        resolved.config.plugins.paths,
        vec![PathBuf::from("first.so"), PathBuf::from("second.so")]
    );
}

#[test]
fn resolved_config_renders_as_toml() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir, WORKSPACE_FILE, "[plugins]\npaths = [\"echo.so\"]\n");

    let resolved = loader::load(&LoadSources {
        workspace_root: Some(dir.path().to_path_buf()),
        ..LoadSources::default()
    })
    .unwrap();
    let rendered = resolved.to_toml().unwrap();

    assert!(rendered.contains("[plugins]"));
    assert!(rendered.contains("echo.so"));
    let reparsed: keystone_config::Config = toml::from_str(&rendered).unwrap();
    assert_eq!(reparsed, resolved.config);
}
