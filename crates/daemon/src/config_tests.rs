// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fx_core::ExecutionMode;
use std::time::Duration;
use yare::parameterized;

const FULL: &str = r#"
[server]
listen = "0.0.0.0:9090"

[engine]
workers = 8
queue_capacity = 16
log_max_bytes = 4096
cancel_grace = "500ms"

[storage]
state_dir = "/var/lib/fx"

[[routes]]
app = "myapp"
path = "/hello"
image = "echo hello"

[[routes]]
app = "myapp"
path = "log/"
image = "./log.sh"
mode = "async"
timeout = 60
config = { GREETING = "hi" }
headers = { "Content-Type" = ["text/plain"] }
"#;

#[test]
fn empty_config_uses_defaults() {
    let config = Config::parse("").unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.server.listen.port(), 8080);
    assert_eq!(config.engine, EngineLimits::default());
    assert!(config.routes.is_empty());
}

#[test]
fn full_config_parses() {
    let config = Config::parse(FULL).unwrap();

    assert_eq!(config.server.listen.to_string(), "0.0.0.0:9090");
    assert_eq!(config.engine.workers, 8);
    assert_eq!(config.engine.cancel_grace, Duration::from_millis(500));
    assert_eq!(config.routes.len(), 2);

    let log = &config.routes[1];
    assert_eq!(log.path, "/log");
    assert_eq!(log.mode, ExecutionMode::Async);
    assert_eq!(log.timeout, 60);
    assert_eq!(log.config["GREETING"], "hi");
    assert_eq!(log.headers["Content-Type"], vec!["text/plain"]);

    let paths = config.paths().unwrap();
    assert_eq!(paths.wal_path, PathBuf::from("/var/lib/fx/wal/calls.wal"));
    assert_eq!(paths.lock_path, PathBuf::from("/var/lib/fx/fxd.pid"));
}

#[test]
fn duplicate_routes_are_rejected() {
    let text = r#"
[[routes]]
app = "myapp"
path = "/hello"
image = "a"

[[routes]]
app = "myapp"
path = "hello/"
image = "b"
"#;
    assert!(matches!(
        Config::parse(text),
        Err(ConfigError::DuplicateRoute { .. })
    ));
}

#[parameterized(
    empty_image = { r#"[[routes]]
app = "a"
path = "/x"
image = """# },
    zero_timeout = { r#"[[routes]]
app = "a"
path = "/x"
image = "true"
timeout = 0"# },
    unknown_key = { r#"[server]
port = 1"# },
    bad_mode = { r#"[[routes]]
app = "a"
path = "/x"
image = "true"
mode = "later""# },
)]
fn invalid_configs(text: &str) {
    assert!(Config::parse(text).is_err());
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn discover_prefers_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fxd.toml");
    std::fs::write(&path, FULL).unwrap();

    let config = Config::discover(Some(&path)).unwrap();
    assert_eq!(config.routes.len(), 2);
}
