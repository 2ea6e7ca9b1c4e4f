//! End-to-end tests driving the `chips` binary.
//!
//! Each test runs in a sandbox with its own config file so a user's
//! `~/.config/chips` never leaks into the results.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use serial_test::serial;
use tempfile::TempDir;

const CATALOG: &str = r#"
[[options]]
name = "report"
title = "Report"
type = "integer"
readonly = true

[[options]]
name = "branch"
title = "Branch"
type = "integer"
pattern = '^\d{3}$'
values = [172, 680]

[[options]]
name = "open"
title = "Open"
type = "tag"

[[items]]
option = "report"
value = 1203001
"#;

fn chips_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_chips"))
}

fn sample_catalog_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("catalogs/sample.toml")
}

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary sandbox");
        fs::write(dir.path().join("catalog.toml"), CATALOG).expect("failed to write catalog");
        Self { dir }
    }

    fn catalog(&self) -> PathBuf {
        self.dir.path().join("catalog.toml")
    }

    fn write_script(&self, lines: &[&str]) -> PathBuf {
        let path = self.dir.path().join("session.chips");
        fs::write(&path, lines.join("\n")).expect("failed to write script");
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(chips_binary_path())
            .args(args)
            .env("CHIPS_CONFIG", self.dir.path().join("config.toml"))
            .env("XDG_CONFIG_HOME", self.dir.path().join("xdg-config"))
            .env_remove("CHIPS_CATALOG")
            .env_remove("CHIPS_LOG")
            .env("NO_COLOR", "1")
            .output()
            .expect("failed to run chips binary")
    }
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
#[serial]
fn test_scripted_session_emits_search() {
    let sandbox = Sandbox::new();
    let script = sandbox.write_script(&[
        "# add a branch and search",
        "option bra",
        "value 680",
        "add",
        "search",
    ]);
    let catalog = sandbox.catalog();

    let output = sandbox.run(&[
        "-q",
        "run",
        "-c",
        catalog.to_str().unwrap(),
        "-s",
        script.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{:?}", output);

    let json = stdout_json(&output);
    let items = json["search"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["option"], "Report");
    assert_eq!(items[1]["name"], "branch");
    assert_eq!(items[1]["value"], 680);
}

#[test]
#[serial]
fn test_script_error_reports_line() {
    let sandbox = Sandbox::new();
    let script = sandbox.write_script(&["option branch", "frobnicate"]);
    let catalog = sandbox.catalog();

    let output = sandbox.run(&[
        "--json",
        "-q",
        "run",
        "-c",
        catalog.to_str().unwrap(),
        "-s",
        script.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let stderr: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(stderr["error"]["code"], "SCRIPT_ERROR");
    assert!(stderr["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("line 2:"));
}

#[test]
#[serial]
fn test_run_without_catalog_is_config_error() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["-q", "run"]);
    assert_eq!(output.status.code(), Some(5));
}

#[test]
#[serial]
fn test_check_sample_catalog() {
    let sandbox = Sandbox::new();
    let catalog = sample_catalog_path();

    let output = sandbox.run(&["--json", "check", "-c", catalog.to_str().unwrap()]);
    assert!(output.status.success(), "{:?}", output);

    let json = stdout_json(&output);
    let options = json["options"].as_array().unwrap();
    assert_eq!(options.len(), 9);
    assert_eq!(options[0]["name"], "report");
    assert_eq!(json["items"], 2);
}

#[test]
#[serial]
fn test_check_reports_unknown_item_option() {
    let sandbox = Sandbox::new();
    let path = sandbox.dir.path().join("broken.toml");
    fs::write(
        &path,
        "[[options]]\ntitle = \"Branch\"\ntype = \"integer\"\n\n[[items]]\noption = \"Brnch\"\n",
    )
    .unwrap();

    let output = sandbox.run(&["check", "-c", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Did you mean 'Branch'?"), "{stderr}");
}

#[test]
#[serial]
fn test_config_set_then_run_uses_default_catalog() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.catalog();

    let output = sandbox.run(&["-q", "config", "set", "default_catalog", catalog.to_str().unwrap()]);
    assert!(output.status.success(), "{:?}", output);

    let script = sandbox.write_script(&["search"]);
    let output = sandbox.run(&["-q", "run", "-s", script.to_str().unwrap()]);
    assert!(output.status.success(), "{:?}", output);

    let json = stdout_json(&output);
    assert_eq!(json["search"][0]["value"], 1203001);
}
