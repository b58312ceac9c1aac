//! End-to-end tests for the `tb` binary.
//!
//! Tests the full pipeline: add → list → edit → report → rm, plus reading
//! and migrating files from the legacy data directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn tb_binary() -> String {
    env!("CARGO_BIN_EXE_tb").to_string()
}

/// Scratch environment with isolated home, data, and legacy directories.
struct Env {
    temp: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    fn data_dir(&self) -> PathBuf {
        self.temp.path().join("data")
    }

    fn legacy_dir(&self) -> PathBuf {
        self.temp.path().join("legacy")
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(tb_binary())
            .env("HOME", self.temp.path())
            .env_remove("XDG_CONFIG_HOME")
            .env_remove("RUST_LOG")
            .env("TB_DATA_DIR", self.data_dir())
            .env("TB_LEGACY_DATA_DIR", self.legacy_dir())
            .args(args)
            .output()
            .expect("failed to run tb")
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "tb {args:?} should succeed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }
}

/// Extracts the event ID from "Added <id> on <date>: ...".
fn added_id(stdout: &str) -> String {
    stdout
        .split_whitespace()
        .nth(1)
        .expect("add output should contain an ID")
        .to_string()
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_add_list_edit_report_remove() {
    let env = Env::new();
    let date = "2024-01-01";

    let late = added_id(&env.run_ok(&[
        "add", "--date", date, "--title", "Revision", "--start", "23:30", "--end", "00:15",
        "--tag", "Study",
    ]));
    let chores = added_id(&env.run_ok(&[
        "add", "--date", date, "--title", "Chores", "--start", "10:00", "--end", "10:20",
    ]));

    let partition = env.data_dir().join("2024-01-01.json");
    let stored = read_json(&partition);
    assert_eq!(stored.as_array().unwrap().len(), 2);
    assert_eq!(stored[0]["id"], late.as_str());

    let listing = env.run_ok(&["list", "--date", date]);
    let chores_pos = listing.find("Chores").unwrap();
    let revision_pos = listing.find("Revision").unwrap();
    assert!(chores_pos < revision_pos, "list should sort by start time:\n{listing}");

    env.run_ok(&["edit", &chores[..8], "--date", date, "--end", "10:30"]);
    let stored = read_json(&partition);
    assert_eq!(stored[1]["id"], chores.as_str());
    assert_eq!(stored[1]["end"], "10:30");

    let report = env.run_ok(&["report", "--from", date, "--to", date, "--json"]);
    let report: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(report["total_minutes"], 75);
    assert_eq!(report["by_tag"][0]["tag"], "(untagged)");
    assert_eq!(report["by_tag"][0]["minutes"], 30);
    assert_eq!(report["by_tag"][1]["tag"], "Study");
    assert_eq!(report["by_tag"][1]["minutes"], 45);

    env.run_ok(&["rm", &late, "--date", date]);
    let stored = read_json(&partition);
    assert_eq!(stored.as_array().unwrap().len(), 1);
    assert_eq!(stored[0]["id"], chores.as_str());
}

#[test]
fn test_add_rejects_zero_length_event() {
    let env = Env::new();

    let output = env.run(&[
        "add", "--date", "2024-01-01", "--title", "Nothing", "--start", "09:00", "--end", "09:00",
    ]);

    assert!(!output.status.success());
    assert!(!env.data_dir().join("2024-01-01.json").exists());
}

#[test]
fn test_legacy_partition_is_migrated_on_first_read() {
    let env = Env::new();
    std::fs::create_dir_all(env.legacy_dir()).unwrap();
    let legacy_file = env.legacy_dir().join("2023-12-31.json");
    std::fs::write(
        &legacy_file,
        r#"[{"title":"Party","start":"22:00","end":"01:00","tag":"Rest","description":""}]"#,
    )
    .unwrap();

    env.run_ok(&["list", "--date", "2023-12-31"]);

    let migrated = read_json(&env.data_dir().join("2023-12-31.json"));
    let id = migrated[0]["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 36);

    // Second read comes from the primary copy and keeps the same identity.
    let listing = env.run_ok(&["list", "--date", "2023-12-31", "--json"]);
    let listed: serde_json::Value = serde_json::from_str(&listing).unwrap();
    assert_eq!(listed[0]["id"], id.as_str());

    let report = env.run_ok(&["report", "--date", "2023-12-31", "--json"]);
    let report: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(report["by_tag"][0]["minutes"], 180);
}

#[test]
fn test_corrupt_date_fails_list_but_not_report() {
    let env = Env::new();
    std::fs::create_dir_all(env.data_dir()).unwrap();
    std::fs::write(env.data_dir().join("2024-02-02.json"), "{broken").unwrap();
    env.run_ok(&[
        "add", "--date", "2024-02-01", "--title", "Work", "--start", "09:00", "--end", "17:00",
        "--tag", "Work",
    ]);

    let output = env.run(&["list", "--date", "2024-02-02"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("corrupt partition"));

    let report = env.run_ok(&["report", "--from", "2024-02-02", "--to", "2024-02-01", "--json"]);
    let report: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(report["total_minutes"], 480);
    assert_eq!(report["period"]["days"], 2);
}

#[test]
fn test_unknown_event_id_is_reported() {
    let env = Env::new();
    let output = env.run(&[
        "rm",
        "67e55044-10b1-426f-9247-bb680e5fe0c8",
        "--date",
        "2024-01-01",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}
