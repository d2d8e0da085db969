//! CLI integration tests for the one-shot subcommands.
//!
//! Uses `assert_cmd` to spawn the `leadbook` binary against a data file in
//! a fresh temp directory and verifies exit codes, stdout and stderr.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    fn data_file(&self) -> PathBuf {
        self.dir.path().join("leads.json")
    }

    /// A `leadbook` command rooted in the temp dir, isolated from the
    /// caller's environment.
    fn leadbook(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("leadbook");
        cmd.current_dir(self.dir.path())
            .env_remove("LEADBOOK_DATA")
            .env_remove("LEADBOOK_PORT")
            .env_remove("LEADBOOK_RATE_LIMIT")
            .env("LEADBOOK_LOG", "off")
            .arg("--data")
            .arg(self.data_file());
        cmd
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .leadbook()
            .args(["--output", "json"])
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("valid JSON on stdout")
    }

    fn create(&self, name: &str, value: &str, probability: &str) -> String {
        let lead = self.json(&[
            "create",
            "--name",
            name,
            "--email",
            &format!("{}@example.com", name.to_lowercase()),
            "--company",
            "Acme",
            "--service",
            "Consulting",
            "--value",
            value,
            "--probability",
            probability,
        ]);
        lead["id"].as_str().expect("id").to_string()
    }
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    Workspace::new()
        .leadbook()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Lead pipeline and revenue forecast"));
}

#[test]
fn version_exits_0() {
    Workspace::new()
        .leadbook()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("leadbook"));
}

// ──────────────────────────────────────────────
// 2. Create, list, show
// ──────────────────────────────────────────────

#[test]
fn empty_data_file_lists_nothing() {
    let ws = Workspace::new();
    ws.leadbook()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("no leads"));
    assert!(!ws.data_file().exists());
}

#[test]
fn create_persists_new_lead() {
    let ws = Workspace::new();
    let id = ws.create("Ada", "2000", "50");
    assert!(ws.data_file().exists());

    let lead = ws.json(&["show", &id]);
    assert_eq!(lead["lead"]["status"], "New");
    assert_eq!(lead["lead"]["source"], "manual");
    assert_eq!(lead["lead"]["expected_value"], "2000");
    assert_eq!(lead["activity"][0]["type"], "created");
    assert_eq!(lead["activity"][0]["description"], "Lead created manually");
}

#[test]
fn create_without_name_fails() {
    let ws = Workspace::new();
    ws.leadbook()
        .args(["create", "--name", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid name"));
}

#[test]
fn list_searches_and_paginates() {
    let ws = Workspace::new();
    for name in ["Ada", "Bob", "Cyd"] {
        ws.create(name, "100", "10");
    }

    let page = ws.json(&["list", "--search", "BOB"]);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["name"], "Bob");

    let page = ws.json(&["list", "--per-page", "2", "--page", "2"]);
    assert_eq!(page["total"], 3);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["items"].as_array().map(Vec::len), Some(1));
}

#[test]
fn show_unknown_lead_fails() {
    let ws = Workspace::new();
    ws.leadbook()
        .args(["show", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lead not found: nope"));
}

#[test]
fn json_errors_go_to_stderr_as_json() {
    let ws = Workspace::new();
    let output = ws
        .leadbook()
        .args(["--output", "json", "show", "nope"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let err: serde_json::Value =
        serde_json::from_slice(&output).expect("JSON error on stderr");
    assert!(err["error"].as_str().unwrap_or("").contains("nope"));
}

// ──────────────────────────────────────────────
// 3. Status changes
// ──────────────────────────────────────────────

#[test]
fn won_pins_probability_to_100() {
    let ws = Workspace::new();
    let id = ws.create("Ada", "1000", "0");

    let lead = ws.json(&["status", &id, "Won"]);
    assert_eq!(lead["status"], "Won");
    assert_eq!(lead["probability"], 100);

    let shown = ws.json(&["show", &id]);
    assert_eq!(shown["activity"][0]["type"], "status_change");
    assert_eq!(shown["activity"][0]["description"], "Status updated to Won");
}

#[test]
fn unknown_stage_is_rejected_and_nothing_changes() {
    let ws = Workspace::new();
    let id = ws.create("Ada", "1000", "30");

    ws.leadbook()
        .args(["status", id.as_str(), "Archived"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid status 'Archived'"));

    let shown = ws.json(&["show", &id]);
    assert_eq!(shown["lead"]["status"], "New");
    assert_eq!(shown["activity"].as_array().map(Vec::len), Some(1));
}

#[test]
fn stage_slugs_are_accepted() {
    let ws = Workspace::new();
    let id = ws.create("Ada", "1000", "30");
    let lead = ws.json(&["status", &id, "proposal-sent"]);
    assert_eq!(lead["status"], "Proposal Sent");
}

#[test]
fn move_to_current_stage_logs_nothing() {
    let ws = Workspace::new();
    let id = ws.create("Ada", "1000", "30");
    ws.json(&["move", &id, "New"]);
    ws.json(&["move", &id, "Qualified"]);

    let shown = ws.json(&["show", &id]);
    assert_eq!(shown["lead"]["status"], "Qualified");
    assert_eq!(shown["activity"].as_array().map(Vec::len), Some(2));
}

#[test]
fn update_edits_fields_and_clears_owner() {
    let ws = Workspace::new();
    let id = ws.create("Ada", "1000", "30");

    let lead = ws.json(&["update", &id, "--owner", "u-7", "--probability", "65"]);
    assert_eq!(lead["owner_id"], "u-7");
    assert_eq!(lead["probability"], 65);

    let lead = ws.json(&["update", &id, "--clear-owner"]);
    assert!(lead["owner_id"].is_null());

    ws.leadbook()
        .args(["update", id.as_str(), "--probability", "120"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid probability"));
}

// ──────────────────────────────────────────────
// 4. Archive, restore, delete, notes
// ──────────────────────────────────────────────

#[test]
fn archive_and_restore_move_between_lists() {
    let ws = Workspace::new();
    let id = ws.create("Ada", "1000", "30");

    ws.json(&["archive", &id]);
    assert_eq!(ws.json(&["list"])["total"], 0);
    assert_eq!(ws.json(&["list", "--archived"])["total"], 1);

    ws.json(&["restore", &id]);
    assert_eq!(ws.json(&["list"])["total"], 1);
    let shown = ws.json(&["show", &id]);
    let kinds: Vec<&str> = shown["activity"]
        .as_array()
        .map(|a| a.iter().filter_map(|r| r["type"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(kinds, ["archived", "created"]);
}

#[test]
fn notes_are_listed_with_lead() {
    let ws = Workspace::new();
    let id = ws.create("Ada", "1000", "30");
    ws.json(&["note", &id, "Asked for a quote"]);

    let shown = ws.json(&["show", &id]);
    assert_eq!(shown["notes"][0]["note"], "Asked for a quote");
    assert_eq!(shown["activity"][0]["type"], "note_added");

    ws.leadbook()
        .args(["note", id.as_str(), "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("note text must not be empty"));
}

#[test]
fn delete_removes_lead() {
    let ws = Workspace::new();
    let id = ws.create("Ada", "1000", "30");
    ws.leadbook()
        .args(["delete", id.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("deleted {}", id)));
    ws.leadbook().args(["show", id.as_str()]).assert().failure();

    let raw = fs::read_to_string(ws.data_file()).expect("data file");
    assert!(raw.contains("Lead created manually"));
}

// ──────────────────────────────────────────────
// 5. Forecast and reports
// ──────────────────────────────────────────────

#[test]
fn forecast_matches_worked_example() {
    let ws = Workspace::new();
    let won = ws.create("Won", "1000", "40");
    let negotiating = ws.create("Neg", "2000", "50");
    let lost = ws.create("Lost", "500", "10");
    ws.json(&["status", &won, "Won"]);
    ws.json(&["status", &negotiating, "Negotiation"]);
    ws.json(&["status", &lost, "Lost"]);

    let summary = ws.json(&["forecast"]);
    assert_eq!(summary["weighted_pipeline"], "1000");
    assert_eq!(summary["closed_revenue"], "1000");
    assert_eq!(summary["win_rate"], 50);

    let board = ws.json(&["pipeline"]);
    let columns = board.as_array().expect("array");
    assert_eq!(columns.len(), 7);
    assert_eq!(columns[4]["stage"], "Negotiation");
    assert_eq!(columns[4]["weighted_total"], "1000");
    assert_eq!(columns[6]["stage"], "Lost");
    assert_eq!(columns[6]["weighted_total"], "50");
}

#[test]
fn forecast_text_output() {
    let ws = Workspace::new();
    ws.leadbook()
        .arg("forecast")
        .assert()
        .success()
        .stdout(predicate::str::contains("win rate:          0%"));
}

#[test]
fn dashboard_counts_new_leads() {
    let ws = Workspace::new();
    ws.create("Ada", "10", "10");
    ws.create("Bob", "10", "10");
    let stats = ws.json(&["dashboard"]);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["this_month"], 2);
    assert_eq!(stats["this_week"], 2);
}

// ──────────────────────────────────────────────
// 6. Configuration
// ──────────────────────────────────────────────

#[test]
fn config_page_size_applies_to_list() {
    let ws = Workspace::new();
    for name in ["Ada", "Bob", "Cyd"] {
        ws.create(name, "100", "10");
    }
    let config = ws.dir.path().join("custom.toml");
    fs::write(&config, "page_size = 2\n").expect("write config");

    let output = ws
        .leadbook()
        .args(["--output", "json", "--config"])
        .arg(&config)
        .arg("list")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let page: serde_json::Value = serde_json::from_slice(&output).expect("JSON");
    assert_eq!(page["per_page"], 2);
    assert_eq!(page["total_pages"], 2);
}

#[test]
fn invalid_config_fails() {
    let ws = Workspace::new();
    fs::write(ws.dir.path().join("leadbook.toml"), "colour = 1\n").expect("write config");
    ws.leadbook()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config error"));
}

#[test]
fn missing_explicit_config_fails() {
    let ws = Workspace::new();
    ws.leadbook()
        .args(["--config", "nowhere.toml", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read 'nowhere.toml'"));
}
