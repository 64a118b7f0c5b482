//! End-to-end tests of the catlas-search binary
//!
//! Each test writes a small radius-1 catlas into a temporary directory:
//!
//! - four original nodes; 1 and 2 carry label 1, node 3 carries label 2
//! - two dominating nodes: 10 covers nodes 1 and 2, 20 covers 3 and 4
//! - catlas leaves 100 (over 10) and 200 (over 20) under the root 300

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_catlas(root: &Path) -> PathBuf {
    let prefix = root.join("sample");
    fs::create_dir_all(&prefix).unwrap();

    fs::write(
        prefix.join("sample.gxt"),
        "4,3\nid,size,labels\n1,10,1\n2,10,1\n3,10,2\n4,10,\nsrc,dest\n1,2\n2,3\n3,4\n",
    )
    .unwrap();
    fs::write(
        prefix.join("sample.assignment.1.vxt"),
        "1,10\n2,10\n3,20\n4,20\n",
    )
    .unwrap();
    fs::write(
        prefix.join("sample.catlas.1.gxt"),
        "3,2\nid,size,level,vertex\n100,20,0,10\n200,20,0,20\n300,40,1,\nsrc,dest\n300,100\n300,200\n",
    )
    .unwrap();
    fs::write(
        prefix.join("sample.catlas.1.mxt"),
        "100,1 2 3 4\n200,5 6 7 8\n300,1 2 3 4 5 6 7 8\n",
    )
    .unwrap();

    prefix
}

fn write_query(root: &Path, hashes: &str) -> PathBuf {
    let path = root.join("query.dump");
    fs::write(&path, hashes).unwrap();
    path
}

fn search_cmd(prefix: &Path, query: &Path, labels: &str) -> Command {
    let mut cmd = Command::cargo_bin("catlas-search").unwrap();
    cmd.arg("search").arg(prefix).arg("1").arg(query).arg(labels);
    cmd
}

#[test]
fn test_best_match_finds_labelled_leaf() {
    let dir = TempDir::new().unwrap();
    let prefix = write_catlas(dir.path());
    let query = write_query(dir.path(), "1 2 3 4\n");

    search_cmd(&prefix, &query, "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("search strategy: best_match 0"))
        .stdout(predicate::str::contains("sensitivity: 100.0"))
        .stdout(predicate::str::contains("specificity: 100.0"));
}

#[test]
fn test_search_level_descends_to_leaf() {
    let dir = TempDir::new().unwrap();
    let prefix = write_catlas(dir.path());
    let query = write_query(dir.path(), "1 2 3 4");

    search_cmd(&prefix, &query, "1")
        .args(["--strategy", "search_level", "--searchlevel", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("found 1 leaves under 1 catlas nodes"))
        .stdout(predicate::str::contains("sensitivity: 100.0"));
}

#[test]
fn test_gather_mins_covers_both_leaves() {
    let dir = TempDir::new().unwrap();
    let prefix = write_catlas(dir.path());
    let query = write_query(dir.path(), "1 2 5");

    search_cmd(&prefix, &query, "1")
        .args(["--strategy", "gathermins", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sensitivity: 100.0\nspecificity: 0.0"))
        .stdout(predicate::str::contains("search strategy").not());
}

#[test]
fn test_query_without_overlap_matches_nothing() {
    let dir = TempDir::new().unwrap();
    let prefix = write_catlas(dir.path());
    let query = write_query(dir.path(), "900 901");

    search_cmd(&prefix, &query, "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("found 0 leaves under 0 catlas nodes"))
        .stdout(predicate::str::contains("sensitivity: 0.0"))
        .stdout(predicate::str::contains("specificity: 100.0"));
}

#[test]
fn test_unknown_label_reports_na() {
    let dir = TempDir::new().unwrap();
    let prefix = write_catlas(dir.path());
    let query = write_query(dir.path(), "1 2 3 4");

    search_cmd(&prefix, &query, "7")
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::contains("sensitivity: NA"));
}

#[test]
fn test_unknown_strategy_is_rejected() {
    let dir = TempDir::new().unwrap();
    let prefix = write_catlas(dir.path());
    let query = write_query(dir.path(), "1 2 3 4");

    search_cmd(&prefix, &query, "1")
        .args(["--strategy", "closest"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("closest"));
}

#[test]
fn test_invalid_label_list_is_rejected() {
    let dir = TempDir::new().unwrap();
    let prefix = write_catlas(dir.path());
    let query = write_query(dir.path(), "1 2 3 4");

    search_cmd(&prefix, &query, "1,x").assert().failure();
}

#[test]
fn test_missing_catlas_is_an_error() {
    let dir = TempDir::new().unwrap();
    let query = write_query(dir.path(), "1 2 3 4");

    search_cmd(&dir.path().join("absent"), &query, "1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load catlas"));
}

#[test]
fn test_append_csv_writes_header_once() {
    let dir = TempDir::new().unwrap();
    let prefix = write_catlas(dir.path());
    let query = write_query(dir.path(), "1 2 5");
    let csv = dir.path().join("results.csv");

    for strategy in ["best_match", "gather_mins2"] {
        search_cmd(&prefix, &query, "1")
            .args(["--strategy", strategy, "-q", "--append-csv"])
            .arg(&csv)
            .assert()
            .success();
    }

    let content = fs::read_to_string(&csv).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "sens, spec, tp, fp, fn, tn, strategy, searchlevel",
            "100.0, 100.0, 1, 0, 0, 1, best_match, 0",
            "100.0, 0.0, 1, 1, 0, 0, gather_mins2, 0",
        ]
    );
}

#[test]
fn test_json_report() {
    let dir = TempDir::new().unwrap();
    let prefix = write_catlas(dir.path());
    let query = write_query(dir.path(), "1 2 3 4");

    let output = search_cmd(&prefix, &query, "1")
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["strategy"], "best_match");
    assert_eq!(report["matched_nodes"], serde_json::json!([100]));
    assert_eq!(report["leaves"], serde_json::json!([10]));
    assert_eq!(report["matrix"]["true_positives"], 1);
    assert_eq!(report["matrix"]["true_negatives"], 1);
}
