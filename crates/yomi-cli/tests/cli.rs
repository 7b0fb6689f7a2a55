//! Integration tests for the yomi CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Page with a title, a 2x2 table and a footer, listed out of order.
const PAGE: &str = r#"{
  "words": [
    {"points": [[10, 210], [90, 210], [90, 230], [10, 230]], "content": "Footer", "det_score": 0.9, "rec_score": 0.9},
    {"points": [[10, 10], [90, 10], [90, 30], [10, 30]], "content": "Title", "det_score": 0.9, "rec_score": 0.9},
    {"points": [[10, 105], [90, 105], [90, 125], [10, 125]], "content": "Name", "det_score": 0.9, "rec_score": 0.9},
    {"points": [[110, 105], [190, 105], [190, 125], [110, 125]], "content": "Qty", "det_score": 0.9, "rec_score": 0.9},
    {"points": [[10, 135], [90, 135], [90, 155], [10, 155]], "content": "Apple", "det_score": 0.9, "rec_score": 0.9},
    {"points": [[110, 135], [190, 135], [190, 155], [110, 155]], "content": "3", "det_score": 0.9, "rec_score": 0.9}
  ],
  "paragraphs": [
    {"box": [0, 200, 200, 240], "score": 0.9},
    {"box": [0, 0, 200, 40], "score": 0.9}
  ],
  "tables": [
    {
      "box": [0, 100, 200, 160],
      "score": 0.9,
      "offset": [0, 100],
      "rows": [{"box": [0, 0, 200, 30]}, {"box": [0, 30, 200, 60]}],
      "cols": [{"box": [0, 0, 100, 60]}, {"box": [100, 0, 200, 60]}]
    }
  ]
}"#;

/// CLI command isolated from the user's configuration directory.
fn cli(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("yomi").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home);
    cmd
}

fn write_page(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_help() {
    let home = TempDir::new().unwrap();
    cli(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("batch"));
}

#[test]
fn test_analyze_json() {
    let home = TempDir::new().unwrap();
    let input = write_page(home.path(), "page.json", PAGE);

    let output = cli(home.path()).arg("analyze").arg(&input).output().unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["policy"], "horizontal");
    assert_eq!(doc["paragraphs"][0]["contents"], "Title");
    assert_eq!(doc["paragraphs"][0]["order"], 0);
    assert_eq!(doc["tables"][0]["order"], 1);
    assert_eq!(doc["paragraphs"][1]["contents"], "Footer");
    assert_eq!(doc["tables"][0]["cells"].as_array().unwrap().len(), 4);
}

#[test]
fn test_analyze_markdown() {
    let home = TempDir::new().unwrap();
    let input = write_page(home.path(), "page.json", PAGE);

    cli(home.path())
        .args(["analyze", "--format", "markdown"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Title\n\n|Name|Qty|\n|-|-|\n|Apple|3|\n\nFooter"));
}

#[test]
fn test_analyze_html_to_file() {
    let home = TempDir::new().unwrap();
    let input = write_page(home.path(), "page.json", PAGE);
    let out = home.path().join("page.html");

    cli(home.path())
        .args(["analyze", "-f", "html", "-o"])
        .arg(&out)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let html = fs::read_to_string(&out).unwrap();
    assert!(html.starts_with("<html><body><p>Title</p><table"));
    assert!(html.contains("<td rowspan=\"1\" colspan=\"1\">Apple</td>"));
}

#[test]
fn test_analyze_csv() {
    let home = TempDir::new().unwrap();
    let input = write_page(home.path(), "page.json", PAGE);

    cli(home.path())
        .args(["analyze", "-f", "csv"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Title\n"))
        .stdout(predicate::str::contains("Name,Qty\nApple,3\n"));
}

#[test]
fn test_analyze_missing_file() {
    let home = TempDir::new().unwrap();
    cli(home.path())
        .args(["analyze", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_analyze_rejects_bad_quad() {
    let home = TempDir::new().unwrap();
    let input = write_page(
        home.path(),
        "bad.json",
        r#"{"words": [{"points": [[0, 0], [1, 0], [1, 1]], "content": "x"}]}"#,
    );

    cli(home.path())
        .arg("analyze")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("4 points"));
}

#[test]
fn test_batch_with_summary() {
    let home = TempDir::new().unwrap();
    let pages = home.path().join("pages");
    fs::create_dir_all(&pages).unwrap();
    write_page(&pages, "a.json", PAGE);
    write_page(&pages, "b.json", r#"{"words": []}"#);
    let out = home.path().join("out");

    cli(home.path())
        .arg("batch")
        .arg(format!("{}/*.json", pages.display()))
        .arg("--output-dir")
        .arg(&out)
        .args(["--format", "text", "--summary", "-j", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 successful, 0 failed"));

    let text = fs::read_to_string(out.join("a.txt")).unwrap();
    assert!(text.contains("Title"));
    assert!(out.join("b.txt").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status,policy"));
    assert!(summary.contains("a.json,success,horizontal,2,1,0,6"));
}

#[test]
fn test_batch_refuses_to_overwrite_inputs() {
    let home = TempDir::new().unwrap();
    let pages = home.path().join("pages");
    fs::create_dir_all(&pages).unwrap();
    let input = write_page(&pages, "a.json", PAGE);

    cli(home.path())
        .arg("batch")
        .arg(format!("{}/*.json", pages.display()))
        .arg("--output-dir")
        .arg(&pages)
        .assert()
        .failure()
        .stderr(predicate::str::contains("would overwrite the input file"));

    assert_eq!(fs::read_to_string(&input).unwrap(), PAGE);

    // A format whose extension differs may share the input directory
    cli(home.path())
        .arg("batch")
        .arg(format!("{}/*.json", pages.display()))
        .arg("--output-dir")
        .arg(&pages)
        .args(["--format", "markdown"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&input).unwrap(), PAGE);
    assert!(pages.join("a.md").exists());
}

#[test]
fn test_batch_continue_on_error() {
    let home = TempDir::new().unwrap();
    let pages = home.path().join("pages");
    fs::create_dir_all(&pages).unwrap();
    write_page(&pages, "good.json", PAGE);
    write_page(&pages, "broken.json", "{not json");

    cli(home.path())
        .arg("batch")
        .arg(format!("{}/*.json", pages.display()))
        .assert()
        .failure();

    cli(home.path())
        .arg("batch")
        .arg(format!("{}/*.json", pages.display()))
        .arg("--continue-on-error")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 successful, 1 failed"));
}

#[test]
fn test_batch_no_matches() {
    let home = TempDir::new().unwrap();
    cli(home.path())
        .arg("batch")
        .arg(format!("{}/*.json", home.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn test_config_set_get_and_use() {
    let home = TempDir::new().unwrap();

    cli(home.path())
        .args(["config", "set", "reading_order.policy", "vertical"])
        .assert()
        .success();

    cli(home.path())
        .args(["config", "get", "reading_order.policy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"vertical\""));

    assert!(home.path().join("yomi").join("config.json").exists());

    let input = write_page(home.path(), "page.json", PAGE);
    let output = cli(home.path()).arg("analyze").arg(&input).output().unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["policy"], "vertical");
}

#[test]
fn test_config_rejects_unknown_key_and_bad_value() {
    let home = TempDir::new().unwrap();

    cli(home.path())
        .args(["config", "set", "layout.nope", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    cli(home.path())
        .args(["config", "set", "table.span_threshold", "2.0"])
        .assert()
        .failure();
}

#[test]
fn test_config_init_refuses_overwrite() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("custom.json");

    cli(home.path())
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .success();

    cli(home.path())
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    let config: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(config["aggregation"]["cell_threshold"], 0.6);
}
