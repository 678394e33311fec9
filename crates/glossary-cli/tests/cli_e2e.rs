//! End-to-end tests driving the `glossary` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::tempdir;

const DATASET: &str = r#"
person:
- name: Jane
term_status:
- status: Draft
terms:
- name: Account
  status: Draft
  owner: Jane
  categories: [Finance]
- name: Balance
  status: Draft
  owner: Jane
tables:
- name: accounts
columns:
- name: acct_id
  table: accounts
  terms: [Account]
related_terms:
- term: Account
  related_terms: [Balance]
"#;

fn glossary_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_glossary"))
}

fn glossary(db: &Path, args: &[&str]) -> Output {
    Command::new(glossary_bin())
        .arg("--db")
        .arg(db)
        .args(args)
        .env("NO_COLOR", "1")
        .env("CLICOLOR", "0")
        .env("RUST_LOG", "off")
        .output()
        .expect("run glossary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn load_reports_json_and_is_idempotent() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("g.gldb");
    let input = dir.path().join("in.yaml");
    fs::write(&input, DATASET).unwrap();

    let first = glossary(&db, &["load", input.to_str().unwrap(), "--json-report"]);
    assert_eq!(first.status.code(), Some(0), "{}", String::from_utf8_lossy(&first.stderr));
    let report: serde_json::Value = serde_json::from_str(&stdout(&first)).unwrap();
    assert_eq!(report["kinds"]["term"]["created"], 2);
    assert_eq!(report["kinds"]["category"]["stub_created"], 1);
    assert!(db.exists());

    let second = glossary(&db, &["load", input.to_str().unwrap(), "--json-report"]);
    let report: serde_json::Value = serde_json::from_str(&stdout(&second)).unwrap();
    assert_eq!(report["kinds"]["term"]["created"], 0);
    assert_eq!(report["kinds"]["term"]["duplicate_skipped"], 2);
}

#[test]
fn dump_output_reloads_to_same_stats() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("g.gldb");
    let input = dir.path().join("in.yaml");
    let dumped = dir.path().join("out.yaml");
    fs::write(&input, DATASET).unwrap();

    assert!(glossary(&db, &["load", input.to_str().unwrap()]).status.success());
    assert!(glossary(&db, &["dump", dumped.to_str().unwrap()]).status.success());
    let stats = stdout(&glossary(&db, &["stats"]));

    let copy = dir.path().join("copy.gldb");
    assert!(glossary(&copy, &["load", dumped.to_str().unwrap()]).status.success());
    assert_eq!(stdout(&glossary(&copy, &["stats"])), stats);
    assert!(stats.contains("related_term"));
}

#[test]
fn exports_write_files() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("g.gldb");
    let input = dir.path().join("in.yaml");
    let csv = dir.path().join("columns.csv");
    let json = dir.path().join("terms.json");
    fs::write(&input, DATASET).unwrap();

    assert!(glossary(&db, &["load", input.to_str().unwrap()]).status.success());
    assert!(glossary(&db, &["export-columns", csv.to_str().unwrap()]).status.success());
    assert!(glossary(&db, &["export-json", json.to_str().unwrap()]).status.success());

    assert_eq!(
        fs::read_to_string(&csv).unwrap(),
        "term,table,column\nAccount,accounts,acct_id\n"
    );
    let terms: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(terms[0]["name"], "Account");
    assert_eq!(terms[0]["related_terms"][0], "Balance");
}

#[test]
fn malformed_input_exits_one_and_keeps_store() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("g.gldb");
    let input = dir.path().join("bad.yaml");
    fs::write(&input, "- not\n- sections\n").unwrap();

    let output = glossary(&db, &["load", input.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed input"));
    assert!(!db.exists());
}

#[test]
fn strict_load_fails_on_warnings() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("g.gldb");
    let input = dir.path().join("in.yaml");
    fs::write(&input, "rules:\n- name: R\n  terms: [Ghost]\n").unwrap();

    let lenient = glossary(&db, &["load", input.to_str().unwrap()]);
    assert_eq!(lenient.status.code(), Some(0));
    assert!(stdout(&lenient).contains("Ghost"));

    let strict = glossary(&db, &["load", input.to_str().unwrap(), "--strict"]);
    assert_eq!(strict.status.code(), Some(2));
}

#[test]
fn no_auto_create_leaves_references_dangling() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("g.gldb");
    let input = dir.path().join("in.yaml");
    fs::write(&input, "terms:\n- name: T\n  categories: [Risk]\n").unwrap();

    let output = glossary(
        &db,
        &["--no-auto-create", "load", input.to_str().unwrap(), "--json-report"],
    );
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["kinds"]["term"]["missing_reference"], 1);
    assert!(report["kinds"].get("category").is_none());
}

#[test]
fn clear_empties_the_store() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("g.gldb");
    let input = dir.path().join("in.yaml");
    fs::write(&input, DATASET).unwrap();

    assert!(glossary(&db, &["load", input.to_str().unwrap()]).status.success());
    assert!(glossary(&db, &["clear"]).status.success());
    assert!(stdout(&glossary(&db, &["stats"])).contains("0 nodes, 0 edges"));
}

#[test]
fn db_path_comes_from_environment() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("env.gldb");
    let input = dir.path().join("in.yaml");
    fs::write(&input, "person:\n- name: Jane\n").unwrap();

    let output = Command::new(glossary_bin())
        .args(["load", input.to_str().unwrap()])
        .env("GLOSSARY_DB", &db)
        .env("NO_COLOR", "1")
        .env("CLICOLOR", "0")
        .env("RUST_LOG", "off")
        .output()
        .expect("run glossary");
    assert!(output.status.success());
    assert!(db.exists());
}
