use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = Command::new(cargo_bin!("paygate"));
    cmd.arg("--stash")
        .arg(dir.path().join("stash.json"))
        .arg("--db-path")
        .arg(dir.path().join("some_db"))
        .args(["pending", "--subject", "agent"]);

    cmd.assert()
        .success()
        .stdout("null\n")
        .stderr(predicate::str::contains("WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to file storage."));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("paygate"));
    cmd.arg("--db-path")
        .arg(&db_path)
        .args(["restart", "--subject", "agent"]);

    cmd.assert()
        .success()
        .stdout("cleared\n")
        .stderr(predicate::str::contains("WARNING").not());
}
