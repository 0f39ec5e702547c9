mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::write_script;
use predicates::prelude::*;
use std::process::Command;

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let script = write_script(&["create, , , 100, alice, ACC1"]);

    let mut cmd = Command::new(cargo_bin!("wallet-ledger"));
    cmd.arg(script.path()).arg("--db-path").arg("some_db");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,alice,ACC1,100"))
        .stderr(predicate::str::contains("WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."));
}

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_db_path_from_environment_also_warns() {
    let script = write_script(&["create, , , 100, alice, ACC1"]);

    let mut cmd = Command::new(cargo_bin!("wallet-ledger"));
    cmd.arg(script.path()).env("LEDGER_DB_PATH", "some_db");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Falling back to In-Memory storage"));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let script = write_script(&["create, , , 100, alice, ACC1"]);

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("wallet-ledger"));
    cmd.arg(script.path()).arg("--db-path").arg(&db_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING").not());
}
