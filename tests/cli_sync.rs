use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn read(path: &Path) -> String {
    fs::read_to_string(path)
        .expect("read manifest")
        .replace("\r\n", "\n")
}

fn scaffold(root: &Path) {
    Command::cargo_bin("cmkit")
        .expect("binary")
        .arg("new")
        .arg(root)
        .args(["--name", "Demo"])
        .assert()
        .success();
}

#[test]
fn sync_picks_up_new_sources() {
    let tmp = tempdir().expect("tempdir");
    scaffold(tmp.path());
    fs::write(tmp.path().join("lib/math.cpp"), "int add(int a, int b) { return a + b; }\n")
        .expect("write math.cpp");

    Command::cargo_bin("cmkit")
        .expect("binary")
        .args(["sync", "--root"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated lib"));

    assert!(read(&tmp.path().join("lib/CMakeLists.txt")).contains(r#"file(GLOB SOURCES_LIB "math.cpp")"#));
    assert!(read(&tmp.path().join("CMakeLists.txt")).contains(
        "target_sources(${PROJECT_NAME} PRIVATE ${SOURCES_BIN} ${SOURCES_LIB} ${SOURCES_TESTS})"
    ));
}

#[test]
fn sync_twice_reports_up_to_date() {
    let tmp = tempdir().expect("tempdir");
    scaffold(tmp.path());

    let sync = || {
        Command::cargo_bin("cmkit")
            .expect("binary")
            .current_dir(tmp.path())
            .arg("sync")
            .assert()
            .success()
    };
    sync();
    let first = read(&tmp.path().join("CMakeLists.txt"));
    sync().stdout(predicate::str::contains("already up to date"));
    assert_eq!(read(&tmp.path().join("CMakeLists.txt")), first);
}

#[test]
fn sync_uses_project_root_from_env() {
    let tmp = tempdir().expect("tempdir");
    let elsewhere = tempdir().expect("elsewhere");
    scaffold(tmp.path());
    fs::write(tmp.path().join("tests/smoke.cpp"), "").expect("write smoke.cpp");

    Command::cargo_bin("cmkit")
        .expect("binary")
        .current_dir(elsewhere.path())
        .env("CMKIT_PROJECT_ROOT", tmp.path())
        .arg("sync")
        .assert()
        .success();

    assert!(read(&tmp.path().join("tests/CMakeLists.txt")).contains("\"smoke.cpp\""));
}

#[test]
fn sync_warns_about_missing_manifest_and_continues() {
    let tmp = tempdir().expect("tempdir");
    scaffold(tmp.path());
    fs::remove_file(tmp.path().join("lib/CMakeLists.txt")).expect("remove lib manifest");

    Command::cargo_bin("cmkit")
        .expect("binary")
        .current_dir(tmp.path())
        .arg("sync")
        .assert()
        .success()
        .stderr(predicate::str::contains("warning (sync): lib: no manifest"));

    let root = read(&tmp.path().join("CMakeLists.txt"));
    assert!(root.contains("PRIVATE ${SOURCES_BIN} ${SOURCES_TESTS})"), "{root}");
    assert!(!root.contains("SOURCES_LIB"), "{root}");
}

#[test]
fn sync_outside_a_project_is_an_error() {
    let tmp = tempdir().expect("tempdir");

    let assert = Command::cargo_bin("cmkit")
        .expect("binary")
        .current_dir(tmp.path())
        .env_remove("CMKIT_PROJECT_ROOT")
        .arg("sync")
        .assert()
        .code(1);

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).replace("\r\n", "\n");
    assert!(stderr.contains("error (sync): no project folder available"), "{stderr}");
    assert!(fs::read_dir(tmp.path()).expect("read dir").next().is_none());
}
