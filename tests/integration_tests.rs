mod common;

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use std::fs;

fn dir_squeeze() -> Command {
    Command::cargo_bin("dir-squeeze").unwrap()
}

#[test]
fn test_cli_help() {
    dir_squeeze()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--minsize"))
        .stdout(predicate::str::contains("--tinypng"));
}

#[test]
fn test_cli_version() {
    dir_squeeze()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_args() {
    dir_squeeze().assert().failure();
    dir_squeeze().arg("only-source").assert().failure();
}

#[test]
fn test_same_source_and_destination_exits_1() {
    let temp = TempDir::new().unwrap();
    common::create_scenario_tree(temp.path());
    let root = temp.path().to_str().unwrap();

    dir_squeeze()
        .args([root, root])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("same as output"));

    // the trailing separator is ignored too
    dir_squeeze()
        .args([root, &format!("{}/", root)])
        .assert()
        .code(1);

    temp.child("a/photo.jpg").assert(predicate::path::missing());
}

#[test]
fn test_missing_source_exits_1() {
    let temp = TempDir::new().unwrap();

    dir_squeeze()
        .args([
            temp.child("nope").path().to_str().unwrap(),
            temp.child("out").path().to_str().unwrap(),
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No such directory or not readable"));

    temp.child("out").assert(predicate::path::missing());
}

#[test]
fn test_quality_conflicts_with_tinypng() {
    let temp = TempDir::new().unwrap();

    dir_squeeze()
        .args([
            temp.path().to_str().unwrap(),
            temp.child("out").path().to_str().unwrap(),
            "-q",
            "80",
            "-t",
            "key",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_kraken_key_without_secret_exits_1() {
    let temp = TempDir::new().unwrap();
    temp.child("src").create_dir_all().unwrap();

    dir_squeeze()
        .args([
            temp.child("src").path().to_str().unwrap(),
            temp.child("out").path().to_str().unwrap(),
            "-k",
            "only-a-key",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("KEY:SECRET"));
}

#[test]
fn test_mirrors_tree_above_minimum_size() {
    let temp = TempDir::new().unwrap();
    let src = temp.child("src");
    common::create_scenario_tree(src.path());
    let dst = temp.child("dst");

    dir_squeeze()
        .args([src.path().to_str().unwrap(), dst.path().to_str().unwrap()])
        .args(["-m", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("photo.JPG: saved"))
        .stdout(predicate::str::contains("img.png: below minimum size"))
        .stdout(predicate::str::contains("files processed in"));

    dst.child("a/photo.jpg").assert(predicate::path::is_file());
    dst.child("b/c/img.png").assert(predicate::path::missing());
    dst.child("readme.txt").assert(predicate::path::missing());

    let original = fs::metadata(src.child("a/photo.JPG").path()).unwrap().len();
    let optimized = fs::metadata(dst.child("a/photo.jpg").path()).unwrap().len();
    assert!(optimized < original);
    assert!(image::open(dst.child("a/photo.jpg").path()).is_ok());
}

#[test]
fn test_nr_only_processes_top_level() {
    let temp = TempDir::new().unwrap();
    let src = temp.child("src");
    common::create_scenario_tree(src.path());
    common::write_large_jpeg(src.child("Top.jpeg").path(), 120);
    let dst = temp.child("dst");

    dir_squeeze()
        .args([src.path().to_str().unwrap(), dst.path().to_str().unwrap()])
        .arg("-nr")
        .assert()
        .success();

    dst.child("top.jpeg").assert(predicate::path::is_file());
    dst.child("a").assert(predicate::path::missing());
    dst.child("b").assert(predicate::path::missing());
}

#[test]
fn test_second_run_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let src = temp.child("src");
    common::create_scenario_tree(src.path());
    let dst = temp.child("dst");
    let args = [src.path().to_str().unwrap(), dst.path().to_str().unwrap()];

    dir_squeeze().args(args).assert().success();
    let first = fs::read(dst.child("a/photo.jpg").path()).unwrap();

    dir_squeeze()
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::contains("photo.JPG: output exists"))
        .stdout(predicate::str::contains("img.png: below minimum size"))
        .stdout(predicate::str::contains("files processed in").not());

    assert_eq!(fs::read(dst.child("a/photo.jpg").path()).unwrap(), first);
}

#[test]
fn test_quiet_suppresses_progress_lines() {
    let temp = TempDir::new().unwrap();
    let src = temp.child("src");
    common::create_scenario_tree(src.path());
    let dst = temp.child("dst");

    dir_squeeze()
        .args([src.path().to_str().unwrap(), dst.path().to_str().unwrap()])
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    dst.child("a/photo.jpg").assert(predicate::path::is_file());
}

#[test]
fn test_empty_source_completes() {
    let temp = TempDir::new().unwrap();
    temp.child("src").create_dir_all().unwrap();

    dir_squeeze()
        .args([
            temp.child("src").path().to_str().unwrap(),
            temp.child("dst").path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("files processed in").not());

    temp.child("dst").assert(predicate::path::is_dir());
}

#[test]
fn test_parallel_jobs_produce_same_tree() {
    let temp = TempDir::new().unwrap();
    let src = temp.child("src");
    common::create_scenario_tree(src.path());
    for i in 0..3 {
        common::write_large_jpeg(src.child(format!("many/IMG_{}.JPG", i)).path(), 110);
    }
    let dst = temp.child("dst");

    dir_squeeze()
        .args([src.path().to_str().unwrap(), dst.path().to_str().unwrap()])
        .args(["-j", "3"])
        .assert()
        .success();

    for i in 0..3 {
        dst.child(format!("many/img_{}.jpg", i))
            .assert(predicate::path::is_file());
    }
    dst.child("a/photo.jpg").assert(predicate::path::is_file());
}

#[test]
fn test_corrupt_image_does_not_fail_run() {
    let temp = TempDir::new().unwrap();
    let src = temp.child("src");
    common::write_large_jpeg(src.child("b_good.jpg").path(), 110);
    src.child("a_corrupt.jpg")
        .write_binary(&vec![0u8; 200 * 1024])
        .unwrap();
    let dst = temp.child("dst");

    dir_squeeze()
        .args([src.path().to_str().unwrap(), dst.path().to_str().unwrap()])
        .assert()
        .code(0)
        .stderr(predicate::str::contains("Failed to process"))
        .stderr(predicate::str::contains("a_corrupt.jpg"))
        .stdout(predicate::str::contains("1 files processed in"));

    dst.child("b_good.jpg").assert(predicate::path::is_file());
    dst.child("a_corrupt.jpg").assert(predicate::path::missing());
}
