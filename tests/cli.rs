use assert_cmd::prelude::*;
use predicates::prelude::*;
use rand::{thread_rng, Rng};
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn write_random_file(path: &std::path::Path, len: usize) {
    let mut buf = vec![0u8; len];
    thread_rng().fill(&mut buf[..]);
    fs::write(path, buf).unwrap();
}

#[test]
fn test_cli_compress_decompress_cycle() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source_path = dir.path().join("input.bin");
    let archive_path = dir.path().join("input.bzp");
    let restored_path = dir.path().join("restored.bin");
    write_random_file(&source_path, 150_000);

    let mut cmd = Command::cargo_bin("blockzip")?;
    cmd.arg("compress").arg(&source_path).arg(&archive_path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Archive created"));
    assert!(archive_path.exists());

    let mut cmd = Command::cargo_bin("blockzip")?;
    cmd.arg("decompress").arg(&archive_path).arg(&restored_path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("File decompressed"));

    assert_eq!(fs::read(&source_path)?, fs::read(&restored_path)?);
    Ok(())
}

#[test]
fn test_cli_missing_source_fails_cleanly() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    let mut cmd = Command::cargo_bin("blockzip")?;
    cmd.arg("compress")
        .arg(dir.path().join("nonexistent.bin"))
        .arg(dir.path().join("out.bzp"));
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("source file doesn't exist"));

    assert!(!dir.path().join("out.bzp").exists());
    Ok(())
}

#[test]
fn test_cli_existing_destination_fails_cleanly() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source_path = dir.path().join("input.bin");
    let dest_path = dir.path().join("exists.bzp");
    write_random_file(&source_path, 1_000);
    fs::write(&dest_path, b"already here")?;

    let mut cmd = Command::cargo_bin("blockzip")?;
    cmd.arg("compress").arg(&source_path).arg(&dest_path);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("destination file already exists"));

    // The pre-existing file is the user's; it must not be touched.
    assert_eq!(fs::read(&dest_path)?, b"already here");
    Ok(())
}

#[test]
fn test_cli_decompress_non_archive_removes_destination() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source_path = dir.path().join("not_an_archive.bin");
    let dest_path = dir.path().join("out.bin");
    fs::write(&source_path, b"plain text, no header")?;

    let mut cmd = Command::cargo_bin("blockzip")?;
    cmd.arg("decompress").arg(&source_path).arg(&dest_path);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not a valid archive"));

    assert!(!dest_path.exists(), "failed run must clean up its destination");
    Ok(())
}

#[test]
fn test_cli_truncated_archive_warns_about_corruption() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source_path = dir.path().join("input.bin");
    let archive_path = dir.path().join("input.bzp");
    let restored_path = dir.path().join("restored.bin");
    write_random_file(&source_path, 50_000);

    let mut cmd = Command::cargo_bin("blockzip")?;
    cmd.arg("compress").arg(&source_path).arg(&archive_path);
    cmd.assert().success();

    // Chop off the tail of the last block record.
    let archive = fs::read(&archive_path)?;
    fs::write(&archive_path, &archive[..archive.len() - 5])?;

    let mut cmd = Command::cargo_bin("blockzip")?;
    cmd.arg("decompress").arg(&archive_path).arg(&restored_path);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("may be corrupted"));

    assert!(!restored_path.exists());
    Ok(())
}

#[test]
fn test_cli_debug_flag_prints_error_detail() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source_path = dir.path().join("input.bin");
    let archive_path = dir.path().join("input.bzp");
    write_random_file(&source_path, 20_000);

    let mut cmd = Command::cargo_bin("blockzip")?;
    cmd.arg("compress").arg(&source_path).arg(&archive_path);
    cmd.assert().success();

    let archive = fs::read(&archive_path)?;
    fs::write(&archive_path, &archive[..archive.len() - 5])?;

    let mut cmd = Command::cargo_bin("blockzip")?;
    cmd.arg("decompress")
        .arg("--debug")
        .arg(&archive_path)
        .arg(dir.path().join("restored.bin"));
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Unexpected error"));
    Ok(())
}
