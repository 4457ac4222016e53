use dupemover::error::DedupeError;
use dupemover::output::NullAuditSink;
use dupemover::pipeline::{execute, RunOptions};
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path).unwrap().next().is_none()
}

#[test]
fn test_scenario_single_duplicate_moved() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::write(src.path().join("a.txt"), "hello").unwrap();
    fs::write(src.path().join("b.txt"), "hello").unwrap();
    fs::write(src.path().join("c.txt"), "world").unwrap();

    let summary = execute(&RunOptions::new(src.path(), dst.path()), &mut NullAuditSink).unwrap();

    assert_eq!(summary.duplicates_found, 1);
    assert_eq!(summary.moved, 1);
    assert_eq!(summary.failed, 0);
    assert!(src.path().join("a.txt").exists());
    assert!(!src.path().join("b.txt").exists());
    assert!(src.path().join("c.txt").exists());
    assert_eq!(
        fs::read_to_string(dst.path().join("b.txt")).unwrap(),
        "hello"
    );
}

#[test]
fn test_scenario_empty_source() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();

    let summary = execute(&RunOptions::new(src.path(), dst.path()), &mut NullAuditSink).unwrap();

    assert_eq!(summary.files_scanned, 0);
    assert_eq!(summary.duplicates_found, 0);
    assert!(is_empty_dir(dst.path()));
}

#[test]
fn test_scenario_collision_is_recorded_and_batch_continues() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::write(src.path().join("a.txt"), "hello").unwrap();
    fs::write(src.path().join("b.txt"), "hello").unwrap();
    fs::write(src.path().join("c.txt"), "hello").unwrap();
    fs::write(dst.path().join("b.txt"), "already here").unwrap();

    let summary = execute(&RunOptions::new(src.path(), dst.path()), &mut NullAuditSink).unwrap();

    assert_eq!(summary.duplicates_found, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.moved, 1);
    assert!(src.path().join("b.txt").exists());
    assert!(!src.path().join("c.txt").exists());
    assert_eq!(
        fs::read_to_string(dst.path().join("b.txt")).unwrap(),
        "already here"
    );
    assert_eq!(fs::read_to_string(dst.path().join("c.txt")).unwrap(), "hello");
}

#[cfg(unix)]
#[test]
fn test_scenario_read_only_destination_fails_before_scan() {
    use std::os::unix::fs::PermissionsExt;

    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::write(src.path().join("a.txt"), "hello").unwrap();
    fs::write(src.path().join("b.txt"), "hello").unwrap();
    fs::set_permissions(dst.path(), fs::Permissions::from_mode(0o555)).unwrap();

    if fs::write(dst.path().join("probe"), "x").is_ok() {
        // Running with elevated privileges; permissions are not enforced.
        fs::set_permissions(dst.path(), fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = execute(&RunOptions::new(src.path(), dst.path()), &mut NullAuditSink);
    fs::set_permissions(dst.path(), fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(result, Err(DedupeError::PermissionDenied { .. })));
    assert!(src.path().join("a.txt").exists());
    assert!(src.path().join("b.txt").exists());
    assert!(is_empty_dir(dst.path()));
}

#[test]
fn test_second_run_finds_nothing() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::create_dir(src.path().join("sub")).unwrap();
    fs::write(src.path().join("a.txt"), "one").unwrap();
    fs::write(src.path().join("sub").join("a.txt"), "one").unwrap();
    fs::write(src.path().join("sub").join("b.txt"), "two").unwrap();
    fs::write(src.path().join("b.txt"), "two").unwrap();

    let first = execute(&RunOptions::new(src.path(), dst.path()), &mut NullAuditSink).unwrap();
    let second = execute(&RunOptions::new(src.path(), dst.path()), &mut NullAuditSink).unwrap();

    assert_eq!(first.moved, 2);
    assert_eq!(second.duplicates_found, 0);
    assert_eq!(second.moved, 0);
    assert!(dst.path().join("sub").join("a.txt").exists());
    assert!(dst.path().join("sub").join("b.txt").exists());
}

#[test]
fn test_relative_structure_is_mirrored() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let deep = src.path().join("2024").join("trip");
    fs::create_dir_all(&deep).unwrap();
    fs::write(src.path().join("keep.jpg"), "pixels").unwrap();
    fs::write(deep.join("copy.jpg"), "pixels").unwrap();

    execute(&RunOptions::new(src.path(), dst.path()), &mut NullAuditSink).unwrap();

    assert!(dst.path().join("2024").join("trip").join("copy.jpg").exists());
    assert!(src.path().join("keep.jpg").exists());
    assert!(deep.exists());
}

#[test]
fn test_dry_run_changes_nothing() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::write(src.path().join("a.txt"), "hello").unwrap();
    fs::write(src.path().join("b.txt"), "hello").unwrap();

    let mut options = RunOptions::new(src.path(), dst.path());
    options.dry_run = true;
    let summary = execute(&options, &mut NullAuditSink).unwrap();

    assert_eq!(summary.planned, 1);
    assert_eq!(summary.moved, 0);
    assert_eq!(summary.bytes_relocated, 5);
    assert!(src.path().join("b.txt").exists());
    assert!(is_empty_dir(dst.path()));
}

#[test]
fn test_interrupt_before_start_is_reported() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::write(src.path().join("a.txt"), "hello").unwrap();
    fs::write(src.path().join("b.txt"), "hello").unwrap();

    let mut options = RunOptions::new(src.path(), dst.path());
    options.shutdown_flag = Some(Arc::new(AtomicBool::new(true)));
    let result = execute(&options, &mut NullAuditSink);

    assert!(matches!(result, Err(DedupeError::Interrupted)));
    assert!(src.path().join("b.txt").exists());
    assert!(is_empty_dir(dst.path()));
}

#[test]
fn test_many_groups_every_duplicate_moved() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    for group in 0..5 {
        for copy in 0..3 {
            fs::write(
                src.path().join(format!("g{group}_c{copy}.bin")),
                format!("group {group}"),
            )
            .unwrap();
        }
    }

    let summary = execute(&RunOptions::new(src.path(), dst.path()), &mut NullAuditSink).unwrap();

    assert_eq!(summary.unique_fingerprints, 5);
    assert_eq!(summary.duplicates_found, 10);
    assert_eq!(summary.moved, 10);
    for group in 0..5 {
        assert!(src.path().join(format!("g{group}_c0.bin")).exists());
        assert!(dst.path().join(format!("g{group}_c1.bin")).exists());
        assert!(dst.path().join(format!("g{group}_c2.bin")).exists());
    }
}
