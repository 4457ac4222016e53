use dupemover::actions::{MoveStatus, RelocationEngine};
use dupemover::error::DedupeError;
use dupemover::output::{AuditRecord, AuditStatus, NullAuditSink};
use dupemover::pipeline::{execute, RunOptions};
use dupemover::scanner::{is_contained, validate_root, RootRole};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_validate_root_rejects_file() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    fs::write(&file, "x").unwrap();

    let err = validate_root(&file, RootRole::Destination).unwrap_err();
    assert!(matches!(
        err,
        DedupeError::InvalidPath {
            role: "destination",
            ..
        }
    ));
    assert!(err.to_string().contains("is not a directory"));
}

#[test]
fn test_validate_root_rejects_empty_and_missing() {
    assert!(validate_root(std::path::Path::new(""), RootRole::Source).is_err());
    let err = validate_root(std::path::Path::new("/no/such/dir/xyz"), RootRole::Source).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_is_contained_resolves_dot_dot() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    let sibling = dir.path().join("root-sibling");
    fs::create_dir(&root).unwrap();
    fs::create_dir(&sibling).unwrap();

    assert!(is_contained(&root.join("a.txt"), &root));
    assert!(is_contained(&root, &root));
    assert!(!is_contained(&root.join("..").join("root-sibling").join("a.txt"), &root));
    assert!(!is_contained(&sibling.join("a.txt"), &root));
}

#[test]
fn test_destination_nested_in_source_is_not_rescanned() {
    let src = tempdir().unwrap();
    let dest = src.path().join("dupes");
    fs::create_dir(&dest).unwrap();
    fs::write(src.path().join("a.txt"), "hello").unwrap();
    fs::write(src.path().join("b.txt"), "hello").unwrap();

    let first = execute(&RunOptions::new(src.path(), &dest), &mut NullAuditSink).unwrap();
    let second = execute(&RunOptions::new(src.path(), &dest), &mut NullAuditSink).unwrap();

    assert_eq!(first.moved, 1);
    assert!(dest.join("b.txt").exists());
    assert_eq!(second.files_scanned, 1);
    assert_eq!(second.duplicates_found, 0);
}

#[test]
fn test_relocate_refuses_path_outside_source() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let outside = tempdir().unwrap();
    let victim = outside.path().join("victim.txt");
    fs::write(&victim, "do not touch").unwrap();

    let source = validate_root(src.path(), RootRole::Source).unwrap();
    let dest = validate_root(dst.path(), RootRole::Destination).unwrap();
    let crafted = source
        .path()
        .join("..")
        .join(outside.path().file_name().unwrap())
        .join("victim.txt");

    let mut audit: Vec<AuditRecord> = Vec::new();
    let report = RelocationEngine::default().relocate(&[crafted], &source, &dest, &mut audit);

    assert_eq!(report.results[0].status, MoveStatus::Skipped);
    assert!(report.results[0]
        .error
        .as_deref()
        .unwrap()
        .contains("path escapes"));
    assert_eq!(audit[0].status, AuditStatus::Error);
    assert_eq!(fs::read_to_string(&victim).unwrap(), "do not touch");
}

#[cfg(unix)]
#[test]
fn test_symlinked_file_is_never_moved() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::write(src.path().join("a.txt"), "hello").unwrap();
    fs::write(src.path().join("b.txt"), "hello").unwrap();
    std::os::unix::fs::symlink(src.path().join("a.txt"), src.path().join("c_link.txt")).unwrap();

    let mut audit: Vec<AuditRecord> = Vec::new();
    let summary = execute(&RunOptions::new(src.path(), dst.path()), &mut audit).unwrap();

    assert_eq!(summary.scan_failures, 1);
    assert_eq!(summary.moved, 1);
    let link = src.path().join("c_link.txt");
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert!(!dst.path().join("c_link.txt").exists());
    assert!(audit
        .iter()
        .any(|r| r.original_path.ends_with("c_link.txt") && r.status == AuditStatus::Error));
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_is_not_followed() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let outside = tempdir().unwrap();
    fs::write(outside.path().join("x.txt"), "same").unwrap();
    fs::write(outside.path().join("y.txt"), "same").unwrap();
    std::os::unix::fs::symlink(outside.path(), src.path().join("linked")).unwrap();

    let summary = execute(&RunOptions::new(src.path(), dst.path()), &mut NullAuditSink).unwrap();

    assert_eq!(summary.files_scanned, 0);
    assert_eq!(summary.moved, 0);
    assert!(outside.path().join("x.txt").exists());
    assert!(outside.path().join("y.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_symlink_loop_terminates() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let sub = src.path().join("sub");
    fs::create_dir(&sub).unwrap();
    std::os::unix::fs::symlink(src.path(), sub.join("loop")).unwrap();
    fs::write(sub.join("f.txt"), "x").unwrap();

    let summary = execute(&RunOptions::new(src.path(), dst.path()), &mut NullAuditSink).unwrap();

    assert_eq!(summary.files_scanned, 1);
}

#[cfg(unix)]
#[test]
fn test_symlinked_destination_subdir_is_never_written_through() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let outside = tempdir().unwrap();
    fs::write(src.path().join("a.txt"), "hello").unwrap();
    fs::create_dir(src.path().join("sub")).unwrap();
    fs::write(src.path().join("sub").join("b.txt"), "hello").unwrap();
    std::os::unix::fs::symlink(outside.path(), dest.path().join("sub")).unwrap();

    let mut audit: Vec<AuditRecord> = Vec::new();
    let summary = execute(&RunOptions::new(src.path(), dest.path()), &mut audit).unwrap();

    assert_eq!(summary.duplicates_found, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.moved, 0);
    assert_eq!(fs::read_dir(outside.path()).unwrap().count(), 0);
    assert!(src.path().join("sub").join("b.txt").exists());

    let moved: Vec<_> = audit
        .iter()
        .filter(|r| r.original_path.ends_with("b.txt") && !r.destination_path.is_empty())
        .collect();
    assert!(moved.is_empty(), "escaped target must not be reported as a destination");
    let refused = audit
        .iter()
        .find(|r| r.status == AuditStatus::Error && r.error_message.contains("path escapes"))
        .unwrap();
    assert!(refused.original_path.ends_with("b.txt"));
}
