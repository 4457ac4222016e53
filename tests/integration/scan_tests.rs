use dupemover::duplicates::{DuplicateScanner, ScanConfig};
use dupemover::output::{AuditRecord, AuditStatus, NullAuditSink};
use dupemover::scanner::{validate_root, HashAlgorithm, Root, RootRole};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn roots(source: &Path, dest: &Path) -> (Root, Root) {
    (
        validate_root(source, RootRole::Source).unwrap(),
        validate_root(dest, RootRole::Destination).unwrap(),
    )
}

#[test]
fn test_scan_empty_directory() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let (source, dest) = roots(src.path(), dst.path());

    let (index, stats) = DuplicateScanner::default()
        .scan(&source, &dest, &mut NullAuditSink)
        .unwrap();

    assert!(index.is_empty());
    assert_eq!(stats.files_seen, 0);
    assert_eq!(stats.failures(), 0);
}

#[test]
fn test_scan_unique_files() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::write(src.path().join("a.txt"), "content a").unwrap();
    fs::write(src.path().join("b.txt"), "content b").unwrap();
    fs::write(src.path().join("c.txt"), "content c").unwrap();
    let (source, dest) = roots(src.path(), dst.path());

    let (index, _) = DuplicateScanner::default()
        .scan(&source, &dest, &mut NullAuditSink)
        .unwrap();

    assert_eq!(index.len(), 3);
    assert_eq!(index.duplicate_count(), 0);
}

#[test]
fn test_scan_nested_duplicates_survivor_is_first_in_walk_order() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::create_dir_all(src.path().join("a_dir")).unwrap();
    fs::create_dir_all(src.path().join("z_dir")).unwrap();
    fs::write(src.path().join("z_dir").join("copy.txt"), "same").unwrap();
    fs::write(src.path().join("a_dir").join("copy.txt"), "same").unwrap();
    fs::write(src.path().join("m.txt"), "same").unwrap();
    let (source, dest) = roots(src.path(), dst.path());

    let (index, _) = DuplicateScanner::default()
        .scan(&source, &dest, &mut NullAuditSink)
        .unwrap();

    assert_eq!(index.len(), 1);
    let group = &index.groups()[0];
    assert_eq!(group.len(), 3);
    assert!(group.survivor().path.ends_with("a_dir/copy.txt"));
    assert!(group.duplicates()[0].path.ends_with("m.txt"));
    assert!(group.duplicates()[1].path.ends_with("z_dir/copy.txt"));
}

#[test]
fn test_zero_byte_files_group_together() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::write(src.path().join("empty1"), b"").unwrap();
    fs::write(src.path().join("empty2"), b"").unwrap();
    fs::write(src.path().join("full"), b"x").unwrap();
    let (source, dest) = roots(src.path(), dst.path());

    let (index, _) = DuplicateScanner::default()
        .scan(&source, &dest, &mut NullAuditSink)
        .unwrap();

    let empty = index
        .get("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        .unwrap();
    assert_eq!(empty.len(), 2);
    assert_eq!(empty.wasted_bytes(), 0);
}

#[test]
fn test_same_size_different_content_not_grouped() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::write(src.path().join("a"), "abcd").unwrap();
    fs::write(src.path().join("b"), "abce").unwrap();
    let (source, dest) = roots(src.path(), dst.path());

    let (index, _) = DuplicateScanner::default()
        .scan(&source, &dest, &mut NullAuditSink)
        .unwrap();

    assert_eq!(index.len(), 2);
    assert_eq!(index.duplicate_count(), 0);
}

#[test]
fn test_scan_is_deterministic() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    for i in 0..20 {
        let sub = src.path().join(format!("d{}", i % 4));
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join(format!("f{i}.txt")), format!("{}", i % 5)).unwrap();
    }
    let (source, dest) = roots(src.path(), dst.path());
    let scanner = DuplicateScanner::new(ScanConfig::default().with_algorithm(HashAlgorithm::Blake3));

    let (first, _) = scanner.scan(&source, &dest, &mut NullAuditSink).unwrap();
    let (second, _) = scanner.scan(&source, &dest, &mut NullAuditSink).unwrap();

    let paths = |index: &dupemover::duplicates::DuplicateIndex| -> Vec<_> {
        index
            .groups()
            .iter()
            .flat_map(|g| g.files.iter().map(|f| f.path.clone()))
            .collect()
    };
    assert_eq!(paths(&first), paths(&second));
    assert_eq!(first.len(), 5);
    assert_eq!(first.duplicate_count(), 15);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_recorded_and_scan_continues() {
    use std::os::unix::fs::PermissionsExt;

    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let locked = src.path().join("locked.txt");
    fs::write(&locked, "secret").unwrap();
    fs::write(src.path().join("open.txt"), "visible").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read(&locked).is_ok() {
        // Running with elevated privileges; permissions are not enforced.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let (source, dest) = roots(src.path(), dst.path());
    let mut audit: Vec<AuditRecord> = Vec::new();
    let (index, stats) = DuplicateScanner::default()
        .scan(&source, &dest, &mut audit)
        .unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(index.total_files(), 1);
    assert_eq!(stats.failures(), 1);
    let failed: Vec<_> = audit
        .iter()
        .filter(|r| r.status == AuditStatus::Error)
        .collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].original_path.ends_with("locked.txt"));
    assert_eq!(failed[0].file_size, 0);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_recorded_and_scan_continues() {
    use std::os::unix::fs::PermissionsExt;

    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let locked = src.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("hidden.txt"), "x").unwrap();
    fs::write(src.path().join("open.txt"), "y").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let (source, dest) = roots(src.path(), dst.path());
    let result = DuplicateScanner::default().scan(&source, &dest, &mut NullAuditSink);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let (index, stats) = result.unwrap();
    assert_eq!(index.total_files(), 1);
    assert!(stats.failures() >= 1);
}
