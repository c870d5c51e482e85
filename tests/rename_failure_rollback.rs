use std::{fs, sync::Arc};

use imgtag::core::{ImageEntity, MemoryRenameLog, Tag, TagError};
use tempfile::TempDir;

fn tag(name: &str) -> Tag {
    Tag::new(name).unwrap()
}

#[test]
fn add_tag_onto_existing_target_fails_and_rolls_back() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("photo.jpg"), b"mine").unwrap();
    // Something else already owns the name we would rename to.
    fs::write(dir.join("photo @beach.jpg"), b"theirs").unwrap();

    let log = Arc::new(MemoryRenameLog::new());
    let mut img = ImageEntity::new(dir.join("photo.jpg"), log.clone()).unwrap();

    let err = img.add_tag(&tag("beach")).unwrap_err();
    match err {
        TagError::RenameFailed { from, to, source } => {
            assert_eq!(from, dir.join("photo.jpg"));
            assert_eq!(to, dir.join("photo @beach.jpg"));
            assert_eq!(source.kind(), std::io::ErrorKind::AlreadyExists);
        }
        other => panic!("expected RenameFailed, got {other:?}"),
    }

    assert!(img.tags().is_empty());
    assert_eq!(img.path(), dir.join("photo.jpg"));
    assert!(img.name_history().is_empty());
    assert!(log.is_empty());

    // Neither file was clobbered.
    assert_eq!(fs::read(dir.join("photo.jpg")).unwrap(), b"mine");
    assert_eq!(fs::read(dir.join("photo @beach.jpg")).unwrap(), b"theirs");
}

#[test]
fn remove_tag_failure_keeps_the_tag() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("photo.jpg"), b"").unwrap();
    let mut img = ImageEntity::new(dir.join("photo.jpg"), Arc::new(MemoryRenameLog::new())).unwrap();
    img.add_tags(&[tag("a"), tag("b")]).unwrap();

    fs::write(dir.join("photo @b.jpg"), b"").unwrap();
    assert!(img.remove_tag(&tag("a")).is_err());

    assert_eq!(img.tags(), [tag("a"), tag("b")]);
    assert_eq!(img.file_name(), "photo @a @b.jpg");
    assert_eq!(img.name_history(), ["photo"]);
}

#[test]
fn vanished_file_fails_instead_of_pretending() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("photo.jpg"), b"").unwrap();
    let mut img = ImageEntity::new(dir.join("photo.jpg"), Arc::new(MemoryRenameLog::new())).unwrap();

    fs::remove_file(dir.join("photo.jpg")).unwrap();
    assert!(matches!(
        img.add_tag(&tag("x")),
        Err(TagError::RenameFailed { .. })
    ));
    assert!(img.tags().is_empty());
    assert_eq!(img.path(), dir.join("photo.jpg"));
}

#[test]
fn move_into_missing_directory_fails_and_keeps_path() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("photo.jpg"), b"").unwrap();
    let mut img = ImageEntity::new(dir.join("photo.jpg"), Arc::new(MemoryRenameLog::new())).unwrap();

    let err = img.move_to(&dir.join("does-not-exist")).unwrap_err();
    assert!(matches!(err, TagError::RenameFailed { .. }));
    assert_eq!(img.path(), dir.join("photo.jpg"));
    assert!(dir.join("photo.jpg").is_file());
}

#[cfg(unix)]
#[test]
fn read_only_directory_fails_and_rolls_back() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let locked = tmp.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("photo.jpg"), b"").unwrap();
    let mut img =
        ImageEntity::new(locked.join("photo.jpg"), Arc::new(MemoryRenameLog::new())).unwrap();

    let mut perms = fs::metadata(&locked).unwrap().permissions();
    perms.set_mode(0o555);
    fs::set_permissions(&locked, perms).unwrap();

    let result = img.add_tag(&tag("x"));

    // Restore so TempDir can clean up.
    let mut perms = fs::metadata(&locked).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&locked, perms).unwrap();

    // Root ignores directory permissions; only assert when the OS refused.
    if result.is_err() {
        assert!(img.tags().is_empty());
        assert_eq!(img.path(), locked.join("photo.jpg"));
        assert!(img.name_history().is_empty());
    } else {
        assert_eq!(img.file_name(), "photo @x.jpg");
    }
}
