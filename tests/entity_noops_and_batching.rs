use std::{fs, path::Path, sync::Arc};

use imgtag::core::{ImageEntity, MemoryRenameLog, Tag};
use tempfile::TempDir;

fn tag(name: &str) -> Tag {
    Tag::new(name).unwrap()
}

fn entity(dir: &Path, name: &str, log: &Arc<MemoryRenameLog>) -> ImageEntity {
    fs::write(dir.join(name), b"").unwrap();
    ImageEntity::new(dir.join(name), log.clone()).unwrap()
}

#[test]
fn adding_the_same_tag_twice_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let log = Arc::new(MemoryRenameLog::new());
    let mut img = entity(tmp.path(), "photo.jpg", &log);

    assert!(img.add_tag(&tag("t")).unwrap());
    let path_after_first = img.path().to_path_buf();
    let history_after_first = img.name_history().to_vec();

    assert!(!img.add_tag(&tag("t")).unwrap());
    assert_eq!(img.path(), path_after_first);
    assert_eq!(img.name_history(), history_after_first.as_slice());
    assert_eq!(img.tags(), [tag("t")]);
    assert_eq!(log.len(), 1);
}

#[test]
fn removing_an_absent_tag_does_nothing() {
    let tmp = TempDir::new().unwrap();
    let log = Arc::new(MemoryRenameLog::new());
    let mut img = entity(tmp.path(), "photo.jpg", &log);
    img.add_tag(&tag("a")).unwrap();

    assert!(!img.remove_tag(&tag("missing")).unwrap());
    assert!(!img.remove_tags(&[tag("x"), tag("y")]).unwrap());
    assert_eq!(img.name_history().len(), 1);
    assert_eq!(img.file_name(), "photo @a.jpg");
    assert_eq!(log.len(), 1);
}

#[test]
fn batch_add_is_one_rename_and_one_history_entry() {
    let tmp = TempDir::new().unwrap();
    let log = Arc::new(MemoryRenameLog::new());
    let mut img = entity(tmp.path(), "photo.jpg", &log);

    assert!(img.add_tags(&[tag("t1"), tag("t2")]).unwrap());
    assert_eq!(img.file_name(), "photo @t1 @t2.jpg");
    assert_eq!(img.name_history(), ["photo"]);
    assert_eq!(log.len(), 1);
}

#[test]
fn batch_add_skips_duplicates_within_and_across_calls() {
    let tmp = TempDir::new().unwrap();
    let log = Arc::new(MemoryRenameLog::new());
    let mut img = entity(tmp.path(), "photo.jpg", &log);
    img.add_tag(&tag("a")).unwrap();

    assert!(img.add_tags(&[tag("a"), tag("b"), tag("b")]).unwrap());
    assert_eq!(img.file_name(), "photo @a @b.jpg");

    assert!(!img.add_tags(&[tag("a"), tag("b")]).unwrap());
    assert!(!img.add_tags(&[]).unwrap());
    assert_eq!(img.name_history().len(), 2);
}

#[test]
fn batch_remove_is_one_rename_and_keeps_remaining_order() {
    let tmp = TempDir::new().unwrap();
    let log = Arc::new(MemoryRenameLog::new());
    let mut img = entity(tmp.path(), "photo.jpg", &log);
    img.add_tags(&[tag("a"), tag("b"), tag("c"), tag("d")]).unwrap();

    assert!(img.remove_tags(&[tag("c"), tag("a"), tag("zzz")]).unwrap());
    assert_eq!(img.file_name(), "photo @b @d.jpg");
    assert_eq!(img.name_history(), ["photo", "photo @a @b @c @d"]);
    assert_eq!(log.len(), 2);
}

#[test]
fn reverting_to_an_unknown_name_is_a_silent_noop() {
    let tmp = TempDir::new().unwrap();
    let log = Arc::new(MemoryRenameLog::new());
    let mut img = entity(tmp.path(), "photo.jpg", &log);
    img.add_tag(&tag("a")).unwrap();

    assert!(!img.revert_to_historical_name("never was").unwrap());
    assert_eq!(img.file_name(), "photo @a.jpg");
    assert_eq!(img.name_history().len(), 1);
}

#[test]
fn reverting_to_the_current_name_is_a_noop() {
    let tmp = TempDir::new().unwrap();
    let log = Arc::new(MemoryRenameLog::new());
    let mut img = entity(tmp.path(), "photo.jpg", &log);
    img.add_tag(&tag("a")).unwrap();
    img.remove_tag(&tag("a")).unwrap();
    assert_eq!(img.name_history(), ["photo", "photo @a"]);

    // "photo" is both a historical and the current name
    assert!(!img.revert_to_historical_name("photo").unwrap());
    assert_eq!(img.name_history().len(), 2);
    assert_eq!(log.len(), 2);
}

#[test]
fn revert_to_untagged_name_clears_tags() {
    let tmp = TempDir::new().unwrap();
    let log = Arc::new(MemoryRenameLog::new());
    let mut img = entity(tmp.path(), "photo.jpg", &log);
    img.add_tags(&[tag("a"), tag("b")]).unwrap();

    assert!(img.revert_to_historical_name("photo").unwrap());
    assert_eq!(img.file_name(), "photo.jpg");
    assert!(img.tags().is_empty());
    assert_eq!(img.name_history(), ["photo", "photo @a @b"]);

    // tagging again starts from the reverted state
    img.add_tag(&tag("c")).unwrap();
    assert_eq!(img.file_name(), "photo @c.jpg");
}

#[test]
fn stale_record_whose_name_already_matches_reports_no_rename() {
    use imgtag::core::{ImageId, ImageRecord};

    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("p @a.jpg"), b"").unwrap();
    let log = Arc::new(MemoryRenameLog::new());
    let record = ImageRecord {
        id: ImageId::new(),
        path: "p @a.jpg".into(),
        tags: Vec::new(),
        name_history: Vec::new(),
    };
    let mut img = ImageEntity::from_record(tmp.path(), record, log.clone()).unwrap();

    assert!(!img.add_tag(&tag("a")).unwrap());
    assert_eq!(img.tags(), [tag("a")]);
    assert!(img.name_history().is_empty());
    assert!(log.is_empty());
}
