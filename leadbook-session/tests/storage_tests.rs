use leadbook_session::{FileStorage, MemoryStorage, SessionStorage, StorageError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

// ── MemoryStorage ───────────────────────────────────────────────

#[test]
fn memory_storage_set_get_remove() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get("token").unwrap(), None);

    storage.set("token", "t1").unwrap();
    assert_eq!(storage.get("token").unwrap().as_deref(), Some("t1"));

    storage.remove("token").unwrap();
    assert_eq!(storage.get("token").unwrap(), None);
    storage.remove("token").unwrap();
}

// ── FileStorage ─────────────────────────────────────────────────

#[test]
fn file_storage_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("session.json");

    let storage = FileStorage::new(&path);
    storage.set("token", "t1").unwrap();
    storage.set("user", "{\"_id\":\"u1\"}").unwrap();
    drop(storage);

    let reopened = FileStorage::new(&path);
    assert_eq!(reopened.get("token").unwrap().as_deref(), Some("t1"));
    assert_eq!(reopened.get("user").unwrap().as_deref(), Some("{\"_id\":\"u1\"}"));
    assert_eq!(reopened.path(), path.as_path());
}

#[test]
fn file_storage_missing_file_reads_empty() {
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::new(dir.path().join("absent.json"));
    assert_eq!(storage.get("token").unwrap(), None);
    storage.remove("token").unwrap();
    assert!(!storage.path().exists());
}

#[test]
fn file_storage_remove_keeps_other_keys() {
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::new(dir.path().join("session.json"));
    storage.set("token", "t1").unwrap();
    storage.set("theme", "dark").unwrap();

    storage.remove("token").unwrap();
    assert_eq!(storage.get("token").unwrap(), None);
    assert_eq!(storage.get("theme").unwrap().as_deref(), Some("dark"));
}

#[test]
fn corrupt_file_reports_then_recovers_on_write() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{not json").unwrap();

    let storage = FileStorage::new(&path);
    assert!(matches!(
        storage.get("token"),
        Err(StorageError::Corrupt { .. })
    ));

    storage.remove("user").unwrap();
    assert_eq!(storage.get("token").unwrap(), None);

    storage.set("token", "t2").unwrap();
    assert_eq!(storage.get("token").unwrap().as_deref(), Some("t2"));
}

#[test]
fn default_path_is_under_data_dir() {
    if let Ok(path) = FileStorage::default_path() {
        assert!(path.ends_with("leadbook/session.json"));
    }
}
