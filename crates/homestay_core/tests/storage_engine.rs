use homestay_core::{
    FileStorage, Record, RecordKind, RecordStore, SnapshotError, StorageError, KIND_KEY,
};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const FIXED_TIMESTAMP: &str = "2024-05-01T10:30:00.123456";

const SPECIALIZED_KINDS: [RecordKind; 6] = [
    RecordKind::User,
    RecordKind::Accommodation,
    RecordKind::City,
    RecordKind::GeographicRegion,
    RecordKind::Amenity,
    RecordKind::GuestReview,
];

fn snapshot_path(dir: &TempDir) -> PathBuf {
    dir.path().join("homestay.json")
}

fn fixed_record(kind: RecordKind, identity: &str) -> Record {
    let data = json!({
        "identity": identity,
        "created_at": FIXED_TIMESTAMP,
        "updated_at": FIXED_TIMESTAMP,
    });
    Record::from_snapshot(kind, data.as_object().unwrap().clone()).unwrap()
}

fn read_snapshot_file(path: &PathBuf) -> Map<String, Value> {
    let bytes = fs::read(path).unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    value.as_object().unwrap().clone()
}

#[test]
fn open_without_snapshot_starts_empty() {
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::open(snapshot_path(&dir)).unwrap();

    assert!(storage.all().is_empty());
}

#[test]
fn reload_without_snapshot_is_a_noop() {
    let dir = TempDir::new().unwrap();
    let mut storage = FileStorage::open(snapshot_path(&dir)).unwrap();

    storage.reload().unwrap();
    assert!(storage.all().is_empty());
}

#[test]
fn register_keys_by_type_name_and_identity() {
    let dir = TempDir::new().unwrap();
    let mut storage = FileStorage::open(snapshot_path(&dir)).unwrap();

    let record = Record::new(RecordKind::User);
    let identity = record.identity().to_string();
    let key = storage.register(record);

    assert_eq!(key, format!("User.{identity}"));
    assert!(storage.get(&key).is_some());
    assert_eq!(storage.all().len(), 1);
}

#[test]
fn register_duplicate_key_is_last_writer_wins() {
    let dir = TempDir::new().unwrap();
    let mut storage = FileStorage::open(snapshot_path(&dir)).unwrap();

    let mut first = fixed_record(RecordKind::Amenity, "123456");
    first.set_attribute("name", json!("pool")).unwrap();
    let mut second = fixed_record(RecordKind::Amenity, "123456");
    second.set_attribute("name", json!("sauna")).unwrap();

    let key_a = storage.register(first);
    let key_b = storage.register(second);

    assert_eq!(key_a, key_b);
    assert_eq!(storage.all().len(), 1);
    assert_eq!(
        storage.get(&key_b).unwrap().attribute("name"),
        Some(&json!("sauna"))
    );
}

#[test]
fn save_writes_every_registered_record() {
    let dir = TempDir::new().unwrap();
    let path = snapshot_path(&dir);
    let mut storage = FileStorage::open(&path).unwrap();

    let mut expected = Vec::new();
    for kind in SPECIALIZED_KINDS {
        let record = Record::new(kind);
        expected.push((record.key(), record.to_snapshot_map()));
        storage.register(record);
    }
    storage.save().unwrap();

    let document = read_snapshot_file(&path);
    assert_eq!(document.len(), 6);
    for (key, map) in expected {
        assert_eq!(document.get(&key), Some(&Value::Object(map)));
    }
}

#[test]
fn save_replaces_the_file_without_leaving_temp_debris() {
    let dir = TempDir::new().unwrap();
    let path = snapshot_path(&dir);
    let mut storage = FileStorage::open(&path).unwrap();

    storage.register(Record::new(RecordKind::Base));
    storage.save().unwrap();
    storage.register(Record::new(RecordKind::City));
    storage.save().unwrap();

    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(read_snapshot_file(&path).len(), 2);
}

#[test]
fn snapshot_round_trip_preserves_serialized_form() {
    let dir = TempDir::new().unwrap();
    let path = snapshot_path(&dir);

    let record = fixed_record(RecordKind::User, "123456");
    let original_map = record.to_snapshot_map();

    let mut storage = FileStorage::open(&path).unwrap();
    let key = storage.register(record);
    storage.save().unwrap();

    let restored_storage = FileStorage::open(&path).unwrap();
    let restored = restored_storage.get(&key).unwrap();

    assert_eq!(restored.to_snapshot_map(), original_map);
    assert_eq!(restored.identity(), "123456");
    assert_eq!(
        restored.to_snapshot_map().get("created_at"),
        Some(&json!(FIXED_TIMESTAMP))
    );
}

#[test]
fn reload_restores_one_entry_per_variant() {
    let dir = TempDir::new().unwrap();
    let path = snapshot_path(&dir);
    let mut storage = FileStorage::open(&path).unwrap();

    let mut keys = Vec::new();
    for kind in SPECIALIZED_KINDS {
        keys.push(storage.register(Record::new(kind)));
    }
    storage.save().unwrap();

    let restored = FileStorage::open(&path).unwrap();
    assert_eq!(restored.all().len(), 6);
    for (kind, key) in SPECIALIZED_KINDS.iter().zip(&keys) {
        let record = restored.get(key).unwrap();
        assert_eq!(record.kind(), *kind);
        assert_eq!(&record.key(), key);
    }
}

#[test]
fn reload_rejects_unknown_kind_tags() {
    let dir = TempDir::new().unwrap();
    let path = snapshot_path(&dir);

    let document = json!({
        "NotARealType.123456": {
            "identity": "123456",
            "created_at": FIXED_TIMESTAMP,
            "updated_at": FIXED_TIMESTAMP,
            KIND_KEY: "NotARealType",
        }
    });
    fs::write(&path, serde_json::to_vec(&document).unwrap()).unwrap();

    let err = FileStorage::open(&path).unwrap_err();
    assert!(matches!(
        err,
        StorageError::UnknownKind { ref key, ref kind }
            if key == "NotARealType.123456" && kind == "NotARealType"
    ));
}

#[test]
fn failed_reload_registers_nothing_from_that_load() {
    let dir = TempDir::new().unwrap();
    let path = snapshot_path(&dir);

    let mut storage = FileStorage::open(&path).unwrap();
    let existing_key = storage.register(fixed_record(RecordKind::City, "111111"));

    // One decodable entry and one unknown tag in the same document.
    let document = json!({
        "Amenity.222222": {
            "identity": "222222",
            "created_at": FIXED_TIMESTAMP,
            "updated_at": FIXED_TIMESTAMP,
            KIND_KEY: "Amenity",
        },
        "NotARealType.333333": {
            "identity": "333333",
            "created_at": FIXED_TIMESTAMP,
            "updated_at": FIXED_TIMESTAMP,
            KIND_KEY: "NotARealType",
        }
    });
    fs::write(&path, serde_json::to_vec(&document).unwrap()).unwrap();

    let err = storage.reload().unwrap_err();
    assert!(matches!(err, StorageError::UnknownKind { .. }));

    assert_eq!(storage.all().len(), 1);
    assert!(storage.get(&existing_key).is_some());
    assert!(storage.get("Amenity.222222").is_none());
    assert!(storage.get("NotARealType.333333").is_none());
}

#[test]
fn reload_rejects_missing_kind_tag() {
    let dir = TempDir::new().unwrap();
    let path = snapshot_path(&dir);

    let document = json!({
        "User.123456": {
            "identity": "123456",
            "created_at": FIXED_TIMESTAMP,
            "updated_at": FIXED_TIMESTAMP,
        }
    });
    fs::write(&path, serde_json::to_vec(&document).unwrap()).unwrap();

    let err = FileStorage::open(&path).unwrap_err();
    assert!(matches!(err, StorageError::InvalidData(_)));
}

#[test]
fn reload_rejects_non_object_snapshot_root() {
    let dir = TempDir::new().unwrap();
    let path = snapshot_path(&dir);
    fs::write(&path, b"[]").unwrap();

    let err = FileStorage::open(&path).unwrap_err();
    assert!(matches!(
        err,
        StorageError::Snapshot(SnapshotError::Malformed(_))
    ));
}

#[test]
fn reload_surfaces_undecodable_documents() {
    let dir = TempDir::new().unwrap();
    let path = snapshot_path(&dir);
    fs::write(&path, b"{ not json").unwrap();

    let err = FileStorage::open(&path).unwrap_err();
    assert!(matches!(err, StorageError::Snapshot(SnapshotError::Json(_))));
}

#[test]
fn reload_propagates_malformed_record_timestamps() {
    let dir = TempDir::new().unwrap();
    let path = snapshot_path(&dir);

    let document = json!({
        "User.123456": {
            "identity": "123456",
            "created_at": "01/05/2024",
            "updated_at": FIXED_TIMESTAMP,
            KIND_KEY: "User",
        }
    });
    fs::write(&path, serde_json::to_vec(&document).unwrap()).unwrap();

    let err = FileStorage::open(&path).unwrap_err();
    assert!(matches!(err, StorageError::Model(_)));
}

#[test]
fn reload_surfaces_unreadable_snapshot_as_io_error() {
    let dir = TempDir::new().unwrap();
    // A directory at the snapshot path is readable metadata but not a
    // readable file, which is distinct from the absent-file fresh start.
    let path = dir.path().join("homestay.json");
    fs::create_dir(&path).unwrap();

    let err = FileStorage::open(&path).unwrap_err();
    assert!(matches!(err, StorageError::Snapshot(SnapshotError::Io(_))));
}

#[test]
fn save_surfaces_unwritable_snapshot_directory_as_io_error() {
    let dir = TempDir::new().unwrap();
    // The parent directory never exists, so staging the temp file for
    // the atomic replace must fail on the write path.
    let path = dir.path().join("missing").join("homestay.json");

    let mut storage = FileStorage::open(&path).unwrap();
    storage.register(Record::new(RecordKind::Base));

    let err = storage.save().unwrap_err();
    assert!(matches!(err, StorageError::Snapshot(SnapshotError::Io(_))));
}
