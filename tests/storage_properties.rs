use base64::{engine::general_purpose::STANDARD, Engine as _};
use kiosk::blob::BlobEncoding;
use kiosk::catalog::DocumentName;
use kiosk::error::KioskError;
use kiosk::model::ModuleKey;
use kiosk::storage::Storage;
use kiosk::store::fs_backend::FsBackend;
use kiosk::store::local_storage::LocalStorage;
use kiosk::store::mem_backend::MemBackend;
use kiosk::store::web_backend::WebBackend;
use kiosk::store::{Snapshot, StorageBackend};
use kiosk::transfer::{self, ArchiveFormat, ImportOutcome};
use kiosk::workflow::{open_module, Decision, WorkflowOutcome};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn native(dir: &TempDir) -> Storage {
    Storage::with_backend(FsBackend::new(dir.path().join("data")))
}

fn web() -> Storage {
    Storage::with_backend(WebBackend::new(LocalStorage::in_memory(1024 * 1024)))
}

fn sample_content(storage: &Storage) {
    storage.initialize_defaults().unwrap();
    storage
        .write_document(
            "training_materials",
            &json!([{"id": "1", "title": "İş güvenliği", "uploadDate": "2024-02-01", "fileUrl": "training_1.pdf"}]),
        )
        .unwrap();
    storage
        .write_document("faq_data", &json!([{"id": "f1", "Soru": "Nerede?", "Cevap": "Burada", "uploadDate": "2024-02-01"}]))
        .unwrap();
    storage
        .save_blob_bytes("training_1.pdf", &[0x25, 0x50, 0x44, 0x46, 0x00, 0xff])
        .unwrap();
    storage
        .ledger()
        .set_module_published(ModuleKey::Training, true)
        .unwrap();
}

#[test]
fn documents_round_trip_for_every_catalog_name() {
    let dir = TempDir::new().unwrap();
    for storage in [native(&dir), web()] {
        for doc in DocumentName::ALL {
            let value = json!({"name": doc.as_str(), "n": [1, 2.5, "üç"], "ok": true});
            storage.write_document(doc.as_str(), &value).unwrap();
            assert_eq!(storage.read_document(doc.as_str(), Value::Null), value);
        }
    }
}

#[test]
fn missing_and_corrupt_documents_read_as_default() {
    let dir = TempDir::new().unwrap();
    let storage = native(&dir);
    assert_eq!(
        storage.read_document("process_flows", json!([])),
        json!([])
    );

    storage.write_document("faq_data", &json!([{"id": "1"}])).unwrap();
    fs::write(dir.path().join("data").join("faq_data.json"), b"{ not json").unwrap();
    assert_eq!(storage.read_document("faq_data", json!([])), json!([]));
}

#[test]
fn failed_overwrite_keeps_previous_value() {
    let dir = TempDir::new().unwrap();
    let backend = FsBackend::new(dir.path().to_path_buf());
    backend.write_document("ui_config", &json!({"v": 1})).unwrap();
    backend.write_document("ui_config", &json!({"v": 2})).unwrap();

    backend.set_simulate_torn_write(true);
    assert!(backend.write_document("ui_config", &json!({"v": 3})).is_err());
    assert_eq!(
        backend.read_document("ui_config").unwrap(),
        Some(json!({"v": 2}))
    );
}

#[test]
fn published_module_only_leaves_through_reset() {
    let storage = Storage::with_backend(MemBackend::new());
    let mut faq = open_module(&storage, ModuleKey::Faq);
    faq.add_value(json!({"id": "1", "Soru": "?", "Cevap": "!", "uploadDate": "2024-01-01"}))
        .unwrap();
    let pending = faq.request_publish().unwrap();
    assert_eq!(
        faq.resolve(pending, Decision::Confirm).unwrap(),
        WorkflowOutcome::Published
    );

    assert!(matches!(faq.delete("1"), Err(KioskError::ModulePublished(_))));
    assert!(matches!(faq.request_publish(), Err(KioskError::ModulePublished(_))));
    assert!(storage.ledger().is_published(ModuleKey::Faq));

    let pending = faq.request_reset();
    assert_eq!(
        faq.resolve(pending, Decision::Confirm).unwrap(),
        WorkflowOutcome::Reset
    );
    assert!(!storage.ledger().is_published(ModuleKey::Faq));
    assert_eq!(faq.len(), 0);
}

#[test]
fn acknowledged_but_lost_ledger_write_is_a_failure() {
    let backend = MemBackend::new();
    backend.set_drop_writes(true);
    let storage = Storage::with_backend(backend);

    let err = storage
        .ledger()
        .set_module_published(ModuleKey::Procedures, true)
        .unwrap_err();
    assert!(matches!(err, KioskError::VerificationFailed { expected: true, .. }));
    assert!(!storage.ledger().is_published(ModuleKey::Procedures));
}

#[test]
fn data_uri_prefix_is_never_doubled() {
    let raw = STANDARD.encode(b"\x89PNG\r\n\x1a\nbody");
    let prefixed = format!("data:image/png;base64,{}", raw);
    let dir = TempDir::new().unwrap();

    for storage in [native(&dir), web()] {
        storage.save_blob("a.png", &prefixed, BlobEncoding::Base64).unwrap();
        storage.save_blob("b.png", &raw, BlobEncoding::Base64).unwrap();

        assert_eq!(storage.read_blob_bytes("a.png"), storage.read_blob_bytes("b.png"));
        assert_eq!(storage.read_blob("a.png", BlobEncoding::Base64), Some(raw.clone()));
        let uri = storage.read_blob_data_uri("a.png").unwrap();
        assert_eq!(uri.matches("data:").count(), 1);
        assert_eq!(uri, prefixed);
    }
}

#[test]
fn oversized_blob_is_too_large_and_not_stored() {
    let storage = Storage::with_backend(
        WebBackend::new(LocalStorage::in_memory(1024 * 1024)).with_max_file_bytes(64),
    );
    let err = storage.save_blob_bytes("big.pdf", &[7u8; 100]).unwrap_err();
    assert!(matches!(err, KioskError::FileTooLarge { limit: 64, .. }));
    assert!(err.is_capacity());
    assert!(!storage.blob_exists("big.pdf"));
}

#[test]
fn full_quota_is_quota_exceeded_not_storage_failed() {
    let storage = Storage::with_backend(WebBackend::new(LocalStorage::in_memory(512)));
    storage
        .write_document("faq_data", &json!([{"id": "x".repeat(300)}]))
        .unwrap();
    let err = storage.save_blob_bytes("doc.pdf", &[1u8; 200]).unwrap_err();
    assert!(matches!(err, KioskError::QuotaExceeded { .. }));
    assert!(!storage.blob_exists("doc.pdf"));
}

fn round_trip(source: &Storage, target: &Storage, export_dir: &TempDir) {
    let before = source.backend().snapshot().unwrap();
    let published_before = source.ledger().snapshot();

    let report = transfer::export_all(source, export_dir.path()).unwrap();
    assert!(report.path.exists());

    match transfer::import_all(target, Some(&report.path)).unwrap() {
        ImportOutcome::Imported(summary) => {
            assert_eq!(summary.published, vec![ModuleKey::Training]);
            assert!(!summary.ledger_synthesized);
        }
        ImportOutcome::Cancelled => panic!("import was cancelled"),
    }

    let after = target.backend().snapshot().unwrap();
    assert_eq!(after.documents, before.documents);
    assert_eq!(after.blobs, before.blobs);
    assert_eq!(target.ledger().snapshot(), published_before);
}

#[test]
fn native_export_import_round_trip() {
    let dir = TempDir::new().unwrap();
    let exports = TempDir::new().unwrap();
    let storage = native(&dir);
    sample_content(&storage);

    // Import into a separate, empty store.
    let target = TempDir::new().unwrap();
    let fresh = Storage::with_backend(FsBackend::new(target.path().join("data")));
    round_trip(&storage, &fresh, &exports);
    let name = fs::read_dir(exports.path())
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .file_name();
    assert!(name.to_string_lossy().ends_with(".tar.gz"));
}

#[test]
fn web_export_imports_into_native() {
    let exports = TempDir::new().unwrap();
    let source = web();
    sample_content(&source);
    let dir = TempDir::new().unwrap();
    let target = native(&dir);
    target
        .write_document("faq_data", &json!([{"id": "stale"}]))
        .unwrap();
    round_trip(&source, &target, &exports);
}

#[test]
fn web_document_names_cannot_shadow_blobs() {
    let exports = TempDir::new().unwrap();
    let source = web();
    sample_content(&source);
    assert!(matches!(
        source.write_document("file_notes", &json!({"a": 1})),
        Err(KioskError::InvalidName(_))
    ));
    source.write_document("notes", &json!({"a": 1})).unwrap();
    source.save_blob_bytes("notes", b"{a}").unwrap();

    let target = web();
    round_trip(&source, &target, &exports);
    assert_eq!(target.read_document("notes", Value::Null), json!({"a": 1}));
    assert_eq!(target.read_blob_bytes("notes"), Some(b"{a}".to_vec()));
}

#[test]
fn failed_import_restores_previous_state() {
    let dir = TempDir::new().unwrap();
    let storage = native(&dir);
    sample_content(&storage);
    let before = storage.backend().snapshot().unwrap();

    let mut incoming = Snapshot::default();
    incoming
        .documents
        .insert("faq_data".to_string(), json!([{"id": "new"}]));
    incoming.blobs.insert("fine.png".to_string(), vec![1, 2, 3]);
    incoming.blobs.insert("../escape.png".to_string(), vec![4]);

    assert!(transfer::import_snapshot(&storage, ArchiveFormat::TarGz, incoming).is_err());
    assert_eq!(storage.backend().snapshot().unwrap(), before);
}

#[test]
fn failed_web_import_restores_previous_state() {
    let storage = Storage::with_backend(WebBackend::new(LocalStorage::in_memory(4096)));
    storage
        .write_document("faq_data", &json!([{"id": "keep"}]))
        .unwrap();
    let before = storage.backend().snapshot().unwrap();

    let mut incoming = Snapshot::default();
    incoming
        .documents
        .insert("faq_data".to_string(), json!([{"id": "new"}]));
    incoming.blobs.insert("huge.bin".to_string(), vec![0u8; 8192]);

    assert!(transfer::import_snapshot(&storage, ArchiveFormat::JsonEnvelope, incoming).is_err());
    assert_eq!(storage.backend().snapshot().unwrap(), before);
}

#[test]
fn malformed_archive_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let storage = native(&dir);
    sample_content(&storage);
    let before = storage.backend().snapshot().unwrap();

    let bogus = dir.path().join("bogus.json");
    fs::write(&bogus, b"{\"faq_data\": [1], \"files\": {\"x.png\": \"%%%\"}}").unwrap();
    assert!(transfer::import_all(&storage, Some(&bogus)).is_err());

    let truncated = dir.path().join("truncated.tar.gz");
    fs::write(&truncated, [0x1f, 0x8b, 0x08, 0x00, 0x01]).unwrap();
    assert!(transfer::import_all(&storage, Some(&truncated)).is_err());

    assert_eq!(storage.backend().snapshot().unwrap(), before);
}

#[test]
fn empty_module_cannot_be_published() {
    let storage = Storage::with_backend(MemBackend::new());
    let flows = open_module(&storage, ModuleKey::ProcessFlows);
    assert!(matches!(
        flows.request_publish(),
        Err(KioskError::EmptyCollection(_))
    ));
    assert!(!storage.ledger().is_published(ModuleKey::ProcessFlows));
    assert!(storage
        .backend()
        .read_document("process_flows")
        .unwrap()
        .is_none());
}
