#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn kiosk_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("kiosk"));
    cmd.env("KIOSK_HOME", home).env_remove("KIOSK_LOG");
    cmd
}

#[test]
fn test_init_then_status() {
    let temp = TempDir::new().unwrap();

    kiosk_cmd(temp.path())
        .args(["init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized native store"))
        .stdout(predicate::str::contains("9 created"));
    assert!(temp.path().join("data").join("yayinda.json").exists());
    assert!(temp.path().join("data").join("files").is_dir());

    kiosk_cmd(temp.path())
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 of 15 modules published"))
        .stdout(predicate::str::contains("org:akinci"));
}

#[test]
fn test_first_run_creates_missing_documents() {
    let temp = TempDir::new().unwrap();
    let ledger = temp.path().join("data").join("yayinda.json");

    kiosk_cmd(temp.path())
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 of 15 modules published"));
    let content = fs::read_to_string(&ledger).unwrap();
    assert!(content.contains("\"SSSModulu\": false") || content.contains("\"SSSModulu\":false"));

    fs::remove_file(&ledger).unwrap();
    kiosk_cmd(temp.path()).args(["export"]).assert().success();
    assert!(ledger.exists());
}

#[test]
fn test_publish_locks_module_until_reset() {
    let temp = TempDir::new().unwrap();

    kiosk_cmd(temp.path())
        .args(["module", "publish", "faq", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no content to publish"));

    kiosk_cmd(temp.path())
        .args([
            "module",
            "add",
            "faq",
            r#"{"id": "1", "Soru": "Mesai kaçta başlar?", "Cevap": "08:00"}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 1 to faq"));

    kiosk_cmd(temp.path())
        .args(["module", "publish", "faq"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled"));

    kiosk_cmd(temp.path())
        .args(["module", "publish", "faq"])
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("faq is now published"));

    kiosk_cmd(temp.path())
        .args(["module", "delete", "faq", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is published"));

    kiosk_cmd(temp.path())
        .args(["module", "reset", "faq", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("was reset"));

    kiosk_cmd(temp.path())
        .args(["module", "list", "faq"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No records found."));
}

#[test]
fn test_ledger_cannot_be_edited_directly() {
    let temp = TempDir::new().unwrap();
    kiosk_cmd(temp.path())
        .args(["doc", "set", "yayinda", r#"{"SSSModulu": true}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("publish ledger"));
}

#[test]
fn test_training_attachment_is_stored() {
    let temp = TempDir::new().unwrap();
    let pdf = temp.path().join("Oryantasyon.PDF");
    fs::write(&pdf, b"%PDF-1.4 test").unwrap();

    kiosk_cmd(temp.path())
        .args(["module", "add", "training", r#"{"id": "77", "title": "Oryantasyon"}"#])
        .arg("--attach")
        .arg(&pdf)
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored file training_77.pdf"));

    kiosk_cmd(temp.path())
        .args(["blob", "read", "training_77.pdf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("%PDF-1.4 test"));
}

#[test]
fn test_news_item_with_image() {
    let temp = TempDir::new().unwrap();
    let image = temp.path().join("kapak.png");
    fs::write(&image, b"\x89PNG image").unwrap();

    kiosk_cmd(temp.path())
        .args(["homepage", "add", "news", "Yeni servis hatti", "--attach"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored image news_"));

    kiosk_cmd(temp.path())
        .args(["doc", "get", "guncel_gelismeler"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"haberGorseli\": \"news_"))
        .stdout(predicate::str::contains("\"isPublished\": false"));

    let stored = fs::read_dir(temp.path().join("data").join("files"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .find(|n| n.starts_with("news_") && n.ends_with("_kapak.png"))
        .unwrap();
    assert_eq!(
        fs::read(temp.path().join("data").join("files").join(stored)).unwrap(),
        b"\x89PNG image"
    );
}

#[test]
fn test_export_then_import_round_trip() {
    let temp = TempDir::new().unwrap();
    let exports = temp.path().join("exports");

    kiosk_cmd(temp.path()).args(["init"]).assert().success();
    kiosk_cmd(temp.path())
        .args(["homepage", "add", "news", "Yeni kafeterya", "--date", "2024-06-01"])
        .assert()
        .success();
    kiosk_cmd(temp.path())
        .args(["export"])
        .assert()
        .success()
        .stdout(predicate::str::contains("personel_destek_yedek_"));

    let archive = fs::read_dir(&exports)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.to_string_lossy().ends_with(".tar.gz"))
        .unwrap();

    kiosk_cmd(temp.path())
        .args(["homepage", "add", "news", "Silinecek"])
        .assert()
        .success();

    kiosk_cmd(temp.path())
        .args(["import", "--yes"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("Published modules: none"));

    kiosk_cmd(temp.path())
        .args(["homepage", "list", "news"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Yeni kafeterya"))
        .stdout(predicate::str::contains("Silinecek").not());
}

#[test]
fn test_live_mode_blocks_export_until_admin_clear() {
    let temp = TempDir::new().unwrap();

    kiosk_cmd(temp.path())
        .args(["transfer", "hide", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("live mode"));

    kiosk_cmd(temp.path())
        .args(["export"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("disabled"));

    kiosk_cmd(temp.path())
        .args(["admin", "clear", "--secret", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Access denied"));

    kiosk_cmd(temp.path())
        .args(["admin", "clear", "--secret", "admin123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Import/export shown again"));

    kiosk_cmd(temp.path()).args(["export"]).assert().success();
}

#[test]
fn test_web_backend_persists_between_runs() {
    let temp = TempDir::new().unwrap();

    kiosk_cmd(temp.path())
        .args(["config", "backend", "web"])
        .assert()
        .success()
        .stdout(predicate::str::contains("backend set to web"));

    kiosk_cmd(temp.path())
        .args(["doc", "set", "ui_config", r#"{"showTransferButtons": true, "theme": "dark"}"#])
        .assert()
        .success();

    kiosk_cmd(temp.path())
        .args(["doc", "get", "ui_config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"theme\": \"dark\""));
    assert!(temp.path().join("web").join("profile.json").exists());
    assert!(!temp.path().join("data").join("ui_config.json").exists());
}
