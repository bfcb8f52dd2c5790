//! Integration tests for persisted settings and source summaries.

use assert_fs::prelude::*;
use assert_fs::TempDir;
use chrono::NaiveDate;
use media_organizer::config::Settings;
use media_organizer::core::metadata::StaticMetadataProvider;
use media_organizer::core::organize::{OrganizationEngine, OrganizationMode, OrganizeRequest};
use media_organizer::core::reporter::SourceSummary;
use media_organizer::core::scanner::{DirectoryScanner, ScanScope};
use predicates::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

#[test]
fn settings_file_is_created_with_readable_json() {
    let temp = TempDir::new().unwrap();
    let path = temp.child("media-organizer/settings.json");

    let mut settings = Settings::default();
    settings.processing.mode = OrganizationMode::ByDateAndDevice;
    settings.record_run(&[PathBuf::from("/Volumes/SD_CARD")], &[PathBuf::from("/Archive")]);
    settings.save(path.path()).unwrap();

    path.assert(predicate::path::is_file());
    path.assert(predicate::str::contains("\"by_date_and_device\""));
    path.assert(predicate::str::contains("/Volumes/SD_CARD"));

    let loaded = Settings::load(path.path()).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn extra_extensions_are_organized() {
    let settings = Settings {
        extra_photo_extensions: vec!["jxl".to_string()],
        ..Default::default()
    };

    let src = TempDir::new().unwrap();
    src.child("modern.jxl").write_binary(b"jpeg xl").unwrap();
    src.child("plain.txt").write_str("ignored").unwrap();
    let dest = TempDir::new().unwrap();

    let ts = NaiveDate::from_ymd_opt(2023, 11, 2)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    let engine = OrganizationEngine::builder()
        .provider(Arc::new(StaticMetadataProvider::new(ts, "Fujifilm")))
        .registry(Arc::new(settings.extension_registry()))
        .build();

    let report = engine
        .run(&OrganizeRequest::new(
            vec![src.path().to_path_buf()],
            vec![dest.path().to_path_buf()],
        ))
        .unwrap();

    assert_eq!(report.statistics.photos, 1);
    dest.child("Picture/2023/2023-11-02/modern.jxl").assert("jpeg xl");
    dest.child("Other").assert(predicate::path::missing());
}

#[test]
fn summary_ignores_system_files() {
    let src = TempDir::new().unwrap();
    src.child("DCIM/100CANON/IMG_0001.JPG").write_binary(&[0u8; 2048]).unwrap();
    src.child("DCIM/100CANON/MVI_0002.MP4").write_binary(&[0u8; 4096]).unwrap();
    src.child("DCIM/.Trashes/old.jpg").write_binary(&[0u8; 999]).unwrap();
    src.child("Thumbs.db").write_binary(&[0u8; 10]).unwrap();
    src.child("README.txt").write_str("card").unwrap();

    let scanner = DirectoryScanner::new(
        Arc::new(Settings::default().extension_registry()),
        ScanScope::AllFiles,
    );
    let summary = SourceSummary::collect(&scanner, src.path());

    assert_eq!(summary.photos.files, 1);
    assert_eq!(summary.photos.bytes, 2048);
    assert_eq!(summary.videos.bytes, 4096);
    assert_eq!(summary.other.files, 1);
    assert_eq!(summary.total().files, 3);
}
